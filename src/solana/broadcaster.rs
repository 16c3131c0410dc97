//! Transaction assembly, signing, submission, and confirmation.
//!
//! One broadcast is strictly sequential: fetch a fresh blockhash, assemble
//! the envelope with the wallet as fee payer, collect signatures, submit
//! without preflight, then poll for confirmation a bounded number of times
//! with a fixed delay. Rejections are never resubmitted here — a fresh
//! blockhash is needed, so the caller re-invokes the whole operation.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use solana_transaction_status::TransactionConfirmationStatus;
use tracing::{debug, info, warn};

use crate::error::{BroadcastError, RpcError};
use crate::solana::rpc::ChainRpc;
use crate::solana::wallet::WalletSigner;

/// Confirmation polling bounds.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Maximum status polls before declaring a timeout.
    pub confirm_attempts: u32,
    /// Fixed delay between polls.
    pub confirm_delay: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            confirm_attempts: 30,
            confirm_delay: Duration::from_secs(1),
        }
    }
}

/// Signs and submits instructions through a [`ChainRpc`] endpoint.
pub struct Broadcaster<R: ChainRpc> {
    rpc: Arc<R>,
    config: BroadcastConfig,
}

impl<R: ChainRpc> Clone for Broadcaster<R> {
    fn clone(&self) -> Self {
        Broadcaster {
            rpc: Arc::clone(&self.rpc),
            config: self.config.clone(),
        }
    }
}

fn submit_error(error: RpcError) -> BroadcastError {
    match error {
        RpcError::Connection(e) => BroadcastError::NetworkError(e),
        RpcError::Rejected(e) => BroadcastError::Rejected(e),
    }
}

impl<R: ChainRpc> Broadcaster<R> {
    pub fn new(rpc: Arc<R>, config: BroadcastConfig) -> Self {
        Broadcaster { rpc, config }
    }

    pub fn rpc(&self) -> &Arc<R> {
        &self.rpc
    }

    /// Sign `instructions` into one transaction and drive it to
    /// confirmation.
    ///
    /// The wallet is the fee payer. `extra_signers` are auxiliary keypairs
    /// the transaction requires (e.g. a freshly created account co-signing
    /// its own creation); they partial-sign before the wallet does.
    pub async fn broadcast<W: WalletSigner>(
        &self,
        instructions: &[solana_sdk::instruction::Instruction],
        wallet: &W,
        extra_signers: &[&Keypair],
    ) -> Result<Signature, BroadcastError> {
        let blockhash = self
            .rpc
            .latest_blockhash()
            .await
            .map_err(submit_error)?;

        let payer = wallet.pubkey();
        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));

        if extra_signers.is_empty() {
            transaction.message.recent_blockhash = blockhash;
        } else {
            transaction
                .try_partial_sign(extra_signers, blockhash)
                .map_err(|e| BroadcastError::Rejected(format!("co-signing failed: {e}")))?;
        }

        wallet
            .sign_transaction(&mut transaction)
            .await
            .map_err(|e| BroadcastError::Rejected(e.to_string()))?;

        let signature = self
            .rpc
            .send_transaction(&transaction)
            .await
            .map_err(submit_error)?;

        info!(signature = %signature, "Transaction submitted, polling for confirmation");
        self.confirm(&signature).await?;
        Ok(signature)
    }

    /// Poll the signature status up to the configured attempt bound.
    async fn confirm(&self, signature: &Signature) -> Result<(), BroadcastError> {
        for attempt in 0..self.config.confirm_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.confirm_delay).await;
            }

            match self.rpc.signature_status(signature).await {
                Ok(Some(status)) => {
                    if let Some(err) = status.err {
                        return Err(BroadcastError::Rejected(err.to_string()));
                    }
                    if matches!(
                        status.confirmation_status,
                        Some(
                            TransactionConfirmationStatus::Confirmed
                                | TransactionConfirmationStatus::Finalized
                        )
                    ) {
                        info!(signature = %signature, slot = status.slot, "Transaction confirmed");
                        return Ok(());
                    }
                    debug!(
                        signature = %signature,
                        attempt,
                        status = ?status.confirmation_status,
                        "Transaction not yet confirmed"
                    );
                }
                Ok(None) => {
                    debug!(signature = %signature, attempt, "Transaction not yet seen by the chain");
                }
                Err(e) => {
                    // transient status-poll failures consume an attempt but
                    // do not abort: the window stays bounded either way
                    warn!(signature = %signature, attempt, error = %e, "Status poll failed");
                }
            }
        }

        Err(BroadcastError::Timeout {
            attempts: self.config.confirm_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solana::wallet::LocalWallet;
    use crate::testing::MockChainRpc;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::system_instruction;

    fn transfer_ix(payer: &Pubkey) -> solana_sdk::instruction::Instruction {
        system_instruction::transfer(payer, &Pubkey::new_unique(), 1)
    }

    #[tokio::test]
    async fn test_broadcast_confirms() {
        let rpc = Arc::new(MockChainRpc::new());
        let broadcaster = Broadcaster::new(Arc::clone(&rpc), BroadcastConfig::default());
        let wallet = LocalWallet::new(Keypair::new());

        let signature = broadcaster
            .broadcast(&[transfer_ix(&wallet.pubkey())], &wallet, &[])
            .await
            .unwrap();

        let sent = rpc.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].signatures[0], signature);
        assert!(sent[0].is_signed());
    }

    #[tokio::test]
    async fn test_rejected_submission_is_not_retried() {
        let rpc = Arc::new(MockChainRpc::new());
        rpc.fail_next_send(RpcError::Rejected("Blockhash not found".to_string()));

        let broadcaster = Broadcaster::new(Arc::clone(&rpc), BroadcastConfig::default());
        let wallet = LocalWallet::new(Keypair::new());

        let err = broadcaster
            .broadcast(&[transfer_ix(&wallet.pubkey())], &wallet, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, BroadcastError::Rejected(_)));
        assert_eq!(rpc.send_calls(), 1);
    }

    #[tokio::test]
    async fn test_blockhash_fetch_failure_aborts_before_submission() {
        let rpc = Arc::new(MockChainRpc::new());
        rpc.fail_next_blockhash(RpcError::Connection("node unreachable".to_string()));

        let broadcaster = Broadcaster::new(Arc::clone(&rpc), BroadcastConfig::default());
        let wallet = LocalWallet::new(Keypair::new());

        let err = broadcaster
            .broadcast(&[transfer_ix(&wallet.pubkey())], &wallet, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::NetworkError(_)));
        assert_eq!(rpc.send_calls(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_network_error() {
        let rpc = Arc::new(MockChainRpc::new());
        rpc.fail_next_send(RpcError::Connection("connection refused".to_string()));

        let broadcaster = Broadcaster::new(Arc::clone(&rpc), BroadcastConfig::default());
        let wallet = LocalWallet::new(Keypair::new());

        let err = broadcaster
            .broadcast(&[transfer_ix(&wallet.pubkey())], &wallet, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_bounded() {
        let rpc = Arc::new(MockChainRpc::new());
        rpc.set_never_confirm();

        let config = BroadcastConfig {
            confirm_attempts: 3,
            confirm_delay: Duration::from_millis(1),
        };
        let broadcaster = Broadcaster::new(Arc::clone(&rpc), config);
        let wallet = LocalWallet::new(Keypair::new());

        let err = broadcaster
            .broadcast(&[transfer_ix(&wallet.pubkey())], &wallet, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::Timeout { attempts: 3 }));
        assert_eq!(rpc.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_transaction_surfaces_as_rejected() {
        let rpc = Arc::new(MockChainRpc::new());
        rpc.set_confirm_with_error();

        let broadcaster = Broadcaster::new(Arc::clone(&rpc), BroadcastConfig::default());
        let wallet = LocalWallet::new(Keypair::new());

        let err = broadcaster
            .broadcast(&[transfer_ix(&wallet.pubkey())], &wallet, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::Rejected(_)));
    }
}
