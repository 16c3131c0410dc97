//! Chain endpoint abstraction and the Solana JSON-RPC implementation.
//!
//! [`ChainRpc`] is the seam between the client and the network: the
//! broadcaster and provisioner only speak this trait, so tests can script
//! endpoint behavior without a validator.

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::TransactionStatus;
use tracing::{debug, info};

use crate::error::RpcError;

/// Minimal chain endpoint surface the client needs: liveness token,
/// rent query, submission, and status lookup.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Fetch a recent blockhash. Transactions without a sufficiently fresh
    /// one are rejected by the chain.
    async fn latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// Minimum lamport balance for rent exemption of an account of
    /// `data_len` bytes.
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, RpcError>;

    /// Submit a signed transaction. Preflight simulation is skipped by
    /// design: the simulator produces false negatives, at the cost of some
    /// errors surfacing only after submission.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError>;

    /// Processing status of a previously submitted signature, `None` while
    /// the chain has not seen it.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionStatus>, RpcError>;
}

/// [`ChainRpc`] over the Solana nonblocking RPC client.
pub struct SolanaRpc {
    client: RpcClient,
}

impl SolanaRpc {
    pub fn new(url: &str, commitment: CommitmentConfig) -> Self {
        info!(url = %url, commitment = ?commitment.commitment, "Created Solana RPC client");
        SolanaRpc {
            client: RpcClient::new_with_commitment(url.to_string(), commitment),
        }
    }
}

/// Classify a client error: transport-level failures are connection
/// errors, everything the endpoint answered and refused is a rejection.
fn classify(error: ClientError) -> RpcError {
    match error.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) | ClientErrorKind::Middleware(_) => {
            RpcError::Connection(error.to_string())
        }
        ClientErrorKind::TransactionError(e) => RpcError::Rejected(e.to_string()),
        _ => RpcError::Rejected(error.to_string()),
    }
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        let hash = self.client.get_latest_blockhash().await.map_err(classify)?;
        debug!(blockhash = %hash, "Fetched latest blockhash");
        Ok(hash)
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, RpcError> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(classify)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        };

        let signature = self
            .client
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(classify)?;

        debug!(signature = %signature, "Submitted transaction");
        Ok(signature)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionStatus>, RpcError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(classify)?;

        Ok(response.value.into_iter().next().flatten())
    }
}
