//! Wallet capability interface.
//!
//! The client never touches a user's private key directly: it hands the
//! assembled transaction envelope to a [`WalletSigner`] and gets it back
//! signed. Any conforming implementation — software keystore, hardware
//! wallet, remote signer — satisfies the orchestrator.

use std::fmt;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

use crate::error::WalletError;
use crate::redact::Redacted;

/// A signer that can co-sign a transaction envelope as its fee payer.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Public identifier of the wallet; used as fee payer and initializer.
    fn pubkey(&self) -> Pubkey;

    /// Sign `transaction` in place. The envelope's blockhash and fee payer
    /// are already set when this is called.
    async fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError>;
}

/// In-process wallet backed by a keypair.
pub struct LocalWallet {
    keypair: Keypair,
}

impl LocalWallet {
    pub fn new(keypair: Keypair) -> Self {
        LocalWallet { keypair }
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("pubkey", &self.keypair.pubkey())
            .field("keypair", &Redacted::new(()))
            .finish()
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), WalletError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}
