//! Typed failure taxonomy for the port client.
//!
//! Every component fails fast with its own error type; the orchestrator
//! wraps them into [`TransferError`] tagged with the stage that failed so
//! callers can present a stage-specific message. Nothing here is retried
//! internally — a rejected submission needs a fresh blockhash, so retries
//! belong to the caller, from the top.

use thiserror::Error;

use crate::types::ChainId;

/// Failures converting a human-entered decimal amount to base units.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount '{0}' is not a decimal number")]
    NotNumeric(String),

    #[error("amount '{amount}' has more fractional digits than the token's {decimals} decimals")]
    TooPrecise { amount: String, decimals: u8 },

    #[error("amount '{0}' exceeds the representable base-unit range")]
    Overflow(String),
}

/// Failures looking data up in (or loading) the chain/token registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown chain id {0}")]
    UnknownChain(ChainId),

    #[error("unknown token '{0}'")]
    UnknownToken(String),

    #[error("token '{ticker}' declares more than one route for {origin} -> {destination}")]
    DuplicateRoute {
        ticker: String,
        origin: ChainId,
        destination: ChainId,
    },

    #[error("token '{ticker}' has no bridge route for {origin} -> {destination}")]
    RouteNotFound {
        ticker: String,
        origin: ChainId,
        destination: ChainId,
    },

    #[error("token '{0}' has no wrapped mint configured on the port chain")]
    MissingMint(String),
}

/// Failures building the wire-format instruction or its account list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("receiver address must be {expected} bytes, got {actual}")]
    ReceiverWidth { expected: usize, actual: usize },

    #[error("invalid account identifier '{value}': {reason}")]
    InvalidAccount { value: String, reason: String },

    #[error("port program address derivation failed: {0}")]
    InvalidProgramAddress(String),
}

/// Failures of the durable key-value store backing the account ledger.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt ledger entry for '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Failures reported by the wallet/signing provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet refused to sign: {0}")]
    Signing(String),
}

/// Low-level chain endpoint failures, classified by whether the endpoint
/// was reached at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The endpoint could not be reached or the connection dropped.
    #[error("rpc connection error: {0}")]
    Connection(String),

    /// The endpoint answered and refused the request.
    #[error("rpc rejected request: {0}")]
    Rejected(String),
}

/// Failures submitting or confirming a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// The chain refused the transaction (bad signature, insufficient
    /// funds, stale blockhash). Never retried automatically: a fresh
    /// blockhash is needed, so the caller must re-invoke from the top.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Confirmation was not observed within the bounded polling window.
    /// The transaction may still land; the chain-side effect is not
    /// revocable.
    #[error("confirmation not observed after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("network error during broadcast: {0}")]
    NetworkError(String),
}

/// Failures creating or retrieving an on-chain token account.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("rent exemption query failed: {0}")]
    Rent(#[source] RpcError),

    #[error("could not build the create-account instructions: {0}")]
    Instruction(String),

    #[error("account creation transaction failed: {0}")]
    Creation(#[from] BroadcastError),

    #[error("ledger read failed: {0}")]
    Ledger(#[from] StoreError),

    /// The account exists on-chain but the ledger write failed. This is a
    /// hard error requiring manual reconciliation — retrying would create a
    /// second account the ledger knows nothing about.
    #[error("account {account} was created on-chain but the ledger write failed: {source}")]
    LedgerWrite {
        account: String,
        #[source]
        source: StoreError,
    },
}

/// Failures loading the client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config field '{field}' is not a valid public key: {value}")]
    InvalidPubkey { field: &'static str, value: String },
}

/// End-to-end transfer failure, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("route resolution failed: {0}")]
    Route(#[from] RegistryError),

    /// The token's registry entry is unusable on the port chain (e.g. no
    /// wrapped mint configured), independent of the requested route pair.
    #[error("token configuration error: {0}")]
    Token(RegistryError),

    #[error("account provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("instruction encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("broadcast failed: {0}")]
    Broadcast(#[from] BroadcastError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_carries_stage() {
        let err = TransferError::from(AmountError::NotNumeric("abc".to_string()));
        assert!(matches!(err, TransferError::Amount(_)));
        assert!(err.to_string().starts_with("invalid amount"));

        let err = TransferError::from(BroadcastError::Timeout { attempts: 30 });
        assert!(matches!(err, TransferError::Broadcast(_)));
        assert!(err.to_string().contains("30 attempts"));
    }

    #[test]
    fn test_rpc_error_display() {
        let err = RpcError::Rejected("Blockhash not found".to_string());
        assert_eq!(err.to_string(), "rpc rejected request: Blockhash not found");
    }
}
