//! IB Port client: cross-chain transfer transactions on Solana
//!
//! This crate drives SuSy bridge burn/unwrap requests end to end:
//!
//! - **Registry** - immutable chain/token/route tables, validated at load
//! - **Account Ledger** - durable (mint, owner) → token-account mapping so
//!   provisioning is idempotent across sessions
//! - **Account Provisioner** - creates SPL token accounts on first use
//! - **Instruction Encoder** - the port program's exact wire layout and
//!   account calling convention
//! - **Broadcaster** - blockhash fetch, signing, preflight-skipped submit,
//!   bounded confirmation polling
//! - **PortClient** - the façade composing all of the above into
//!   `transfer(token, origin, dest, amount, receiver)`
//!
//! ## Usage
//!
//! ```ignore
//! use ibport_client::{
//!     AccountLedger, FileStore, LocalWallet, PortClient, PortClientConfig, Registry,
//! };
//!
//! let config: PortClientConfig = serde_json::from_str(raw)?;
//! let ledger = AccountLedger::new(FileStore::open("ledger.json")?);
//! let client = PortClient::connect(&config, Registry::mainnet(), ledger, wallet)?;
//!
//! let signature = client
//!     .transfer("SIGN", CHAIN_WAVES, CHAIN_BSC, "5.00", receiver)
//!     .await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `testing` - scriptable mock chain endpoint for downstream tests

pub mod client;
pub mod config;
pub mod error;
pub mod redact;
pub mod registry;
pub mod solana;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used items at the crate root
pub use client::PortClient;
pub use config::PortClientConfig;
pub use error::{
    AmountError, BroadcastError, ConfigError, EncodingError, ProvisioningError, RegistryError,
    RpcError, StoreError, TransferError, WalletError,
};
pub use registry::{Registry, CHAIN_BSC, CHAIN_ETHEREUM, CHAIN_WAVES};
pub use solana::{
    AccountLedger, AccountProvisioner, BroadcastConfig, Broadcaster, ChainRpc, FileStore, KvStore,
    LedgerKey, LocalWallet, MemoryStore, SolanaRpc, WalletSigner,
};
pub use types::{
    to_base_units, AddressFormat, BridgeRoute, ChainDescriptor, ChainId, TokenDescriptor,
};
