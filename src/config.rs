//! Client configuration.
//!
//! Plain deserializable data with defaults. No signing material lives
//! here — wallet secrets stay inside the [`crate::solana::wallet::WalletSigner`]
//! implementation.

use std::time::Duration;

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use tracing::warn;

use crate::solana::broadcaster::BroadcastConfig;

/// Configuration of a [`crate::client::PortClient`].
#[derive(Debug, Clone, Deserialize)]
pub struct PortClientConfig {
    /// Solana JSON-RPC endpoint.
    pub rpc_url: String,
    /// Commitment level: "processed", "confirmed", or "finalized".
    #[serde(default = "default_commitment")]
    pub commitment: String,
    /// IB Port program id (base58).
    pub port_program: String,
    /// Confirmation polling bound.
    #[serde(default = "default_confirm_attempts")]
    pub confirm_attempts: u32,
    /// Fixed delay between confirmation polls, in milliseconds.
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_confirm_attempts() -> u32 {
    30
}

fn default_confirm_delay_ms() -> u64 {
    1_000
}

impl PortClientConfig {
    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            confirm_attempts: self.confirm_attempts,
            confirm_delay: Duration::from_millis(self.confirm_delay_ms),
        }
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment.as_str() {
            "processed" => CommitmentConfig::processed(),
            "confirmed" => CommitmentConfig::confirmed(),
            "finalized" => CommitmentConfig::finalized(),
            other => {
                warn!(commitment = %other, "Unknown commitment level, using 'confirmed'");
                CommitmentConfig::confirmed()
            }
        }
    }
}
