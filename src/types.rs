//! Common types for the port client.
//!
//! Chain, token, and route descriptors are immutable configuration data:
//! they are loaded once at startup into the [`crate::registry::Registry`]
//! and referenced by id afterwards, never mutated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AmountError, EncodingError};

/// Opaque identifier of a chain known to the registry.
///
/// Chains reference each other by id only, so descriptors can be plain
/// values with no shared mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u32);

impl ChainId {
    pub fn to_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChainId {
    fn from(id: u32) -> Self {
        ChainId(id)
    }
}

/// How native addresses of a chain are textually encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// Hex with optional `0x` prefix (EVM chains).
    Hex,
    /// Base58 (Waves, Solana).
    Base58,
}

/// A chain known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub id: ChainId,
    /// Human-readable label, e.g. "BSC".
    pub label: String,
    /// Icon reference for the UI collaborator; opaque to this crate.
    pub icon: String,
    /// Native address width in bytes. The instruction encoder rejects
    /// receivers of any other width.
    pub address_width: usize,
    /// Textual address encoding used by [`ChainDescriptor::decode_address`].
    pub address_format: AddressFormat,
}

impl ChainDescriptor {
    /// Decode a textual address into raw bytes, enforcing the chain's
    /// native width. Wrong-width input is an error, never truncated or
    /// padded.
    pub fn decode_address(&self, address: &str) -> Result<Vec<u8>, EncodingError> {
        let bytes = match self.address_format {
            AddressFormat::Hex => {
                let trimmed = address.strip_prefix("0x").unwrap_or(address);
                hex::decode(trimmed).map_err(|e| EncodingError::InvalidAccount {
                    value: address.to_string(),
                    reason: e.to_string(),
                })?
            }
            AddressFormat::Base58 => {
                bs58::decode(address)
                    .into_vec()
                    .map_err(|e| EncodingError::InvalidAccount {
                        value: address.to_string(),
                        reason: e.to_string(),
                    })?
            }
        };

        if bytes.len() != self.address_width {
            return Err(EncodingError::ReceiverWidth {
                expected: self.address_width,
                actual: bytes.len(),
            });
        }

        Ok(bytes)
    }
}

/// One directed bridge route of a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRoute {
    pub origin: ChainId,
    pub destination: ChainId,
    /// Chain-native contract/account identifier of the port on the origin
    /// chain.
    pub origin_port: String,
    /// Port identifier on the destination chain.
    pub destination_port: String,
}

/// A token known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub ticker: String,
    pub label: String,
    /// Icon reference for the UI collaborator.
    pub icon: String,
    /// Base-10 exponent between human amounts and base units. Fixed at
    /// definition time; every conversion must use it.
    pub decimals: u8,
    /// Canonical asset identifier on the token's native chain.
    pub asset_id: String,
    /// Mirrored ERC20 contract on the EVM side, when one exists.
    #[serde(default)]
    pub erc20: Option<String>,
    /// Wrapped SPL mint on the port chain. Required for transfers; unset
    /// for tokens whose port deployment is configured elsewhere.
    #[serde(default)]
    pub mint: Option<String>,
    /// Zero or more bridge routes. A token with no route is not
    /// transferable and is hidden by the registry.
    #[serde(default)]
    pub routes: Vec<BridgeRoute>,
}

impl TokenDescriptor {
    pub fn is_bridgeable(&self) -> bool {
        !self.routes.is_empty()
    }
}

/// Convert a human-entered decimal amount to base units by integer scaling.
///
/// Rejects non-numeric input, more fractional digits than `decimals`
/// supports (no silent rounding), and values that do not fit in the wire
/// format's u64.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<u64, AmountError> {
    let amount = amount.trim();

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountError::NotNumeric(amount.to_string()));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::NotNumeric(amount.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(AmountError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }

    let overflow = || AmountError::Overflow(amount.to_string());

    let mut value: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| overflow())?
    };

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or_else(overflow)?;
    value = value.checked_mul(scale).ok_or_else(overflow)?;

    if !frac_part.is_empty() {
        let frac: u128 = frac_part.parse().map_err(|_| overflow())?;
        let frac_scale = 10u128.pow((decimals as usize - frac_part.len()) as u32);
        value = value
            .checked_add(frac * frac_scale)
            .ok_or_else(overflow)?;
    }

    u64::try_from(value).map_err(|_| overflow())
}
