//! Chain and token registry.
//!
//! The registry is immutable configuration data: built once at startup,
//! validated, then only read. Components receive it by reference; there is
//! no global singleton.
//!
//! Duplicate routes for the same (origin, destination) pair are a
//! configuration error and are rejected at load time, so the in-order
//! route scan at call time always finds the unique match.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;
use crate::types::{AddressFormat, BridgeRoute, ChainDescriptor, ChainId, TokenDescriptor};

/// Well-known chain ids used by the mainnet preset.
pub const CHAIN_ETHEREUM: ChainId = ChainId(1);
pub const CHAIN_WAVES: ChainId = ChainId(2);
pub const CHAIN_BSC: ChainId = ChainId(3);

/// Read-only registry of chains and tokens with bridge-route metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    chains: Vec<ChainDescriptor>,
    tokens: Vec<TokenDescriptor>,
}

impl Registry {
    /// Build and validate a registry.
    ///
    /// Fails if any route references an unknown chain, or if a token
    /// declares more than one route for the same (origin, destination)
    /// pair.
    pub fn new(
        chains: Vec<ChainDescriptor>,
        tokens: Vec<TokenDescriptor>,
    ) -> Result<Self, RegistryError> {
        let registry = Registry { chains, tokens };

        for token in &registry.tokens {
            for (i, route) in token.routes.iter().enumerate() {
                registry.chain(route.origin)?;
                registry.chain(route.destination)?;

                let duplicate = token.routes[..i]
                    .iter()
                    .any(|r| r.origin == route.origin && r.destination == route.destination);
                if duplicate {
                    return Err(RegistryError::DuplicateRoute {
                        ticker: token.ticker.clone(),
                        origin: route.origin,
                        destination: route.destination,
                    });
                }
            }
        }

        debug!(
            chains = registry.chains.len(),
            tokens = registry.tokens.len(),
            "Registry loaded"
        );

        Ok(registry)
    }

    /// Look a chain up by id.
    pub fn chain(&self, id: ChainId) -> Result<&ChainDescriptor, RegistryError> {
        self.chains
            .iter()
            .find(|c| c.id == id)
            .ok_or(RegistryError::UnknownChain(id))
    }

    /// Look a token up by ticker.
    pub fn token(&self, ticker: &str) -> Result<&TokenDescriptor, RegistryError> {
        self.tokens
            .iter()
            .find(|t| t.ticker == ticker)
            .ok_or_else(|| RegistryError::UnknownToken(ticker.to_string()))
    }

    /// All tokens with at least one bridge route. Tokens without routes are
    /// not transferable and are never surfaced.
    pub fn list_bridgeable_tokens(&self) -> Vec<&TokenDescriptor> {
        self.tokens.iter().filter(|t| t.is_bridgeable()).collect()
    }

    /// Resolve the route of `ticker` for the requested chain pair.
    pub fn resolve_route(
        &self,
        ticker: &str,
        origin: ChainId,
        destination: ChainId,
    ) -> Result<&BridgeRoute, RegistryError> {
        let token = self.token(ticker)?;
        token
            .routes
            .iter()
            .find(|r| r.origin == origin && r.destination == destination)
            .ok_or_else(|| RegistryError::RouteNotFound {
                ticker: ticker.to_string(),
                origin,
                destination,
            })
    }

    /// Explorer URL for an address on a known chain, when one exists.
    pub fn explorer_address_url(&self, chain: ChainId, address: &str) -> Option<String> {
        match chain {
            CHAIN_BSC => Some(format!(
                "https://bscscan.com/address/{address}#tokentxns"
            )),
            CHAIN_ETHEREUM => Some(format!(
                "https://etherscan.io/address/{address}#tokentxns"
            )),
            CHAIN_WAVES => Some(format!("https://wavesexplorer.com/address/{address}")),
            _ => None,
        }
    }

    /// The production chain/token tables.
    ///
    /// Carries the SIGN mainnet token with its Waves asset id and BSC-side
    /// ERC20 contract; the wrapped SPL mint is deployment-specific and left
    /// unset here.
    pub fn mainnet() -> Self {
        let chains = vec![
            ChainDescriptor {
                id: CHAIN_ETHEREUM,
                label: "ETH".to_string(),
                icon: "/img/icons/ethereum.svg".to_string(),
                address_width: 20,
                address_format: AddressFormat::Hex,
            },
            ChainDescriptor {
                id: CHAIN_WAVES,
                label: "WAVES".to_string(),
                icon: "/img/icons/waves.svg".to_string(),
                address_width: 26,
                address_format: AddressFormat::Base58,
            },
            ChainDescriptor {
                id: CHAIN_BSC,
                label: "BSC".to_string(),
                icon: "/img/icons/bnb.png".to_string(),
                address_width: 20,
                address_format: AddressFormat::Hex,
            },
        ];

        let sign_erc20 = "0x29499dD7da98588077806a9Fd45048692b443A3F";
        let tokens = vec![TokenDescriptor {
            ticker: "SIGN".to_string(),
            label: "SIGN Mainnet".to_string(),
            icon: "/img/icons/signature-chain.png".to_string(),
            decimals: 8,
            asset_id: "9sQutD5HnRvjM1uui5cVC4w9xkMPAfYEV8ymug3Mon2Y".to_string(),
            erc20: Some(sign_erc20.to_string()),
            mint: None,
            routes: vec![BridgeRoute {
                origin: CHAIN_WAVES,
                destination: CHAIN_BSC,
                origin_port: "9sQutD5HnRvjM1uui5cVC4w9xkMPAfYEV8ymug3Mon2Y".to_string(),
                destination_port: sign_erc20.to_string(),
            }],
        }];

        Registry::new(chains, tokens).expect("mainnet preset tables are valid")
    }
}
