//! The port client façade.
//!
//! Composes the registry, provisioner, encoder, and broadcaster into the
//! end-to-end transfer operation the UI collaborator calls. One `transfer`
//! is a single sequential flow; the chain-I/O steps are its only suspension
//! points. Concurrent transfers for the same (mint, owner) are serialized
//! by the provisioner's per-key lock, nothing more.

use std::str::FromStr;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use tracing::{debug, info};

use crate::config::PortClientConfig;
use crate::error::{ConfigError, EncodingError, RegistryError, TransferError};
use crate::registry::Registry;
use crate::solana::broadcaster::{BroadcastConfig, Broadcaster};
use crate::solana::instruction::{build_unwrap_instruction, port_program_address};
use crate::solana::ledger::{AccountLedger, KvStore};
use crate::solana::provisioner::AccountProvisioner;
use crate::solana::rpc::{ChainRpc, SolanaRpc};
use crate::solana::wallet::WalletSigner;
use crate::types::{to_base_units, ChainId, TokenDescriptor};

/// End-to-end bridge transfer client for the IB Port program.
pub struct PortClient<S: KvStore, R: ChainRpc, W: WalletSigner> {
    registry: Registry,
    port_program: Pubkey,
    provisioner: AccountProvisioner<S, R>,
    broadcaster: Broadcaster<R>,
    wallet: W,
}

impl<S: KvStore, W: WalletSigner> PortClient<S, SolanaRpc, W> {
    /// Build a client against a live Solana endpoint from configuration.
    pub fn connect(
        config: &PortClientConfig,
        registry: Registry,
        ledger: AccountLedger<S>,
        wallet: W,
    ) -> Result<Self, ConfigError> {
        let port_program =
            Pubkey::from_str(&config.port_program).map_err(|_| ConfigError::InvalidPubkey {
                field: "port_program",
                value: config.port_program.clone(),
            })?;

        let rpc = Arc::new(SolanaRpc::new(&config.rpc_url, config.commitment_config()));
        Ok(Self::new(
            registry,
            port_program,
            ledger,
            rpc,
            wallet,
            config.broadcast_config(),
        ))
    }
}

impl<S: KvStore, R: ChainRpc, W: WalletSigner> PortClient<S, R, W> {
    pub fn new(
        registry: Registry,
        port_program: Pubkey,
        ledger: AccountLedger<S>,
        rpc: Arc<R>,
        wallet: W,
        broadcast: BroadcastConfig,
    ) -> Self {
        let broadcaster = Broadcaster::new(rpc, broadcast);
        let provisioner = AccountProvisioner::new(ledger, broadcaster.clone());

        PortClient {
            registry,
            port_program,
            provisioner,
            broadcaster,
            wallet,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn provisioner(&self) -> &AccountProvisioner<S, R> {
        &self.provisioner
    }

    /// Tokens the UI may offer for transfer: only those with at least one
    /// bridge route.
    pub fn list_bridgeable_tokens(&self) -> Vec<&TokenDescriptor> {
        self.registry.list_bridgeable_tokens()
    }

    /// Initiate a cross-chain transfer: burn `amount_human` of `ticker` on
    /// the port chain and request unwrapping to `receiver` on the
    /// destination chain.
    ///
    /// Returns the confirmed signature as proof of submission. Every
    /// failure carries the stage it originated from; nothing is retried
    /// here — a rejected submission needs a fresh blockhash, so the caller
    /// re-invokes from the top.
    pub async fn transfer(
        &self,
        ticker: &str,
        origin: ChainId,
        destination: ChainId,
        amount_human: &str,
        receiver: &str,
    ) -> Result<Signature, TransferError> {
        let token = self.registry.token(ticker)?;
        let amount = to_base_units(amount_human, token.decimals)?;
        let route = self.registry.resolve_route(ticker, origin, destination)?;
        let dest_chain = self.registry.chain(route.destination)?;

        let receiver_bytes = dest_chain.decode_address(receiver)?;

        let mint_str = token
            .mint
            .as_deref()
            .ok_or_else(|| TransferError::Token(RegistryError::MissingMint(ticker.to_string())))?;
        let mint = Pubkey::from_str(mint_str).map_err(|e| {
            TransferError::Encoding(EncodingError::InvalidAccount {
                value: mint_str.to_string(),
                reason: e.to_string(),
            })
        })?;

        let port_pda = port_program_address(&self.port_program)?;

        info!(
            ticker,
            origin = %origin,
            destination = %destination,
            amount,
            "Initiating transfer-unwrap"
        );

        // source: the wallet's token account the port burns from
        let spender = self
            .provisioner
            .ensure_account(&mint, &self.wallet.pubkey(), &self.wallet)
            .await?;
        // destination side: the port's own holding account for this mint
        let port_holding = self
            .provisioner
            .ensure_account(&mint, &port_pda, &self.wallet)
            .await?;

        debug!(
            spender = %spender.pubkey(),
            port_holding = %port_holding.pubkey(),
            "Token accounts ready"
        );

        let instruction = build_unwrap_instruction(
            &self.port_program,
            &self.wallet.pubkey(),
            &mint,
            &spender.pubkey(),
            amount,
            &receiver_bytes,
            dest_chain.address_width,
        )?;

        let signature = self
            .broadcaster
            .broadcast(&[instruction], &self.wallet, &[])
            .await?;

        info!(signature = %signature, ticker, amount, "Transfer-unwrap confirmed");
        Ok(signature)
    }
}
