//! Solana-side machinery of the port client: the account ledger, the
//! chain RPC seam, instruction encoding, the broadcaster, and the
//! provisioner.

pub mod broadcaster;
pub mod instruction;
pub mod ledger;
pub mod provisioner;
pub mod rpc;
pub mod wallet;

pub use broadcaster::{BroadcastConfig, Broadcaster};
pub use instruction::{
    build_unwrap_instruction, encode_transfer_unwrap, port_program_address, unwrap_account_metas,
    PORT_PDA_SEED, UNWRAP_OPCODE,
};
pub use ledger::{AccountLedger, FileStore, KvStore, LedgerKey, MemoryStore};
pub use provisioner::AccountProvisioner;
pub use rpc::{ChainRpc, SolanaRpc};
pub use wallet::{LocalWallet, WalletSigner};
