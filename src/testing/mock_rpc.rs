//! Scriptable in-memory [`ChainRpc`] implementation.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::InstructionError;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};
use solana_transaction_status::{TransactionConfirmationStatus, TransactionStatus};

use crate::error::RpcError;
use crate::solana::rpc::ChainRpc;

/// Default rent-exempt minimum for an SPL token account (mainnet value).
pub const DEFAULT_RENT: u64 = 2_039_280;

#[derive(Default)]
struct Inner {
    send_failures: VecDeque<RpcError>,
    blockhash_failures: VecDeque<RpcError>,
    never_confirm: bool,
    confirm_with_error: bool,
    sent: Vec<Transaction>,
    send_calls: u32,
    status_calls: u32,
    rent_calls: u32,
}

/// Chain endpoint double with scripted outcomes and call counters.
///
/// By default every submission succeeds and confirms on the first status
/// poll. Failures are scripted per call with [`MockChainRpc::fail_next_send`]
/// and friends.
pub struct MockChainRpc {
    rent: u64,
    inner: Mutex<Inner>,
}

impl Default for MockChainRpc {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainRpc {
    pub fn new() -> Self {
        MockChainRpc {
            rent: DEFAULT_RENT,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Queue a failure for the next `send_transaction` call.
    pub fn fail_next_send(&self, error: RpcError) {
        self.inner.lock().unwrap().send_failures.push_back(error);
    }

    /// Queue a failure for the next `latest_blockhash` call.
    pub fn fail_next_blockhash(&self, error: RpcError) {
        self.inner
            .lock()
            .unwrap()
            .blockhash_failures
            .push_back(error);
    }

    /// Status polls always answer "not seen yet".
    pub fn set_never_confirm(&self) {
        self.inner.lock().unwrap().never_confirm = true;
    }

    /// Status polls report the transaction failed on-chain.
    pub fn set_confirm_with_error(&self) {
        self.inner.lock().unwrap().confirm_with_error = true;
    }

    /// Every transaction accepted so far, in submission order.
    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn send_calls(&self) -> u32 {
        self.inner.lock().unwrap().send_calls
    }

    pub fn status_calls(&self) -> u32 {
        self.inner.lock().unwrap().status_calls
    }

    pub fn rent_calls(&self) -> u32 {
        self.inner.lock().unwrap().rent_calls
    }
}

#[async_trait]
impl ChainRpc for MockChainRpc {
    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.blockhash_failures.pop_front() {
            return Err(error);
        }
        Ok(Hash::new_unique())
    }

    async fn minimum_balance_for_rent_exemption(&self, _data_len: usize) -> Result<u64, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        inner.rent_calls += 1;
        Ok(self.rent)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        inner.send_calls += 1;
        if let Some(error) = inner.send_failures.pop_front() {
            return Err(error);
        }
        inner.sent.push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<Option<TransactionStatus>, RpcError> {
        let mut inner = self.inner.lock().unwrap();
        inner.status_calls += 1;

        if inner.never_confirm {
            return Ok(None);
        }

        if inner.confirm_with_error {
            let err = TransactionError::InstructionError(0, InstructionError::Custom(1));
            return Ok(Some(TransactionStatus {
                slot: 1,
                confirmations: Some(1),
                status: Err(err.clone()),
                err: Some(err),
                confirmation_status: Some(TransactionConfirmationStatus::Confirmed),
            }));
        }

        Ok(Some(TransactionStatus {
            slot: 1,
            confirmations: Some(1),
            status: Ok(()),
            err: None,
            confirmation_status: Some(TransactionConfirmationStatus::Confirmed),
        }))
    }
}
