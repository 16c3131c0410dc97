//! Durable ledger of provisioned token accounts.
//!
//! Maps (mint, owner) to the keypair of a previously created SPL token
//! account so provisioning is idempotent across sessions. The store is the
//! canonical copy once an account is recorded; in-memory keypairs are only
//! a cache of it.
//!
//! Secret keys are persisted bs58-encoded under `"{mint}_{owner}"` keys
//! (base58 never contains `_`, so the composite key is unambiguous). This
//! is the only place signing material is ever serialized.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use tracing::debug;

use crate::error::StoreError;

/// Separator between the mint and owner halves of a ledger key.
const KEY_SEPARATOR: char = '_';

/// Composite index of one provisioned account: (mint, owner).
///
/// At most one account handle may exist per key; the provisioner checks
/// before creating, never after.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey(String);

impl LedgerKey {
    pub fn new(mint: &Pubkey, owner: &Pubkey) -> Self {
        LedgerKey(format!("{mint}{KEY_SEPARATOR}{owner}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable string key-value store.
///
/// `get` on a missing key is `Ok(None)`, never an error. `put` silently
/// overwrites: callers only invoke it after genuinely creating an account.
/// The medium is up to the implementation — a file, an embedded database,
/// or an external service.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// JSON-file-backed store.
///
/// The whole map is rewritten through a temporary file and renamed into
/// place, so a crash mid-write leaves the previous contents intact.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open a store at `path`, loading existing entries if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), "Opened ledger store");

        Ok(FileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().expect("ledger store lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("ledger store lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("ledger store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().expect("ledger store lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("ledger store lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed ledger over any [`KvStore`], translating keypairs to and from
/// their bs58 persisted form.
pub struct AccountLedger<S: KvStore> {
    store: S,
}

impl<S: KvStore> AccountLedger<S> {
    pub fn new(store: S) -> Self {
        AccountLedger { store }
    }

    /// Retrieve the keypair recorded for `key`, if any.
    pub fn get(&self, key: &LedgerKey) -> Result<Option<Keypair>, StoreError> {
        let Some(encoded) = self.store.get(key.as_str())? else {
            return Ok(None);
        };

        let bytes = bs58::decode(&encoded)
            .into_vec()
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        let keypair = Keypair::from_bytes(&bytes).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(keypair))
    }

    /// Record a freshly created account under `key`. Overwrites any
    /// previous entry.
    pub fn put(&self, key: &LedgerKey, keypair: &Keypair) -> Result<(), StoreError> {
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        self.store.put(key.as_str(), &encoded)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;

    #[test]
    fn test_ledger_key_format() {
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let key = LedgerKey::new(&mint, &owner);
        assert_eq!(key.as_str(), format!("{mint}_{owner}"));
    }

    #[test]
    fn test_memory_roundtrip() {
        let ledger = AccountLedger::new(MemoryStore::new());
        let key = LedgerKey::new(&Pubkey::new_unique(), &Pubkey::new_unique());

        assert!(ledger.get(&key).unwrap().is_none());

        let keypair = Keypair::new();
        ledger.put(&key, &keypair).unwrap();

        let restored = ledger.get(&key).unwrap().unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());
        assert_eq!(restored.to_bytes(), keypair.to_bytes());
    }

    #[test]
    fn test_put_overwrites() {
        let ledger = AccountLedger::new(MemoryStore::new());
        let key = LedgerKey::new(&Pubkey::new_unique(), &Pubkey::new_unique());

        let first = Keypair::new();
        let second = Keypair::new();
        ledger.put(&key, &first).unwrap();
        ledger.put(&key, &second).unwrap();

        let restored = ledger.get(&key).unwrap().unwrap();
        assert_eq!(restored.pubkey(), second.pubkey());
    }

    #[test]
    fn test_corrupt_entry_surfaces() {
        let store = MemoryStore::new();
        store.put("some_key", "not-base58-!!").unwrap();

        let ledger = AccountLedger::new(store);
        let key = LedgerKey("some_key".to_string());
        assert!(matches!(
            ledger.get(&key),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let key = LedgerKey::new(&Pubkey::new_unique(), &Pubkey::new_unique());
        let keypair = Keypair::new();

        {
            let ledger = AccountLedger::new(FileStore::open(&path).unwrap());
            ledger.put(&key, &keypair).unwrap();
        }

        let reopened = AccountLedger::new(FileStore::open(&path).unwrap());
        let restored = reopened.get(&key).unwrap().unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());
    }
}
