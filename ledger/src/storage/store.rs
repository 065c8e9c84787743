//! # State Store — Key-Value Substrate
//!
//! The persistence substrate the ledger runs on: a single keyspace with
//! independent single-key `get` and `put` operations. Deliberately narrow —
//! no batches, no multi-key transactions, no range scans — because the
//! compensation protocol in the operation layer is specified against
//! exactly this contract and must not quietly depend on more.
//!
//! ## Key Layout
//!
//! | Key            | Value                  |
//! |----------------|------------------------|
//! | `ledger:root`  | JSON-encoded `Root`    |
//! | `user:<id>`    | JSON-encoded `User`    |
//! | `tx:<call id>` | JSON-encoded `Transaction` |
//!
//! The prefixes keep the three entity families in disjoint key ranges, so a
//! user who registers the id `root` (or an id that collides with a call
//! identifier) cannot clobber another record family.

use sled::Db;
use std::path::Path;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors surfaced by a state store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Storage key construction for the three entity families.
///
/// All key shapes live here so the layout table in the module docs has a
/// single point of truth.
pub mod keys {
    /// Key of the single Root record.
    pub const ROOT: &[u8] = b"ledger:root";

    /// Key of a User record.
    pub fn user(id: &str) -> Vec<u8> {
        format!("user:{id}").into_bytes()
    }

    /// Key of a Transaction record, by its call identifier.
    pub fn transaction(id: &str) -> Vec<u8> {
        format!("tx:{id}").into_bytes()
    }
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// The substrate contract the ledger persists through.
///
/// Each `put` is an independent, individually fallible write; implementors
/// make no atomicity promise across keys. That weakness is load-bearing:
/// the operation layer's compensation logic exists precisely because two
/// related records can fail to land together, and tests exercise it by
/// substituting an implementation that fails selected writes.
pub trait StateStore {
    /// Reads the value under `key`, or `None` if the key is absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, overwriting any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Blocks until previously written data is durable.
    fn flush(&self) -> StoreResult<()>;

    /// Whether `key` currently holds a value.
    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

/// [`StateStore`] backed by sled's embedded key-value store.
///
/// All records live in sled's default tree; the `keys` module keeps the
/// entity families disjoint within it.
///
/// # Thread Safety
///
/// sled is inherently thread-safe, so a `SledStore` can be shared across
/// threads via `Arc` (or cloned — the handle itself is cheap to clone)
/// without external synchronization.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Opens or creates a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Creates a temporary database that is cleaned up automatically when
    /// the handle is dropped.
    ///
    /// Ideal for tests — no filesystem side effects, no cleanup needed.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl StateStore for SledStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_temporary_store_is_empty() {
        let store = SledStore::open_temporary().expect("temp store");
        assert!(store.get(keys::ROOT).unwrap().is_none());
        assert!(!store.contains(keys::ROOT).unwrap());
    }

    #[test]
    fn put_then_get_roundtrip() {
        let store = SledStore::open_temporary().unwrap();
        store.put(b"user:alice", b"payload").unwrap();

        let value = store.get(b"user:alice").unwrap().expect("value present");
        assert_eq!(value, b"payload");
        assert!(store.contains(b"user:alice").unwrap());
    }

    #[test]
    fn put_overwrites_previous_value() {
        let store = SledStore::open_temporary().unwrap();
        store.put(b"k", b"old").unwrap();
        store.put(b"k", b"new").unwrap();
        assert_eq!(store.get(b"k").unwrap().unwrap(), b"new");
    }

    #[test]
    fn get_missing_key_returns_none() {
        let store = SledStore::open_temporary().unwrap();
        assert!(store.get(b"no-such-key").unwrap().is_none());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");

        {
            let store = SledStore::open(dir.path()).expect("open");
            store.put(keys::ROOT, b"root-bytes").unwrap();
            store.flush().unwrap();
        }

        let reopened = SledStore::open(dir.path()).expect("reopen");
        assert_eq!(reopened.get(keys::ROOT).unwrap().unwrap(), b"root-bytes");
    }

    #[test]
    fn entity_families_occupy_disjoint_keys() {
        // A user id equal to another family's identifier must never map to
        // the same key.
        assert_ne!(keys::user("root"), keys::ROOT.to_vec());
        assert_ne!(keys::user("abc"), keys::transaction("abc"));
        assert_ne!(keys::transaction("ledger:root"), keys::ROOT.to_vec());
    }

    #[test]
    fn flush_does_not_error() {
        let store = SledStore::open_temporary().unwrap();
        store.put(b"k", b"v").unwrap();
        store.flush().expect("flush should succeed");
    }
}
