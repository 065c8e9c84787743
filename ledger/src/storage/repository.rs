//! # Ledger Repository
//!
//! Typed per-entity load/save over the raw [`StateStore`]. This layer is a
//! pure marshal/unmarshal bridge: it encodes records, maps them to their
//! storage keys, and translates store-level outcomes into entity-level
//! errors. No business validation happens here.
//!
//! Records are encoded as JSON. That choice is deliberate: it is the exact
//! byte representation the historical deployment persisted, so a database
//! written by this crate is readable by anything that understood the old
//! state, and the repository and the API boundary share one codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use crate::record::{Root, Transaction, User};
use crate::storage::store::{keys, StateStore, StoreError};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// The entity families the repository manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Root,
    User,
    Transaction,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::User => write!(f, "user"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {id:?} not found")]
    NotFound { entity: Entity, id: String },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ---------------------------------------------------------------------------
// LedgerRepository
// ---------------------------------------------------------------------------

/// Per-entity persistence helpers for the three record types.
///
/// Every save is a full overwrite of the entity's serialized state under
/// its key; there is no partial-field update. Generic over the store so
/// tests can substitute a fault-injecting substrate.
#[derive(Debug, Clone)]
pub struct LedgerRepository<S> {
    store: S,
}

impl<S: StateStore> LedgerRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the single Root record.
    pub fn load_root(&self) -> RepositoryResult<Root> {
        self.load(keys::ROOT, Entity::Root, crate::config::ROOT_ID)
    }

    /// Persists the Root record, overwriting any previous state.
    pub fn save_root(&self, root: &Root) -> RepositoryResult<()> {
        self.save(keys::ROOT, root)
    }

    /// Whether the ledger has been initialized (a Root record exists).
    pub fn root_exists(&self) -> RepositoryResult<bool> {
        Ok(self.store.contains(keys::ROOT)?)
    }

    /// Loads the User record with the given id.
    pub fn load_user(&self, id: &str) -> RepositoryResult<User> {
        self.load(&keys::user(id), Entity::User, id)
    }

    /// Persists a User record under its own id.
    pub fn save_user(&self, user: &User) -> RepositoryResult<()> {
        self.save(&keys::user(&user.id), user)
    }

    /// Whether a User record exists for the given id.
    pub fn user_exists(&self, id: &str) -> RepositoryResult<bool> {
        Ok(self.store.contains(&keys::user(id))?)
    }

    /// Loads the Transaction record keyed by the given call identifier.
    pub fn load_transaction(&self, id: &str) -> RepositoryResult<Transaction> {
        self.load(&keys::transaction(id), Entity::Transaction, id)
    }

    /// Persists a Transaction record under its call identifier.
    pub fn save_transaction(&self, record: &Transaction) -> RepositoryResult<()> {
        self.save(&keys::transaction(&record.id), record)
    }

    /// Blocks until previously written records are durable.
    pub fn flush(&self) -> RepositoryResult<()> {
        Ok(self.store.flush()?)
    }

    // -- Codec bridge -------------------------------------------------------

    fn load<T: DeserializeOwned>(
        &self,
        key: &[u8],
        entity: Entity,
        id: &str,
    ) -> RepositoryResult<T> {
        let bytes = self.store.get(key)?.ok_or_else(|| RepositoryError::NotFound {
            entity,
            id: id.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Codec(e.to_string()))
    }

    fn save<T: Serialize>(&self, key: &[u8], record: &T) -> RepositoryResult<()> {
        let bytes =
            serde_json::to_vec(record).map_err(|e| RepositoryError::Codec(e.to_string()))?;
        Ok(self.store.put(key, &bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
