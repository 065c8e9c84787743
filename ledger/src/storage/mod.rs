//! # Storage Module
//!
//! Persistence for the KARMA ledger: a deliberately narrow key-value
//! substrate and the typed repository built on top of it.
//!
//! ## Architecture
//!
//! ```text
//! store.rs      — StateStore trait (get/put/flush), key layout, SledStore
//! repository.rs — LedgerRepository<S>: typed load/save per record family
//! ```
//!
//! ## Design Decisions
//!
//! 1. **The substrate stays weak on purpose.** `StateStore` exposes only
//!    independent single-key operations even though sled could do more.
//!    The operation layer's compensation protocol is written against that
//!    weak contract, and widening the trait would let atomicity leak in
//!    and silently mask compensation bugs.
//! 2. **JSON on disk.** Stored bytes are the same encoding the API serves
//!    and the same bytes the historical deployment wrote. One codec, zero
//!    translation layers, databases portable across implementations.
//! 3. **Prefixed keys.** `ledger:root` / `user:<id>` / `tx:<id>` keep the
//!    record families disjoint; externally supplied ids cannot collide
//!    across families no matter what callers pick.

pub mod repository;
pub mod store;

pub use repository::{Entity, LedgerRepository, RepositoryError, RepositoryResult};
pub use store::{keys, SledStore, StateStore, StoreError, StoreResult};
