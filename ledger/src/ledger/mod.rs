//! # Ledger Core
//!
//! The operation engine for the merit-point ledger: root issuance, user
//! account creation, value movements between accounts, and the read
//! accessors over all three record families. The paired-write
//! compensation protocol the movements rely on lives here too.
//!
//! ## Architecture
//!
//! ```text
//! dispatch::dispatch            wire function names, arity checks
//!   └─ engine::Ledger<S>        validate, compute, persist
//!        ├─ compensation        two-record write protocol
//!        └─ LedgerRepository    typed records over raw bytes
//! ```
//!
//! ## Design Decisions
//!
//! 1. **All validation precedes the first write.** An operation that
//!    fails validation leaves the store byte-identical to how it found
//!    it. Partial failure is only possible between the two writes of a
//!    value movement, and that window belongs to [`compensation`].
//! 2. **Snapshot restoration, not reverse arithmetic.** Compensation
//!    re-persists the record captured before mutation. Recomputing the
//!    old value from the new one drifts the moment an operation stops
//!    being invertible.
//! 3. **The audit trail is subordinate to balances.** A transaction
//!    record that fails to persist reports an error but never unwinds
//!    the settled movement it describes.

pub mod compensation;
pub mod engine;

pub use compensation::{commit_pair, CommitPhase, PairedOutcome};
pub use engine::{parse_integral, ErrorClass, Ledger, LedgerError, LedgerResult, ReadMode};
