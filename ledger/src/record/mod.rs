//! # Record Module
//!
//! The three persistent record types of the KARMA ledger and the builder
//! that assembles Transaction audit records.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       — AccountKind, Root, User
//! transaction.rs — Transaction record + fluent TransactionBuilder
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Frozen wire encoding.** Every field carries an explicit serde
//!    rename (`ID`, `TotalIntegral`, `FromType`, ...) reproducing the
//!    historical deployment's JSON, and struct declaration order matches
//!    the historical key order. Stored state and API payloads are the same
//!    bytes.
//! 2. **Account classes as integers.** `AccountKind` crosses the wire as
//!    0 (Root) or 1 (User) via `into`/`try_from` conversions rather than a
//!    string tag, again for compatibility.
//! 3. **Signed 64-bit amounts.** The historical deployment used a signed
//!    machine integer and some operations intentionally accept any integer;
//!    `i64` preserves that while the operation layer enforces
//!    non-negativity where required.
//! 4. **`Default` is the zero record.** Lenient read mode hands out
//!    `Default::default()` for absent keys, matching the zero-struct decode
//!    the original produced.

pub mod transaction;
pub mod types;

pub use transaction::{Transaction, TransactionBuilder};
pub use types::{AccountKind, Root, User};
