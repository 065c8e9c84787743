// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KARMA — Merit-Point Ledger Core
//!
//! A small, stubborn ledger: one root account that issues merit points,
//! user accounts that hold and spend them, and an append-style audit
//! trail of every movement. KARMA replaces a legacy chaincode deployment
//! and stays wire-compatible with it down to the JSON field names,
//! because the clients in the field were not consulted about the rewrite.
//!
//! ## Architecture
//!
//! The crate is split along the concerns an accountant would recognize:
//!
//! - **record** — The three persisted record families: `Root`, `User`,
//!   `Transaction`. The schema is the contract; everything else is
//!   replaceable.
//! - **storage** — A deliberately small key-value seam (`StateStore`)
//!   with a sled implementation, and the typed repository on top.
//! - **ledger** — The operation engine: validation, checked arithmetic,
//!   and the paired-write compensation protocol for value movements.
//! - **dispatch** — The stringly-typed wire surface: function names,
//!   arity checks, argument parsing.
//! - **config** — Ledger constants. The boring file you read first.
//!
//! ## Design Philosophy
//!
//! 1. Validate everything before writing anything. A rejected operation
//!    leaves no fingerprints.
//! 2. The store is weak on purpose. No multi-key atomicity means the
//!    failure window is real, so we model it instead of hoping.
//! 3. Balances outrank the audit trail. A lost transaction record is an
//!    incident; a wrong balance is a scandal.
//! 4. If it moves integral, it has tests. Including the failures.

pub mod config;
pub mod dispatch;
pub mod ledger;
pub mod record;
pub mod storage;
