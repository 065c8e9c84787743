//! Transaction record construction.
//!
//! A [`Transaction`] is the immutable audit record of one completed value
//! movement. It is keyed by the invocation's own unique call identifier —
//! the ledger never generates transaction ids itself, so a caller that
//! submitted an operation can always fetch its record back under the id it
//! already knows.

use serde::{Deserialize, Serialize};

use crate::config;
use crate::record::types::AccountKind;

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An append-only record of one completed Exchange or Transfer.
///
/// Written exactly once per successful value-moving operation and never
/// updated or deleted afterwards. The field names and their wire order are
/// frozen for compatibility with the historical deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, supplied by the execution context per call.
    #[serde(rename = "ID")]
    pub id: String,
    /// Reserved counter. Always zero; see [`config::TRANSACTION_STEP`].
    #[serde(rename = "Step")]
    pub step: i64,
    /// Amount moved.
    #[serde(rename = "Integral")]
    pub integral: i64,
    /// Class of the originating account.
    #[serde(rename = "FromType")]
    pub from_type: AccountKind,
    /// Identifier of the originating account within its class.
    #[serde(rename = "FromID")]
    pub from_id: String,
    /// Class of the destination account.
    #[serde(rename = "ToType")]
    pub to_type: AccountKind,
    /// Identifier of the destination account within its class.
    #[serde(rename = "ToID")]
    pub to_id: String,
    /// Origination timestamp, seconds since the Unix epoch.
    #[serde(rename = "Time")]
    pub time: i64,
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Transaction`] records.
///
/// ```
/// use karma_ledger::record::{AccountKind, TransactionBuilder};
///
/// let record = TransactionBuilder::new("call-7f3a")
///     .origin(AccountKind::Root, "0001")
///     .destination(AccountKind::User, "10086")
///     .integral(900)
///     .build();
///
/// assert_eq!(record.id, "call-7f3a");
/// assert_eq!(record.step, 0);
/// assert!(record.time > 0);
/// ```
///
/// `time` defaults to the current wall clock when not set explicitly; tests
/// pin it with [`TransactionBuilder::timestamp`]. There is deliberately no
/// setter for `step` — the field is reserved and stays zero.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    id: String,
    integral: i64,
    from_type: AccountKind,
    from_id: String,
    to_type: AccountKind,
    to_id: String,
    time: Option<i64>,
}

impl TransactionBuilder {
    /// Starts a builder for the record keyed by `call_id`.
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            id: call_id.into(),
            integral: 0,
            from_type: AccountKind::Root,
            from_id: String::new(),
            to_type: AccountKind::User,
            to_id: String::new(),
            time: None,
        }
    }

    /// Sets the originating account class and id.
    pub fn origin(mut self, kind: AccountKind, id: impl Into<String>) -> Self {
        self.from_type = kind;
        self.from_id = id.into();
        self
    }

    /// Sets the destination account class and id.
    pub fn destination(mut self, kind: AccountKind, id: impl Into<String>) -> Self {
        self.to_type = kind;
        self.to_id = id.into();
        self
    }

    /// Sets the amount moved.
    pub fn integral(mut self, amount: i64) -> Self {
        self.integral = amount;
        self
    }

    /// Pins the origination time (seconds since epoch) instead of sampling
    /// the wall clock at build time.
    pub fn timestamp(mut self, secs: i64) -> Self {
        self.time = Some(secs);
        self
    }

    /// Assembles the record.
    pub fn build(self) -> Transaction {
        Transaction {
            id: self.id,
            step: config::TRANSACTION_STEP,
            integral: self.integral,
            from_type: self.from_type,
            from_id: self.from_id,
            to_type: self.to_type,
            to_id: self.to_id,
            time: self.time.unwrap_or_else(|| chrono::Utc::now().timestamp()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
