//! Account record definitions for the KARMA ledger.
//!
//! These types are the persistent vocabulary of the ledger. Their JSON
//! field names (`ID`, `Name`, `TotalIntegral`, ...) are frozen: they match
//! the historical deployment byte for byte, and both the storage layer and
//! the API boundary rely on that encoding. Rename a field here and every
//! existing ledger database on disk becomes unreadable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config;

// ---------------------------------------------------------------------------
// AccountKind
// ---------------------------------------------------------------------------

/// Discriminant for the class of account on either end of a value movement.
///
/// Encoded on the wire as a bare integer (0 = Root, 1 = User), because that
/// is what the original deployment wrote and what downstream consumers of
/// Transaction records parse. `Root` is the zero value so a default-decoded
/// record matches the historical zero-struct semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AccountKind {
    /// The single issuing account.
    #[default]
    Root,
    /// A named balance-holding user account.
    User,
}

impl From<AccountKind> for u8 {
    fn from(kind: AccountKind) -> Self {
        match kind {
            AccountKind::Root => config::ACCOUNT_CODE_ROOT,
            AccountKind::User => config::ACCOUNT_CODE_USER,
        }
    }
}

impl TryFrom<u8> for AccountKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            config::ACCOUNT_CODE_ROOT => Ok(AccountKind::Root),
            config::ACCOUNT_CODE_USER => Ok(AccountKind::User),
            other => Err(format!("invalid account kind code: {}", other)),
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "Root"),
            Self::User => write!(f, "User"),
        }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// The single issuing account.
///
/// Tracks both the cumulative amount ever minted (`total_integral`) and the
/// portion still held by the issuer (`rest_integral`). Exchange moves value
/// out of `rest_integral`; Issue grows both fields by the same amount, so
/// `total_integral - rest_integral` is the amount currently distributed to
/// users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    /// Fixed identifier, always [`config::ROOT_ID`].
    #[serde(rename = "ID")]
    pub id: String,
    /// Display label, set once at initialization.
    #[serde(rename = "Name")]
    pub name: String,
    /// Cumulative amount ever issued. Grows only via Issue.
    #[serde(rename = "TotalIntegral")]
    pub total_integral: i64,
    /// Currently unallocated balance held by the issuer.
    #[serde(rename = "RestIntegral")]
    pub rest_integral: i64,
}

impl Root {
    /// Creates the issuing account with the fixed id and an initial supply
    /// that is both fully minted and fully unallocated.
    pub fn new(name: impl Into<String>, total: i64) -> Self {
        Self {
            id: config::ROOT_ID.to_string(),
            name: name.into(),
            total_integral: total,
            rest_integral: total,
        }
    }

    /// Amount currently distributed to user accounts.
    pub fn allocated(&self) -> i64 {
        self.total_integral - self.rest_integral
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A named balance-holding account.
///
/// The id is chosen by the caller, never generated here, and is unique per
/// user. The balance is kept non-negative by the operation layer; this type
/// itself is a plain record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Externally supplied identifier.
    #[serde(rename = "ID")]
    pub id: String,
    /// Display label, immutable after creation.
    #[serde(rename = "Name")]
    pub name: String,
    /// Current balance.
    #[serde(rename = "Integral")]
    pub integral: i64,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, integral: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            integral,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_kind_wire_codes() {
        assert_eq!(u8::from(AccountKind::Root), 0);
        assert_eq!(u8::from(AccountKind::User), 1);
        assert_eq!(AccountKind::try_from(0).unwrap(), AccountKind::Root);
        assert_eq!(AccountKind::try_from(1).unwrap(), AccountKind::User);
    }

    #[test]
    fn account_kind_rejects_unknown_code() {
        let err = AccountKind::try_from(7).unwrap_err();
        assert!(err.contains("7"));
    }

    #[test]
    fn account_kind_serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&AccountKind::Root).unwrap(), "0");
        assert_eq!(serde_json::to_string(&AccountKind::User).unwrap(), "1");
        let kind: AccountKind = serde_json::from_str("1").unwrap();
        assert_eq!(kind, AccountKind::User);
    }

    #[test]
    fn root_json_matches_historical_encoding() {
        // Exact string from the original deployment's state after
        // initialization with ("shanchain", 50000). Field names and order
        // are both load-bearing.
        let root = Root::new("shanchain", 50_000);
        assert_eq!(
            serde_json::to_string(&root).unwrap(),
            r#"{"ID":"0001","Name":"shanchain","TotalIntegral":50000,"RestIntegral":50000}"#
        );
    }

    #[test]
    fn user_json_matches_historical_encoding() {
        let user = User::new("10086", "china mobile", 100);
        assert_eq!(
            serde_json::to_string(&user).unwrap(),
            r#"{"ID":"10086","Name":"china mobile","Integral":100}"#
        );
    }

    #[test]
    fn root_roundtrip_preserves_all_fields() {
        let root = Root::new("issuer", 123);
        let bytes = serde_json::to_vec(&root).unwrap();
        let decoded: Root = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn user_roundtrip_preserves_all_fields() {
        let user = User::new("u-1", "alice", 42);
        let decoded: User =
            serde_json::from_slice(&serde_json::to_vec(&user).unwrap()).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn root_allocated_is_total_minus_rest() {
        let mut root = Root::new("issuer", 1_000);
        assert_eq!(root.allocated(), 0);
        root.rest_integral = 400;
        assert_eq!(root.allocated(), 600);
    }

    #[test]
    fn default_records_are_zero_valued() {
        // Lenient reads hand these out for absent keys, mirroring the
        // zero-struct decode of the original implementation.
        let root = Root::default();
        assert_eq!(root.id, "");
        assert_eq!(root.total_integral, 0);
        let user = User::default();
        assert_eq!(user.integral, 0);
    }
}
