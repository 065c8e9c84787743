//! # Ledger Configuration & Constants
//!
//! Every magic value in KARMA lives here. If you find yourself typing
//! `"0001"` anywhere else in the workspace, stop and import it instead —
//! the issuing account's identity is not something we want to get creative
//! with in fourteen different files.

// ---------------------------------------------------------------------------
// Ledger Identity
// ---------------------------------------------------------------------------

/// The fixed identifier of the single issuing (Root) account.
///
/// There is exactly one Root record per ledger instance and it always
/// carries this id, both in storage and on the wire. Callers that depend on
/// the historical deployment depend on this exact string.
pub const ROOT_ID: &str = "0001";

/// Wire discriminant for the Root account class in Transaction records.
pub const ACCOUNT_CODE_ROOT: u8 = 0;

/// Wire discriminant for the User account class in Transaction records.
pub const ACCOUNT_CODE_USER: u8 = 1;

/// Reserved `Step` value stamped on every Transaction record.
///
/// The field exists for a conversion-step feature that never shipped; no
/// operation increments it and nothing reads it back. It stays at zero for
/// wire compatibility.
pub const TRANSACTION_STEP: i64 = 0;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// The ledger software version, reported by the node's `/status` endpoint
/// and the `karma_version` RPC method.
pub const LEDGER_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default directory for the node's sled database.
pub const DEFAULT_DATA_DIR: &str = "~/.karma";

/// Default RPC API port.
pub const DEFAULT_RPC_PORT: u16 = 9650;

/// Default metrics (Prometheus) port. Kept adjacent to the RPC port so an
/// operator scanning a process list can pair them at a glance.
pub const DEFAULT_METRICS_PORT: u16 = 9651;

/// Namespace prefix for every Prometheus metric the node registers.
pub const METRICS_NAMESPACE: &str = "karma";
