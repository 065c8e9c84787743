//! Paired-write compensation: the two-record commit protocol.
//!
//! The state substrate persists one record per write and offers no
//! multi-key atomicity, so every value movement (which must update two
//! account records) is exposed to partial failure: the first record can
//! land while the second does not. This module makes that window explicit
//! instead of burying it inside the operation code.
//!
//! A paired update walks a small state machine:
//!
//! ```text
//!   Validated ──first──▶ FirstWritten ──second──▶ Committed
//!                             │
//!                             │ second fails
//!                             ▼
//!                     restore_first ──ok──▶ Restored
//!                             │
//!                             │ restore fails
//!                             ▼
//!                        Inconsistent
//! ```
//!
//! `Restored` re-persists the first record's pre-update snapshot, so the
//! store ends exactly where it started. `Inconsistent` is the one terminal
//! state that leaves the store damaged; callers must surface it loudly
//! rather than fold it into an ordinary storage error.

use crate::storage::RepositoryError;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Phase of a paired two-record update.
///
/// `Committed`, `Restored` and `Inconsistent` are terminal. A pair that
/// never wrote anything terminates in `Validated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    /// Balance checks passed; nothing has been written.
    Validated,
    /// The first record landed. Until the second lands the store holds a
    /// half-applied movement.
    FirstWritten,
    /// Both records landed.
    Committed,
    /// The second write failed and the first record was re-persisted from
    /// its pre-update snapshot. The store is back where it started.
    Restored,
    /// The second write failed and so did the restoring write. The store
    /// holds a half-applied movement that nothing will repair.
    Inconsistent,
}

impl std::fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommitPhase::Validated => "validated",
            CommitPhase::FirstWritten => "first-written",
            CommitPhase::Committed => "committed",
            CommitPhase::Restored => "restored",
            CommitPhase::Inconsistent => "inconsistent",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal result of driving a paired update.
#[derive(Debug)]
pub enum PairedOutcome {
    /// Both writes landed.
    Committed,
    /// The first write failed. Nothing durable changed.
    FirstWriteFailed(RepositoryError),
    /// The second write failed and the compensating write succeeded. The
    /// store is unchanged; the error is the one from the second write.
    RolledBack {
        /// The failure that aborted the pair.
        write_error: RepositoryError,
    },
    /// The second write failed and the compensating write also failed.
    /// The first record keeps its updated value with no matching second
    /// record. Operator intervention is required.
    RollbackFailed {
        /// The failure that aborted the pair.
        write_error: RepositoryError,
        /// The failure of the compensating write.
        rollback_error: RepositoryError,
    },
}

impl PairedOutcome {
    /// The phase this outcome terminated in.
    ///
    /// `FirstWriteFailed` terminates in [`CommitPhase::Validated`]: the
    /// protocol aborted before anything durable happened.
    pub fn phase(&self) -> CommitPhase {
        match self {
            PairedOutcome::Committed => CommitPhase::Committed,
            PairedOutcome::FirstWriteFailed(_) => CommitPhase::Validated,
            PairedOutcome::RolledBack { .. } => CommitPhase::Restored,
            PairedOutcome::RollbackFailed { .. } => CommitPhase::Inconsistent,
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol driver
// ---------------------------------------------------------------------------

/// Runs the two-record write protocol to a terminal phase.
///
/// `first` and `second` persist the two updated records, in that order.
/// `restore_first` re-persists the first record's pre-update snapshot and
/// is invoked only when `second` fails. The caller captures the snapshot
/// before mutating anything, so restoration is a plain overwrite rather
/// than an in-memory reverse calculation.
///
/// The driver never retries. Each closure runs at most once and the
/// outcome reports exactly which writes took effect.
pub fn commit_pair<F, S, R>(first: F, second: S, restore_first: R) -> PairedOutcome
where
    F: FnOnce() -> Result<(), RepositoryError>,
    S: FnOnce() -> Result<(), RepositoryError>,
    R: FnOnce() -> Result<(), RepositoryError>,
{
    if let Err(err) = first() {
        tracing::debug!(phase = %CommitPhase::Validated, error = %err, "first write failed; nothing durable changed");
        return PairedOutcome::FirstWriteFailed(err);
    }
    tracing::trace!(phase = %CommitPhase::FirstWritten, "first record persisted");

    match second() {
        Ok(()) => {
            tracing::trace!(phase = %CommitPhase::Committed, "second record persisted");
            PairedOutcome::Committed
        }
        Err(write_error) => match restore_first() {
            Ok(()) => {
                tracing::debug!(
                    phase = %CommitPhase::Restored,
                    error = %write_error,
                    "second write failed; first record restored from snapshot"
                );
                PairedOutcome::RolledBack { write_error }
            }
            Err(rollback_error) => {
                tracing::error!(
                    phase = %CommitPhase::Inconsistent,
                    write_error = %write_error,
                    rollback_error = %rollback_error,
                    "compensating write failed; store holds a half-applied movement"
                );
                PairedOutcome::RollbackFailed {
                    write_error,
                    rollback_error,
                }
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;
    use std::cell::RefCell;

    fn injected(msg: &str) -> RepositoryError {
        RepositoryError::Store(StoreError::Io(std::io::Error::other(msg.to_string())))
    }

    #[test]
    fn happy_path_commits_without_touching_restore() {
        let calls = RefCell::new(Vec::new());
        let outcome = commit_pair(
            || {
                calls.borrow_mut().push("first");
                Ok(())
            },
            || {
                calls.borrow_mut().push("second");
                Ok(())
            },
            || {
                calls.borrow_mut().push("restore");
                Ok(())
            },
        );
        assert!(matches!(outcome, PairedOutcome::Committed));
        assert_eq!(outcome.phase(), CommitPhase::Committed);
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn first_failure_aborts_before_second() {
        let calls = RefCell::new(Vec::new());
        let outcome = commit_pair(
            || {
                calls.borrow_mut().push("first");
                Err(injected("disk full"))
            },
            || {
                calls.borrow_mut().push("second");
                Ok(())
            },
            || {
                calls.borrow_mut().push("restore");
                Ok(())
            },
        );
        match outcome {
            PairedOutcome::FirstWriteFailed(err) => {
                assert!(err.to_string().contains("disk full"));
            }
            other => panic!("expected FirstWriteFailed, got {:?}", other),
        }
        assert_eq!(*calls.borrow(), vec!["first"]);
    }

    #[test]
    fn second_failure_triggers_restore() {
        let calls = RefCell::new(Vec::new());
        let outcome = commit_pair(
            || {
                calls.borrow_mut().push("first");
                Ok(())
            },
            || {
                calls.borrow_mut().push("second");
                Err(injected("write rejected"))
            },
            || {
                calls.borrow_mut().push("restore");
                Ok(())
            },
        );
        match &outcome {
            PairedOutcome::RolledBack { write_error } => {
                assert!(write_error.to_string().contains("write rejected"));
            }
            other => panic!("expected RolledBack, got {:?}", other),
        }
        assert_eq!(outcome.phase(), CommitPhase::Restored);
        assert_eq!(*calls.borrow(), vec!["first", "second", "restore"]);
    }

    #[test]
    fn restore_failure_reports_both_errors() {
        let outcome = commit_pair(
            || Ok(()),
            || Err(injected("second down")),
            || Err(injected("restore down")),
        );
        match &outcome {
            PairedOutcome::RollbackFailed {
                write_error,
                rollback_error,
            } => {
                assert!(write_error.to_string().contains("second down"));
                assert!(rollback_error.to_string().contains("restore down"));
            }
            other => panic!("expected RollbackFailed, got {:?}", other),
        }
        assert_eq!(outcome.phase(), CommitPhase::Inconsistent);
    }

    #[test]
    fn phases_render_for_logging() {
        assert_eq!(CommitPhase::Validated.to_string(), "validated");
        assert_eq!(CommitPhase::FirstWritten.to_string(), "first-written");
        assert_eq!(CommitPhase::Inconsistent.to_string(), "inconsistent");
    }
}
