//! The ledger operation engine: validation, integral arithmetic, and
//! persistence for every state-changing and read-only operation.
//!
//! [`Ledger`] owns a [`LedgerRepository`] and exposes one method per
//! operation. Mutations always read through strict accessors (a missing
//! record aborts the operation); the public read accessors honor the
//! configured [`ReadMode`]. All integral arithmetic is checked, and every
//! balance rule is enforced before the first byte is written.

use thiserror::Error;

use crate::config;
use crate::ledger::compensation::{self, PairedOutcome};
use crate::record::{AccountKind, Root, Transaction, TransactionBuilder, User};
use crate::storage::{Entity, LedgerRepository, RepositoryError, StateStore};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ledger operations and by the dispatch layer.
///
/// Each variant carries enough context to log and to map onto a wire
/// code; [`LedgerError::class`] gives the coarse family.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The invocation named a function the ledger does not implement.
    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    /// The invocation carried the wrong number of arguments.
    #[error("incorrect number of arguments for {function:?}: expecting {expected}, got {actual}")]
    WrongArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// An amount argument did not parse as a base-10 signed integer.
    #[error("expecting integer value, got {0:?}")]
    MalformedAmount(String),

    /// A negative amount reached an operation that requires a
    /// non-negative one.
    #[error("integral amount must not be negative, got {0}")]
    NegativeAmount(i64),

    /// Applying the amount would overflow the 64-bit integral range.
    #[error("integral arithmetic overflowed the 64-bit range")]
    AmountOverflow,

    /// `createUser` targeted an id that already holds an account.
    #[error("user {0:?} already exists")]
    UserExists(String),

    /// A record the operation requires does not exist.
    #[error("{entity} {id:?} not found")]
    NotFound { entity: Entity, id: String },

    /// A transfer named the same account as sender and recipient.
    #[error("sender and recipient must differ: both are {account:?}")]
    SelfTransfer { account: String },

    /// The paying account does not hold enough integral.
    #[error("insufficient integral on {account:?}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: String,
        available: i64,
        requested: i64,
    },

    /// The backing store failed. Nothing half-applied remains.
    #[error("storage failure: {0}")]
    Storage(RepositoryError),

    /// A movement's second write failed and so did the compensating
    /// write. The named account keeps its updated value with no matching
    /// counterpart; operator intervention is required.
    #[error("account {account:?} may be inconsistent: write failed ({write_error}), compensation failed ({rollback_error})")]
    RollbackFailed {
        account: String,
        write_error: RepositoryError,
        rollback_error: RepositoryError,
    },
}

/// `NotFound` survives as its own family; every other repository failure
/// is a storage fault. A derived conversion would fold the distinction
/// away, so this one is written out.
impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            other => LedgerError::Storage(other),
        }
    }
}

/// Coarse family of a [`LedgerError`], for wire-code and metric-label
/// mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something malformed or unservable.
    InvalidArgument,
    /// A required record does not exist.
    NotFound,
    /// The paying account cannot cover the requested amount.
    InsufficientFunds,
    /// The backing store failed with nothing half-applied.
    Storage,
    /// Compensation failed; the store may hold a half-applied movement.
    RollbackFailed,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorClass::InvalidArgument => "invalid-argument",
            ErrorClass::NotFound => "not-found",
            ErrorClass::InsufficientFunds => "insufficient-funds",
            ErrorClass::Storage => "storage",
            ErrorClass::RollbackFailed => "rollback-failed",
        };
        write!(f, "{}", s)
    }
}

impl LedgerError {
    /// The error family this variant belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::UnknownFunction(_)
            | LedgerError::WrongArgumentCount { .. }
            | LedgerError::MalformedAmount(_)
            | LedgerError::NegativeAmount(_)
            | LedgerError::AmountOverflow
            | LedgerError::UserExists(_)
            | LedgerError::SelfTransfer { .. } => ErrorClass::InvalidArgument,
            LedgerError::NotFound { .. } => ErrorClass::NotFound,
            LedgerError::InsufficientFunds { .. } => ErrorClass::InsufficientFunds,
            LedgerError::Storage(_) => ErrorClass::Storage,
            LedgerError::RollbackFailed { .. } => ErrorClass::RollbackFailed,
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// ---------------------------------------------------------------------------
// Amount parsing
// ---------------------------------------------------------------------------

/// Parses an integral amount as the wire protocol delivers it: a base-10
/// signed integer with no surrounding whitespace.
///
/// Sign handling stays with the individual operations. Issuance and
/// movements reject negatives; initialization accepts any integer.
pub fn parse_integral(input: &str) -> LedgerResult<i64> {
    input
        .parse::<i64>()
        .map_err(|_| LedgerError::MalformedAmount(input.to_string()))
}

// ---------------------------------------------------------------------------
// Read modes
// ---------------------------------------------------------------------------

/// How the public read accessors treat an absent record.
///
/// Mutating operations are unaffected; they always require the records
/// they touch to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// An absent record is a `NotFound` error.
    #[default]
    Strict,
    /// An absent record decodes as its zero value, matching what legacy
    /// clients were built against. Only absence is forgiven; decode and
    /// I/O failures still surface.
    Lenient,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The ledger engine. One instance per open store.
///
/// Generic over the backing [`StateStore`] so tests can interpose fault
/// injection between the engine and the bytes.
pub struct Ledger<S> {
    repo: LedgerRepository<S>,
    read_mode: ReadMode,
}

impl<S: StateStore> Ledger<S> {
    /// Creates an engine with [`ReadMode::Strict`] read accessors.
    pub fn new(repo: LedgerRepository<S>) -> Self {
        Self::with_read_mode(repo, ReadMode::Strict)
    }

    /// Creates an engine with the given read mode.
    pub fn with_read_mode(repo: LedgerRepository<S>, read_mode: ReadMode) -> Self {
        Self { repo, read_mode }
    }

    /// The configured read mode.
    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Direct access to the underlying repository.
    pub fn repository(&self) -> &LedgerRepository<S> {
        &self.repo
    }

    // -- mutations ----------------------------------------------------------

    /// Writes the root account with the given name and starting supply.
    ///
    /// Both `TotalIntegral` and `RestIntegral` are set to `total`:
    /// everything issued, nothing yet allocated. Re-running overwrites an
    /// existing root with the new values; there is no idempotence check,
    /// and any integer is accepted, negative included. Both behaviors are
    /// load-bearing for deployments that re-initialize in place.
    pub fn initialize(&self, name: &str, total: i64) -> LedgerResult<Root> {
        let root = Root::new(name, total);
        self.repo.save_root(&root)?;
        tracing::info!(name, total_integral = total, "ledger initialized");
        Ok(root)
    }

    /// Issues additional integral to the root account, raising
    /// `TotalIntegral` and `RestIntegral` by the same amount.
    ///
    /// A single record changes, so a failed write leaves nothing to
    /// compensate.
    pub fn issue(&self, amount: i64) -> LedgerResult<Root> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let mut root = self.repo.load_root()?;
        root.total_integral = root
            .total_integral
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        root.rest_integral = root
            .rest_integral
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        self.repo.save_root(&root)?;
        tracing::info!(
            amount,
            total_integral = root.total_integral,
            rest_integral = root.rest_integral,
            "additional integral issued"
        );
        Ok(root)
    }

    /// Creates a user account with a starting balance.
    ///
    /// The starting balance is minted out of thin air: the root account
    /// is neither consulted nor debited. Ids are unique; creating an
    /// existing user is rejected rather than silently resetting its
    /// balance.
    pub fn create_user(&self, id: &str, name: &str, integral: i64) -> LedgerResult<User> {
        if integral < 0 {
            return Err(LedgerError::NegativeAmount(integral));
        }
        if self.repo.user_exists(id)? {
            return Err(LedgerError::UserExists(id.to_string()));
        }
        let user = User::new(id, name, integral);
        self.repo.save_user(&user)?;
        tracing::info!(user = id, integral, "user account created");
        Ok(user)
    }

    /// Moves integral from the root account to a user.
    ///
    /// The checks, in order:
    ///
    /// 1. **Amount** — must be non-negative.
    /// 2. **Root funds** — `RestIntegral` must cover the amount. This is
    ///    checked before the recipient is loaded, so an underfunded root
    ///    reports `InsufficientFunds` even when the recipient is missing.
    /// 3. **Recipient** — must exist.
    ///
    /// Only then does the paired write run: root first, user second, with
    /// the pre-debit root snapshot as the compensating write. On success
    /// a transaction record is appended under `call_id`.
    ///
    /// `TotalIntegral` is untouched; allocation moves supply, it does not
    /// change it.
    pub fn exchange(&self, call_id: &str, recipient_id: &str, amount: i64) -> LedgerResult<Transaction> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let root = self.repo.load_root()?;
        if root.rest_integral < amount {
            return Err(LedgerError::InsufficientFunds {
                account: root.id.clone(),
                available: root.rest_integral,
                requested: amount,
            });
        }
        let user = self.repo.load_user(recipient_id)?;

        let mut debited = root.clone();
        debited.rest_integral = root
            .rest_integral
            .checked_sub(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let mut credited = user.clone();
        credited.integral = user
            .integral
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.commit_movement(
            &root.id,
            || self.repo.save_root(&debited),
            || self.repo.save_user(&credited),
            || self.repo.save_root(&root),
        )?;
        tracing::info!(
            recipient = recipient_id,
            amount,
            rest_integral = debited.rest_integral,
            "integral exchanged from root"
        );

        let record = TransactionBuilder::new(call_id)
            .origin(AccountKind::Root, root.id)
            .destination(AccountKind::User, recipient_id)
            .integral(amount)
            .build();
        self.append_record(record)
    }

    /// Moves integral from one user to another.
    ///
    /// The checks, in order:
    ///
    /// 1. **Amount** — must be non-negative.
    /// 2. **Distinct accounts** — sender and recipient must differ. A
    ///    self-transfer would re-credit the sender's stale snapshot and
    ///    mint integral.
    /// 3. **Sender** — must exist and cover the amount; funds are checked
    ///    before the recipient is loaded.
    /// 4. **Recipient** — must exist.
    ///
    /// The paired write debits the sender first and credits the recipient
    /// second, with the pre-debit sender snapshot as the compensating
    /// write. On success a transaction record is appended under
    /// `call_id`.
    pub fn transfer(
        &self,
        call_id: &str,
        sender_id: &str,
        recipient_id: &str,
        amount: i64,
    ) -> LedgerResult<Transaction> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }
        if sender_id == recipient_id {
            return Err(LedgerError::SelfTransfer {
                account: sender_id.to_string(),
            });
        }
        let sender = self.repo.load_user(sender_id)?;
        if sender.integral < amount {
            return Err(LedgerError::InsufficientFunds {
                account: sender.id.clone(),
                available: sender.integral,
                requested: amount,
            });
        }
        let recipient = self.repo.load_user(recipient_id)?;

        let mut debited = sender.clone();
        debited.integral = sender
            .integral
            .checked_sub(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let mut credited = recipient.clone();
        credited.integral = recipient
            .integral
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.commit_movement(
            &sender.id,
            || self.repo.save_user(&debited),
            || self.repo.save_user(&credited),
            || self.repo.save_user(&sender),
        )?;
        tracing::info!(
            sender = sender_id,
            recipient = recipient_id,
            amount,
            "integral transferred between users"
        );

        let record = TransactionBuilder::new(call_id)
            .origin(AccountKind::User, sender_id)
            .destination(AccountKind::User, recipient_id)
            .integral(amount)
            .build();
        self.append_record(record)
    }

    // -- reads --------------------------------------------------------------

    /// Reads the root account.
    pub fn get_root(&self) -> LedgerResult<Root> {
        self.read_or_default(self.repo.load_root())
    }

    /// Reads a user account by id.
    pub fn get_user(&self, id: &str) -> LedgerResult<User> {
        self.read_or_default(self.repo.load_user(id))
    }

    /// Reads a transaction record by call id.
    pub fn get_transaction(&self, id: &str) -> LedgerResult<Transaction> {
        self.read_or_default(self.repo.load_transaction(id))
    }

    // -- internals ----------------------------------------------------------

    /// Applies the read mode to a repository load: lenient mode turns an
    /// absent record into its zero value, everything else passes through.
    fn read_or_default<T: Default>(&self, loaded: Result<T, RepositoryError>) -> LedgerResult<T> {
        match loaded {
            Ok(record) => Ok(record),
            Err(RepositoryError::NotFound { .. }) if self.read_mode == ReadMode::Lenient => {
                Ok(T::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Drives a paired balance write and folds the outcome into the
    /// operation's error taxonomy. `debited_account` names the account
    /// whose write lands first; it is the one left damaged if
    /// compensation fails.
    fn commit_movement<F, G, H>(
        &self,
        debited_account: &str,
        first: F,
        second: G,
        restore_first: H,
    ) -> LedgerResult<()>
    where
        F: FnOnce() -> Result<(), RepositoryError>,
        G: FnOnce() -> Result<(), RepositoryError>,
        H: FnOnce() -> Result<(), RepositoryError>,
    {
        match compensation::commit_pair(first, second, restore_first) {
            PairedOutcome::Committed => Ok(()),
            PairedOutcome::FirstWriteFailed(err)
            | PairedOutcome::RolledBack { write_error: err } => Err(LedgerError::Storage(err)),
            PairedOutcome::RollbackFailed {
                write_error,
                rollback_error,
            } => Err(LedgerError::RollbackFailed {
                account: debited_account.to_string(),
                write_error,
                rollback_error,
            }),
        }
    }

    /// Appends the audit record for a committed movement. The balances
    /// are already settled; a failed append surfaces as `Storage` and is
    /// never compensated, since reversing settled balances would
    /// manufacture a second movement.
    fn append_record(&self, record: Transaction) -> LedgerResult<Transaction> {
        if let Err(err) = self.repo.save_transaction(&record) {
            tracing::warn!(
                call_id = %record.id,
                error = %err,
                "transaction record write failed after settled movement"
            );
            return Err(LedgerError::Storage(err));
        }
        tracing::debug!(call_id = %record.id, integral = record.integral, "movement recorded");
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
