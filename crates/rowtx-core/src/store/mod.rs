pub mod key;
pub mod memory;
pub mod row;
pub mod spec;
pub mod table;


pub use key::RecordKey;
pub use memory::MemStore;
pub use row::Row;
pub use spec::{Predicate, ProbeSpec, ReadSpec};
pub use table::{IndexDef, TableDef};

use thiserror::Error as ThisError;

///
/// StoreFault
///
/// Lower-level storage failure: a malformed read (unknown table or index,
/// key not fitting the index), poisoned engine state, or an I/O-level
/// error. Fatal for the current invocation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreFault {
    #[error("unknown table: {table}")]
    UnknownTable { table: String },

    #[error("unknown index {index} (table {table})")]
    UnknownIndex { table: String, index: String },

    #[error("index {index} does not address single rows (table {table})")]
    IndexNotUnique { table: String, index: String },

    #[error("key has {got} fields, index {index} carries {expected} (table {table})")]
    KeyArity {
        table: String,
        index: String,
        expected: usize,
        got: usize,
    },

    #[error("row is missing index field {field} (table {table}, index {index})")]
    MissingIndexField {
        table: String,
        index: String,
        field: String,
    },

    #[error("duplicate key {key} (table {table}, index {index})")]
    DuplicateKey {
        table: String,
        index: String,
        key: String,
    },

    #[error("update moved the primary key of {key} (table {table})")]
    PrimaryKeyMutation { table: String, key: String },

    #[error("store corruption: {message}")]
    Corrupt { message: String },

    #[error("store state poisoned")]
    Poisoned,

    #[error("storage failure: {message}")]
    Io { message: String },
}

impl StoreFault {
    pub(crate) fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }
}

///
/// StoreError
///
/// Surface of a single locked store call. `Busy` reports one failed lock
/// attempt against a row held elsewhere; the executor owns the retry
/// budget, so `Busy` never reaches a caller of the engine.
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("row {key} is locked by another holder (table {table})")]
    Busy { table: &'static str, key: RecordKey },

    #[error(transparent)]
    Fault(#[from] StoreFault),
}

///
/// RowDirective
///
/// Per-row decision returned by a locked-visit callback: keep the row and
/// move on, or delete it before moving on.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowDirective {
    Continue,
    Delete,
}

/// Update callback: maps the current row to its replacement. Runs with the
/// row's exclusive lock held; an `Err` aborts the write and releases the
/// lock with the row unchanged.
pub type UpdateFn<'a> = &'a mut dyn FnMut(&Row) -> Result<Row, StoreFault>;

/// Visit callback for locked scans; invoked once per matched row, lock held.
pub type VisitFn<'a> = &'a mut dyn FnMut(&Row) -> RowDirective;

///
/// RecordStore
///
/// The backing store contract. A store owns row storage, named indexes,
/// and the row-lock manager; lock acquisition is try-only and a lost
/// attempt surfaces as [`StoreError::Busy`]. A lock taken for one call is
/// always released before that call returns, commit or abort.
///

pub trait RecordStore: Send + Sync {
    /// Read-only existence probe: exact-match key on a named index.
    fn probe(&self, spec: &ProbeSpec) -> Result<bool, StoreFault>;

    /// Single-row locked read-update. The spec's index must be unique and
    /// fully keyed. Returns `Ok(false)` when no row matches; the callback
    /// then never ran and nothing was locked.
    fn update_locked(&self, spec: &ReadSpec, apply: UpdateFn<'_>) -> Result<bool, StoreError>;

    /// Locked visit over every row matching the spec's key prefix and
    /// predicate. Each row is locked, passed to the callback, deleted when
    /// directed, and unlocked before the scan advances; rows deleted before
    /// a `Busy` stay deleted.
    fn visit_locked(&self, spec: &ReadSpec, visit: VisitFn<'_>) -> Result<(), StoreError>;
}
