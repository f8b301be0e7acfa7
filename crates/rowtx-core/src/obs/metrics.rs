use crate::obs::sink::ExecEvent;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

thread_local! {
    static STATE: RefCell<Counters> = RefCell::new(Counters::default());
}

///
/// Counters
///
/// Ephemeral, in-memory operation counters, overall and per table.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Counters {
    pub tx_calls: u64,
    pub tx_failures: u64,
    pub validation_failures: u64,
    pub reference_misses: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub lock_retries: u64,
    pub lock_exhaustions: u64,
    pub tables: BTreeMap<String, TableCounters>,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub lock_retries: u64,
    pub lock_exhaustions: u64,
}

impl Counters {
    fn table(&mut self, name: &str) -> &mut TableCounters {
        self.tables.entry(name.to_string()).or_default()
    }

    pub(crate) fn apply(&mut self, event: ExecEvent) {
        match event {
            ExecEvent::TxStart { .. } => {
                self.tx_calls = self.tx_calls.saturating_add(1);
            }
            ExecEvent::TxFinish { ok, .. } => {
                if !ok {
                    self.tx_failures = self.tx_failures.saturating_add(1);
                }
            }
            ExecEvent::ValidationFailed { .. } => {
                self.validation_failures = self.validation_failures.saturating_add(1);
            }
            ExecEvent::ReferenceMiss { .. } => {
                self.reference_misses = self.reference_misses.saturating_add(1);
            }
            ExecEvent::LockRetry { table, .. } => {
                self.lock_retries = self.lock_retries.saturating_add(1);
                let entry = self.table(table);
                entry.lock_retries = entry.lock_retries.saturating_add(1);
            }
            ExecEvent::LockExhausted { table, .. } => {
                self.lock_exhaustions = self.lock_exhaustions.saturating_add(1);
                let entry = self.table(table);
                entry.lock_exhaustions = entry.lock_exhaustions.saturating_add(1);
            }
            ExecEvent::RowUpdated { table } => {
                self.rows_updated = self.rows_updated.saturating_add(1);
                let entry = self.table(table);
                entry.rows_updated = entry.rows_updated.saturating_add(1);
            }
            ExecEvent::RowsDeleted { table, rows } => {
                self.rows_deleted = self.rows_deleted.saturating_add(rows);
                let entry = self.table(table);
                entry.rows_deleted = entry.rows_deleted.saturating_add(rows);
            }
        }
    }
}

pub(crate) fn with_state_mut<T>(f: impl FnOnce(&mut Counters) -> T) -> T {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Snapshot this thread's counter state.
#[must_use]
pub fn snapshot() -> Counters {
    STATE.with(|state| state.borrow().clone())
}

/// Reset this thread's counter state.
pub fn reset() {
    STATE.with(|state| *state.borrow_mut() = Counters::default());
}
