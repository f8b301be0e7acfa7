use crate::{
    error::Error,
    executor::RetryPolicy,
    obs::{self, ExecEvent},
    store::{ReadSpec, RecordStore, RowDirective},
};

///
/// DeleteExecutor
///
/// Predicate-scoped multi-row delete: every row matching the spec is
/// locked, deleted, and unlocked in turn. Zero matches is success with
/// count 0. Rows deleted before a contention retry stay deleted; the
/// re-entered scan no longer sees them, so the running count stays exact.
///

pub struct DeleteExecutor<'a> {
    store: &'a dyn RecordStore,
    policy: RetryPolicy,
}

impl<'a> DeleteExecutor<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn execute(&self, spec: &ReadSpec) -> Result<u64, Error> {
        let mut deleted: u64 = 0;

        self.policy.run(spec.table, || {
            self.store.visit_locked(spec, &mut |_row| {
                deleted += 1;
                RowDirective::Delete
            })
        })?;

        obs::record(ExecEvent::RowsDeleted {
            table: spec.table,
            rows: deleted,
        });
        Ok(deleted)
    }
}
