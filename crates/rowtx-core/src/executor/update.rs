use crate::{
    error::Error,
    executor::{MutationError, RetryPolicy},
    obs::{self, ExecEvent},
    session::SessionContext,
    store::{ReadSpec, RecordStore, Row},
};

///
/// UpdateExecutor
///
/// Single-row locked update: a unique-index read, the caller's update
/// function computing new business fields, then the bookkeeping stamp —
/// all committed under one row lock before it is released. The stamp
/// happens here so no mutation path can skip it.
///

pub struct UpdateExecutor<'a> {
    store: &'a dyn RecordStore,
    policy: RetryPolicy,
}

impl<'a> UpdateExecutor<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn execute(
        &self,
        session: &SessionContext,
        spec: &ReadSpec,
        apply: &mut dyn FnMut(&Row) -> Row,
    ) -> Result<(), Error> {
        let found = self.policy.run(spec.table, || {
            self.store.update_locked(spec, &mut |row| {
                let mut next = apply(row);
                next.stamp(session.user(), session.date());
                Ok(next)
            })
        })?;

        if found {
            obs::record(ExecEvent::RowUpdated { table: spec.table });
            Ok(())
        } else {
            Err(MutationError::NotFound { table: spec.table }.into())
        }
    }
}
