use crate::{
    error::Error,
    executor::MutationError,
    obs::{self, ExecEvent},
    store::StoreError,
};
use std::{thread, time::Duration};

///
/// RetryPolicy
///
/// Bounded lock-retry budget. A `Busy` store result is retried up to
/// `attempts` times total, sleeping `backoff` between attempts; the budget
/// exhausting converts into [`MutationError::Lock`]. Faults never retry.
///

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(10);

    #[must_use]
    pub const fn new() -> Self {
        Self {
            attempts: Self::DEFAULT_ATTEMPTS,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }

    /// Total attempts, floored at one.
    #[must_use]
    pub const fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub(crate) fn run<T>(
        &self,
        table: &'static str,
        mut op: impl FnMut() -> Result<T, StoreError>,
    ) -> Result<T, Error> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(StoreError::Busy { .. }) if attempt < self.attempts => {
                    obs::record(ExecEvent::LockRetry { table, attempt });
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                }
                Err(StoreError::Busy { .. }) => {
                    obs::record(ExecEvent::LockExhausted {
                        table,
                        attempts: self.attempts,
                    });
                    return Err(MutationError::Lock {
                        table,
                        attempts: self.attempts,
                    }
                    .into());
                }
                Err(StoreError::Fault(fault)) => return Err(fault.into()),
            }
        }
    }
}
