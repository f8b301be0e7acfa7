mod delete;
mod retry;
mod update;

#[cfg(test)]
mod tests;

pub use delete::DeleteExecutor;
pub use retry::RetryPolicy;
pub use update::UpdateExecutor;

use thiserror::Error as ThisError;

///
/// MutationError
///
/// Terminal executor outcomes. `NotFound` is an absent update target;
/// `Lock` is contention that survived the whole retry budget. Neither is
/// retried further by this engine.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MutationError {
    #[error("no matching record (table {table})")]
    NotFound { table: &'static str },

    #[error("could not lock record (table {table})")]
    Lock { table: &'static str, attempts: u32 },
}

impl MutationError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Lock { .. } => "LOCKED",
        }
    }
}
