use crate::{executor::MutationError, store::StoreFault, validate::ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
///
/// Engine-internal error facade. Exactly one of these terminates an
/// invocation; the boundary rendering into [`Failure`] happens once, at the
/// orchestrator.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Store(#[from] StoreFault),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}

///
/// Failure
///
/// The single user-facing error surfaced to the caller: one message,
/// optionally the offending field name and a fixed error-code string.
/// Internal classifications never leak past this point.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Failure {
    pub message: String,
    pub field: Option<String>,
    pub code: Option<String>,
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(v) => Self {
                message: v.message.clone(),
                field: Some(v.field.to_string()),
                code: Some(v.code.to_string()),
            },
            Error::Mutation(m) => Self {
                message: m.to_string(),
                field: None,
                code: Some(m.code().to_string()),
            },
            // Lower-level faults are fatal for the invocation and reported
            // generically; their detail stays inside the engine.
            Error::Store(_) | Error::Invariant(_) => Self {
                message: "record operation failed".to_string(),
                field: None,
                code: None,
            },
        }
    }
}
