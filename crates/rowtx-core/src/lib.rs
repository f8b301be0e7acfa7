//! Core runtime for rowtx: the validated locked-record mutation pipeline.
//!
//! Raw string parameters come in through [`params::ParamMap`]; the
//! [`validate`] checks and [`resolve`] probes normalize and vet them; the
//! [`executor`] applies locked single-row updates or predicate-scoped
//! multi-row deletes against a [`store::RecordStore`]; the [`txn`]
//! orchestrator sequences the stages and reports exactly one outcome per
//! invocation.

pub mod date;
pub mod error;
pub mod executor;
pub mod obs;
pub mod params;
pub mod resolve;
pub mod session;
pub mod store;
pub mod txn;
pub mod validate;
pub mod value;

pub use error::{Error, Failure};

///
/// Prelude
///
/// Domain vocabulary only; executors, sinks, and store internals stay
/// behind their modules.
///

pub mod prelude {
    pub use crate::{
        error::Failure,
        executor::RetryPolicy,
        params::{ParamMap, Reply},
        session::SessionContext,
        store::{MemStore, RecordKey, RecordStore, Row},
        txn::{LineOperationUpdate, Pipeline, Transaction, VoucherDelete},
        value::Value,
    };
}
