pub mod line_update;
pub mod voucher_delete;


pub use line_update::{LineOperationRequest, LineOperationUpdate, ORDER_LINES};
pub use voucher_delete::{SALES_LEDGER, VoucherDelete, VoucherDeleteRequest};

use crate::{
    error::{Error, Failure},
    executor::{DeleteExecutor, RetryPolicy, UpdateExecutor},
    obs::{self, ExecEvent},
    params::{ParamMap, Reply},
    resolve::Resolver,
    session::SessionContext,
    store::RecordStore,
};

///
/// Transaction
///
/// One named operation over the pipeline: validate raw input into a typed
/// request, resolve its references, then execute the mutation. Stages
/// never call back into the runner; the first failing stage terminates
/// the invocation.
///

pub trait Transaction {
    const NAME: &'static str;
    type Request;

    fn validate(&self, session: &SessionContext, input: &ParamMap)
    -> Result<Self::Request, Error>;

    fn resolve(&self, resolver: &Resolver<'_>, request: &Self::Request) -> Result<(), Error>;

    fn execute(&self, exec: &Exec<'_>, request: &Self::Request) -> Result<Reply, Error>;
}

///
/// Exec
///
/// Execution stage context: the store handle, the session for bookkeeping
/// stamps, and the retry policy the executors run under.
///

pub struct Exec<'a> {
    store: &'a dyn RecordStore,
    session: &'a SessionContext,
    policy: RetryPolicy,
}

impl<'a> Exec<'a> {
    #[must_use]
    pub const fn session(&self) -> &'a SessionContext {
        self.session
    }

    #[must_use]
    pub const fn update(&self) -> UpdateExecutor<'a> {
        UpdateExecutor::new(self.store, self.policy)
    }

    #[must_use]
    pub const fn delete(&self) -> DeleteExecutor<'a> {
        DeleteExecutor::new(self.store, self.policy)
    }
}

///
/// Pipeline
///
/// The orchestrator: injected store and session, configurable lock-retry
/// policy, one terminal outcome per invocation. Validation is never
/// retried here; lock retry lives entirely in the executors.
///

pub struct Pipeline<'a> {
    store: &'a dyn RecordStore,
    session: SessionContext,
    policy: RetryPolicy,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(store: &'a dyn RecordStore, session: SessionContext) -> Self {
        Self {
            store,
            session,
            policy: RetryPolicy::new(),
        }
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one transaction to its single terminal outcome.
    pub fn run<T: Transaction>(&self, tx: &T, input: &ParamMap) -> Result<Reply, Failure> {
        obs::record(ExecEvent::TxStart { name: T::NAME });
        let outcome = self.run_stages(tx, input);
        obs::record(ExecEvent::TxFinish {
            name: T::NAME,
            ok: outcome.is_ok(),
        });

        outcome.map_err(|err| {
            if let Error::Validation(v) = &err {
                obs::record(ExecEvent::ValidationFailed { field: v.field });
            }
            Failure::from(err)
        })
    }

    fn run_stages<T: Transaction>(&self, tx: &T, input: &ParamMap) -> Result<Reply, Error> {
        let request = tx.validate(&self.session, input)?;

        let resolver = Resolver::new(self.store);
        tx.resolve(&resolver, &request)?;

        let exec = Exec {
            store: self.store,
            session: &self.session,
            policy: self.policy,
        };
        tx.execute(&exec, &request)
    }
}
