//! rowtx — validated locked-record mutations over keyed tables.
//!
//! The facade re-exports the runtime surface from `rowtx-core`: build a
//! `Pipeline` over a `RecordStore` and a `SessionContext`, then run a
//! transaction against a `ParamMap` of named string parameters. Success
//! yields a `Reply` of named string results; any failure yields exactly
//! one [`Failure`] carrying a message and an optional field/code pair.

pub use rowtx_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use rowtx_core::{Error, Failure};

///
/// Prelude
///

pub mod prelude {
    pub use rowtx_core::prelude::*;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use rowtx_core::{resolve::DIVISIONS, txn::SALES_LEDGER};
    use time::{Date, Month};

    #[test]
    fn facade_surface_drives_a_full_transaction() {
        let store = MemStore::new();
        store.register(&DIVISIONS).expect("register");
        store.register(&SALES_LEDGER).expect("register");
        store
            .insert(DIVISIONS.name, Row::new().with("CONO", 100).with("DIVI", "DEN"))
            .expect("seed");
        store
            .insert(
                SALES_LEDGER.name,
                Row::new()
                    .with("CONO", 100)
                    .with("DIVI", "DEN")
                    .with("TRDT", 20_231_010)
                    .with("SEQN", 1)
                    .with("VONO", 777),
            )
            .expect("seed");

        let date = Date::from_calendar_date(2023, Month::October, 10).expect("valid date");
        let pipeline = Pipeline::new(&store, SessionContext::new(100, "APIUSR", date))
            .retry(RetryPolicy::new().attempts(3));

        let input = ParamMap::from([("DIVI", "DEN"), ("TRDT", "20231010"), ("VONO", "777")]);
        let reply = pipeline.run(&VoucherDelete, &input).expect("delete succeeds");

        assert_eq!(reply.get("NRDE"), Some("1"));
    }
}
