use crate::{
    error::Error,
    obs::{self, ExecEvent},
    store::{IndexDef, ProbeSpec, RecordKey, RecordStore, StoreFault, TableDef},
    validate::ValidationError,
};

///
/// Auxiliary masters probed before a mutation is attempted. Each is read
/// through its primary index with an exact-match key; no row is ever
/// locked here.
///

pub static DIVISIONS: TableDef = TableDef {
    name: "division_master",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "DIVI"],
        unique: true,
    }],
};

pub static WAREHOUSES: TableDef = TableDef {
    name: "warehouse_master",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "WHLO"],
        unique: true,
    }],
};

/// Generic code-value table: category plus key value, per company.
pub static CODES: TableDef = TableDef {
    name: "code_master",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "STCO", "STKY"],
        unique: true,
    }],
};

///
/// Resolver
///
/// Read-only existence probes against the auxiliary masters. A missing
/// reference is an input problem, so the `require_*` helpers convert it
/// into a `ValidationError` naming the entity and value; only a store
/// fault escalates past validation.
///

pub struct Resolver<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    pub fn division_exists(&self, company: i64, division: &str) -> Result<bool, StoreFault> {
        self.store.probe(
            &ProbeSpec::new(DIVISIONS.name, "K1")
                .key(RecordKey::new().field(company).field(division)),
        )
    }

    pub fn warehouse_exists(&self, company: i64, warehouse: &str) -> Result<bool, StoreFault> {
        self.store.probe(
            &ProbeSpec::new(WAREHOUSES.name, "K1")
                .key(RecordKey::new().field(company).field(warehouse)),
        )
    }

    pub fn code_exists(
        &self,
        company: i64,
        category: &str,
        value: &str,
    ) -> Result<bool, StoreFault> {
        self.store.probe(
            &ProbeSpec::new(CODES.name, "K1")
                .key(RecordKey::new().field(company).field(category).field(value)),
        )
    }

    pub fn require_division(&self, company: i64, division: &str) -> Result<(), Error> {
        if self.division_exists(company, division)? {
            return Ok(());
        }
        obs::record(ExecEvent::ReferenceMiss { entity: "division" });
        Err(ValidationError::unknown_reference("DIVI", "division", division).into())
    }

    pub fn require_warehouse(&self, company: i64, warehouse: &str) -> Result<(), Error> {
        if self.warehouse_exists(company, warehouse)? {
            return Ok(());
        }
        obs::record(ExecEvent::ReferenceMiss { entity: "warehouse" });
        Err(ValidationError::unknown_reference("WHLO", "warehouse", warehouse).into())
    }

    pub fn require_code(
        &self,
        company: i64,
        category: &str,
        field: &'static str,
        label: &str,
        value: &str,
    ) -> Result<(), Error> {
        if self.code_exists(company, category, value)? {
            return Ok(());
        }
        obs::record(ExecEvent::ReferenceMiss { entity: "code" });
        Err(ValidationError::unknown_reference(field, label, value).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::{MemStore, Row},
        validate::ValidationCode,
    };

    fn seeded() -> MemStore {
        let store = MemStore::new();
        store.register(&DIVISIONS).expect("register");
        store.register(&WAREHOUSES).expect("register");
        store.register(&CODES).expect("register");

        store
            .insert(DIVISIONS.name, Row::new().with("CONO", 200).with("DIVI", "DEN"))
            .expect("seed division");
        store
            .insert(WAREHOUSES.name, Row::new().with("CONO", 200).with("WHLO", "WH1"))
            .expect("seed warehouse");
        store
            .insert(
                CODES.name,
                Row::new().with("CONO", 200).with("STCO", "BOPC").with("STKY", "X1"),
            )
            .expect("seed code");
        store
    }

    #[test]
    fn probes_report_existence_without_locking() {
        let store = seeded();
        let resolver = Resolver::new(&store);

        assert!(resolver.division_exists(200, "DEN").expect("probe"));
        assert!(!resolver.division_exists(200, "STO").expect("probe"));
        assert!(!resolver.division_exists(100, "DEN").expect("probe"));

        assert!(resolver.warehouse_exists(200, "WH1").expect("probe"));
        assert!(resolver.code_exists(200, "BOPC", "X1").expect("probe"));
        assert!(!resolver.code_exists(200, "BOPC", "X2").expect("probe"));
    }

    #[test]
    fn missing_reference_becomes_a_validation_error() {
        let store = seeded();
        let resolver = Resolver::new(&store);

        let err = resolver
            .require_warehouse(200, "WH9")
            .expect_err("must fail");
        let Error::Validation(v) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(v.field, "WHLO");
        assert_eq!(v.code, ValidationCode::UnknownReference);
        assert_eq!(v.message, "warehouse WH9 does not exist");
    }
}
