use crate::{
    date,
    error::Error,
    params::{ParamMap, Reply},
    resolve::Resolver,
    session::SessionContext,
    store::{IndexDef, Predicate, ReadSpec, RecordKey, TableDef},
    txn::{Exec, Transaction},
    validate::Checked,
};
use time::Date;

/// Sales ledger rows, keyed by company, division, transaction date, and a
/// sequence number. Several physical rows may carry the same voucher.
pub static SALES_LEDGER: TableDef = TableDef {
    name: "sales_ledger",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "DIVI", "TRDT", "SEQN"],
        unique: true,
    }],
};

/// Voucher number carried on each ledger row.
pub const FIELD_VOUCHER: &str = "VONO";
/// Reply field: number of deleted rows.
pub const FIELD_DELETED_COUNT: &str = "NRDE";

///
/// VoucherDelete
///
/// Delete every ledger row for a company/division/date whose voucher
/// number matches. Zero matches is a success reporting a zero count.
///

pub struct VoucherDelete;

pub struct VoucherDeleteRequest {
    pub company: i64,
    pub division: String,
    pub date: Date,
    pub voucher: i64,
}

impl Transaction for VoucherDelete {
    const NAME: &'static str = "voucher_delete";
    type Request = VoucherDeleteRequest;

    fn validate(
        &self,
        session: &SessionContext,
        input: &ParamMap,
    ) -> Result<Self::Request, Error> {
        let mut checked = Checked::new(input);

        let company = checked.company("CONO", session);
        let division = checked.required_text("DIVI", "division");
        let date = checked.required_date("TRDT", "transaction date");
        let voucher = checked.required_int("VONO", "voucher number");

        checked.finish()?;
        let (Some(company), Some(division), Some(date), Some(voucher)) =
            (company, division, date, voucher)
        else {
            return Err(Error::invariant("validation passed with missing fields"));
        };

        Ok(VoucherDeleteRequest {
            company,
            division,
            date,
            voucher,
        })
    }

    fn resolve(&self, resolver: &Resolver<'_>, request: &Self::Request) -> Result<(), Error> {
        resolver.require_division(request.company, &request.division)
    }

    fn execute(&self, exec: &Exec<'_>, request: &Self::Request) -> Result<Reply, Error> {
        let spec = ReadSpec::new(SALES_LEDGER.name, "K1")
            .key(
                RecordKey::new()
                    .field(request.company)
                    .field(request.division.as_str())
                    .field(date::as_number(request.date)),
            )
            .filter(Predicate::eq(FIELD_VOUCHER, request.voucher));

        let deleted = exec.delete().execute(&spec)?;

        let mut reply = Reply::new();
        reply.set(FIELD_DELETED_COUNT, deleted.to_string());
        Ok(reply)
    }
}
