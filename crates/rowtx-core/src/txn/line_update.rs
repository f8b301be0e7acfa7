use crate::{
    error::Error,
    params::{ParamMap, Reply},
    resolve::Resolver,
    session::SessionContext,
    store::{IndexDef, ReadSpec, RecordKey, TableDef},
    txn::{Exec, Transaction},
    validate::Checked,
};

/// Order lines, uniquely keyed by company, warehouse, order, delivery,
/// line number, and line suffix.
pub static ORDER_LINES: TableDef = TableDef {
    name: "order_lines",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "WHLO", "ORNO", "DLIX", "PONR", "POSX"],
        unique: true,
    }],
};

/// Operation classifier carried on each line.
pub const FIELD_OPERATION_CODE: &str = "BOPC";
/// Code-table category the classifier values live under.
pub const OPERATION_CODE_CATEGORY: &str = "BOPC";

///
/// LineOperationUpdate
///
/// Update the operation classifier of one order line under lock. A blank
/// input code clears the stored classifier; a present one must exist in
/// the code table before the lock is ever attempted.
///

pub struct LineOperationUpdate;

pub struct LineOperationRequest {
    pub company: i64,
    pub division: String,
    pub order: String,
    pub delivery: i64,
    pub line: i64,
    pub suffix: String,
    pub warehouse: String,
    pub operation_code: Option<String>,
}

impl Transaction for LineOperationUpdate {
    const NAME: &'static str = "line_operation_update";
    type Request = LineOperationRequest;

    fn validate(
        &self,
        session: &SessionContext,
        input: &ParamMap,
    ) -> Result<Self::Request, Error> {
        let mut checked = Checked::new(input);

        let company = checked.company("CONO", session);
        let division = checked.required_text("DIVI", "division");
        let order = checked.required_text("ORNO", "order number");
        let delivery = checked.required_int("DLIX", "delivery number");
        let line = checked.required_int("PONR", "line number");
        let suffix = checked.required_text("POSX", "line suffix");
        let warehouse = checked.required_text("WHLO", "warehouse");
        let operation_code = checked.optional_text("BOPC");

        checked.finish()?;
        let (
            Some(company),
            Some(division),
            Some(order),
            Some(delivery),
            Some(line),
            Some(suffix),
            Some(warehouse),
        ) = (company, division, order, delivery, line, suffix, warehouse)
        else {
            return Err(Error::invariant("validation passed with missing fields"));
        };

        Ok(LineOperationRequest {
            company,
            division,
            order,
            delivery,
            line,
            suffix,
            warehouse,
            operation_code,
        })
    }

    fn resolve(&self, resolver: &Resolver<'_>, request: &Self::Request) -> Result<(), Error> {
        resolver.require_division(request.company, &request.division)?;
        resolver.require_warehouse(request.company, &request.warehouse)?;

        if let Some(code) = &request.operation_code {
            resolver.require_code(
                request.company,
                OPERATION_CODE_CATEGORY,
                "BOPC",
                "operation code",
                code,
            )?;
        }

        Ok(())
    }

    fn execute(&self, exec: &Exec<'_>, request: &Self::Request) -> Result<Reply, Error> {
        let spec = ReadSpec::new(ORDER_LINES.name, "K1").key(
            RecordKey::new()
                .field(request.company)
                .field(request.warehouse.as_str())
                .field(request.order.as_str())
                .field(request.delivery)
                .field(request.line)
                .field(request.suffix.as_str()),
        );

        let code = request.operation_code.clone();
        exec.update().execute(exec.session(), &spec, &mut |row| {
            let mut next = row.clone();
            next.set(FIELD_OPERATION_CODE, code.as_deref().unwrap_or(""));
            next
        })?;

        Ok(Reply::new())
    }
}
