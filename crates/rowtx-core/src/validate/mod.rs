
use crate::{date, params::ParamMap, session::SessionContext};
use derive_more::Display;
use thiserror::Error as ThisError;
use time::Date;

///
/// ValidationCode
///
/// Fixed error-code strings paired with a field name at the boundary.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ValidationCode {
    #[display("REQUIRED")]
    Required,
    #[display("NOT_NUMERIC")]
    NotNumeric,
    #[display("BAD_DATE")]
    BadDate,
    #[display("UNKNOWN_REF")]
    UnknownReference,
}

///
/// ValidationError
///
/// Bad, missing, or malformed input, or a failed reference check. Always
/// recoverable and reported to the caller; never retried.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn required(field: &'static str, label: &str) -> Self {
        Self {
            field,
            code: ValidationCode::Required,
            message: format!("{label} required"),
        }
    }

    #[must_use]
    pub fn not_numeric(field: &'static str, label: &str) -> Self {
        Self {
            field,
            code: ValidationCode::NotNumeric,
            message: format!("{label} not numeric"),
        }
    }

    #[must_use]
    pub fn bad_date(field: &'static str, label: &str) -> Self {
        Self {
            field,
            code: ValidationCode::BadDate,
            message: format!("{label} not a valid date"),
        }
    }

    #[must_use]
    pub fn unknown_reference(field: &'static str, label: &str, value: &str) -> Self {
        Self {
            field,
            code: ValidationCode::UnknownReference,
            message: format!("{label} {value} does not exist"),
        }
    }
}

///
/// Checked
///
/// Field-by-field input checker. Each check short-circuits within its own
/// field (a blank mandatory number reports `required`, never a parse
/// failure) but never stops the walk: every independent field is checked
/// and every error collected, in declaration order. The caller surfaces
/// only the first.
///

pub struct Checked<'a> {
    params: &'a ParamMap,
    errors: Vec<ValidationError>,
}

impl<'a> Checked<'a> {
    #[must_use]
    pub const fn new(params: &'a ParamMap) -> Self {
        Self {
            params,
            errors: Vec::new(),
        }
    }

    /// Company id: blank defaults to the session company, otherwise must
    /// parse as an integer.
    pub fn company(&mut self, field: &'static str, session: &SessionContext) -> Option<i64> {
        let raw = self.params.trimmed(field);
        if raw.is_empty() {
            return Some(session.company());
        }
        match raw.parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => self.fail(ValidationError::not_numeric(field, "company")),
        }
    }

    /// Mandatory non-blank string, trimmed.
    pub fn required_text(&mut self, field: &'static str, label: &str) -> Option<String> {
        let raw = self.params.trimmed(field);
        if raw.is_empty() {
            return self.fail(ValidationError::required(field, label));
        }
        Some(raw.to_string())
    }

    /// Mandatory integer. Blank short-circuits to `required`; the parse is
    /// never attempted on a blank value.
    pub fn required_int(&mut self, field: &'static str, label: &str) -> Option<i64> {
        let raw = self.params.trimmed(field);
        if raw.is_empty() {
            return self.fail(ValidationError::required(field, label));
        }
        match raw.parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => self.fail(ValidationError::not_numeric(field, label)),
        }
    }

    /// Mandatory 8-digit `yyyyMMdd` calendar date.
    pub fn required_date(&mut self, field: &'static str, label: &str) -> Option<Date> {
        let raw = self.params.trimmed(field);
        if raw.is_empty() {
            return self.fail(ValidationError::required(field, label));
        }
        match date::parse_yyyymmdd(raw) {
            Some(parsed) => Some(parsed),
            None => self.fail(ValidationError::bad_date(field, label)),
        }
    }

    /// Optional trimmed string; `None` when blank. Referential validity of
    /// present values is the resolver's concern, not a local check.
    #[must_use]
    pub fn optional_text(&self, field: &str) -> Option<String> {
        let raw = self.params.trimmed(field);
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }

    fn fail<T>(&mut self, error: ValidationError) -> Option<T> {
        self.errors.push(error);
        None
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Terminal check: `Err` with the first collected error, if any.
    pub fn finish(self) -> Result<(), ValidationError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }
}
