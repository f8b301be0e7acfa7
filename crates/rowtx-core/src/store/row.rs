use crate::{date, value::Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

/// Bookkeeping field: last-modified date, `yyyyMMdd` integer form.
pub const FIELD_MODIFIED_DATE: &str = "LMDT";
/// Bookkeeping field: change sequence number.
pub const FIELD_CHANGE_SEQ: &str = "CHNO";
/// Bookkeeping field: last-modified-by user id.
pub const FIELD_MODIFIED_BY: &str = "CHID";

///
/// Row
///
/// The mutable unit under lock: a map of field id to value. Business fields
/// vary per table; the three bookkeeping fields above only ever move
/// together with a business mutation, via [`Row::stamp`].
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Row {
    fields: BTreeMap<String, Value>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_int)
    }

    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// Materialize only the named fields (absent fields are skipped).
    #[must_use]
    pub fn project(&self, fields: &[&str]) -> Self {
        let mut out = Self::new();
        for field in fields {
            if let Some(value) = self.fields.get(*field) {
                out.fields.insert((*field).to_string(), value.clone());
            }
        }
        out
    }

    /// Advance the bookkeeping fields for one committed mutation: modified
    /// date and user from the session, change sequence incremented by one.
    pub fn stamp(&mut self, user: &str, on: Date) {
        let seq = self.int(FIELD_CHANGE_SEQ).unwrap_or(0);
        self.set(FIELD_MODIFIED_DATE, date::as_number(on));
        self.set(FIELD_CHANGE_SEQ, seq + 1);
        self.set(FIELD_MODIFIED_BY, user);
    }

    #[must_use]
    pub fn change_seq(&self) -> i64 {
        self.int(FIELD_CHANGE_SEQ).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    fn day(y: i32, m: Month, d: u8) -> Date {
        Date::from_calendar_date(y, m, d).expect("valid date")
    }

    #[test]
    fn stamp_moves_all_bookkeeping_fields_together() {
        let mut row = Row::new().with("BOPC", "X1");
        assert_eq!(row.change_seq(), 0);

        row.stamp("TESTUSR", day(2023, Month::October, 10));

        assert_eq!(row.int(FIELD_MODIFIED_DATE), Some(20_231_010));
        assert_eq!(row.int(FIELD_CHANGE_SEQ), Some(1));
        assert_eq!(row.text(FIELD_MODIFIED_BY), Some("TESTUSR"));

        row.stamp("OTHERUSR", day(2023, Month::October, 11));
        assert_eq!(row.int(FIELD_CHANGE_SEQ), Some(2));
        assert_eq!(row.text(FIELD_MODIFIED_BY), Some("OTHERUSR"));
    }

    #[test]
    fn projection_keeps_only_named_fields() {
        let row = Row::new().with("VONO", 12_345).with("AMNT", 99).with("DIVI", "DEN");
        let projected = row.project(&["VONO", "DIVI", "MISSING"]);

        assert_eq!(projected.int("VONO"), Some(12_345));
        assert_eq!(projected.text("DIVI"), Some("DEN"));
        assert_eq!(projected.get("AMNT"), None);
        assert_eq!(projected.get("MISSING"), None);
    }
}
