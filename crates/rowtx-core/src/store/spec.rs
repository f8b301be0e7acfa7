use crate::{store::key::RecordKey, store::row::Row, value::Value};

///
/// ReadSpec
///
/// A table-scoped read: the named index to drive it, a key covering a
/// prefix of that index's fields, an optional match predicate narrowing
/// the scan further, and an optional projection of fields to materialize
/// into visited snapshots.
///

#[derive(Clone, Debug)]
pub struct ReadSpec {
    pub table: &'static str,
    pub index: &'static str,
    pub key: RecordKey,
    pub predicate: Option<Predicate>,
    pub projection: Option<&'static [&'static str]>,
}

impl ReadSpec {
    #[must_use]
    pub const fn new(table: &'static str, index: &'static str) -> Self {
        Self {
            table,
            index,
            key: RecordKey::new(),
            predicate: None,
            projection: None,
        }
    }

    #[must_use]
    pub fn key(mut self, key: RecordKey) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn project(mut self, fields: &'static [&'static str]) -> Self {
        self.projection = Some(fields);
        self
    }

    pub(crate) fn matches(&self, row: &Row) -> bool {
        self.predicate.as_ref().is_none_or(|p| p.matches(row))
    }
}

///
/// ProbeSpec
///
/// A read-only existence check: exact-match key on a named index. Never
/// locks and never materializes a row.
///

#[derive(Clone, Debug)]
pub struct ProbeSpec {
    pub table: &'static str,
    pub index: &'static str,
    pub key: RecordKey,
}

impl ProbeSpec {
    #[must_use]
    pub const fn new(table: &'static str, index: &'static str) -> Self {
        Self {
            table,
            index,
            key: RecordKey::new(),
        }
    }

    #[must_use]
    pub fn key(mut self, key: RecordKey) -> Self {
        self.key = key;
        self
    }
}

///
/// Predicate
///
/// Row-level match condition applied after index positioning. Equality is
/// the only comparison the mutation pipeline needs.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    Eq { field: &'static str, value: Value },
}

impl Predicate {
    #[must_use]
    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self::Eq {
            field,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq { field, value } => row.get(field) == Some(value),
        }
    }
}
