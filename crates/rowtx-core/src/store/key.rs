use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// RecordKey
///
/// Ordered tuple of typed field values addressing a row (full key on a
/// unique index) or a row set (prefix of an index's fields). Ordering is
/// lexicographic over the tuple, so all keys sharing a prefix form one
/// contiguous range in a sorted index.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RecordKey(Vec<Value>);

impl RecordKey {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append one key field, in index order.
    #[must_use]
    pub fn field(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl From<Vec<Value>> for RecordKey {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_keys_sort_contiguously() {
        let prefix = RecordKey::new().field(100).field("DEN");
        let inside_a = RecordKey::new().field(100).field("DEN").field(1);
        let inside_b = RecordKey::new().field(100).field("DEN").field(2);
        let outside = RecordKey::new().field(100).field("STO").field(1);

        assert!(inside_a.starts_with(&prefix));
        assert!(inside_b.starts_with(&prefix));
        assert!(!outside.starts_with(&prefix));

        let mut keys = vec![outside.clone(), inside_b.clone(), prefix.clone(), inside_a.clone()];
        keys.sort();
        assert_eq!(keys, vec![prefix, inside_a, inside_b, outside]);
    }

    #[test]
    fn display_joins_fields() {
        let key = RecordKey::new().field(100).field("DEN").field(20_231_010);
        assert_eq!(key.to_string(), "100/DEN/20231010");
    }
}
