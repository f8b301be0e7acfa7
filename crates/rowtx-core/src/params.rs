use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// ParamMap
///
/// The literal input boundary: named string parameters as the transport
/// delivered them. An absent key reads as blank; the engine never
/// distinguishes "missing" from "empty".
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ParamMap(BTreeMap<String, String>);

impl ParamMap {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    /// Raw value for `name`; blank when absent.
    #[must_use]
    pub fn raw(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    /// Trimmed value for `name`; blank when absent.
    #[must_use]
    pub fn trimmed(&self, name: &str) -> &str {
        self.raw(name).trim()
    }

    #[must_use]
    pub fn is_blank(&self, name: &str) -> bool {
        self.trimmed(name).is_empty()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ParamMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut map = Self::new();
        for (name, value) in pairs {
            map.set(name, value);
        }
        map
    }
}

///
/// Reply
///
/// Named string result fields returned on success. A delete reports its
/// affected-row count here; an update succeeds with an empty reply.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Reply(BTreeMap<String, String>);

impl Reply {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_read_as_blank() {
        let params = ParamMap::from([("DIVI", "  DEN ")]);

        assert_eq!(params.raw("CONO"), "");
        assert!(params.is_blank("CONO"));
        assert_eq!(params.trimmed("DIVI"), "DEN");
        assert!(!params.is_blank("DIVI"));
    }

    #[test]
    fn reply_round_trips_named_fields() {
        let mut reply = Reply::new();
        assert!(reply.is_empty());

        reply.set("NRDE", 3.to_string());
        assert_eq!(reply.get("NRDE"), Some("3"));
        assert_eq!(reply.get("XXXX"), None);
    }
}
