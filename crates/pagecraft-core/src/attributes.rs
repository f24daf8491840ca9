//! Per-node configuration maps.
//!
//! Attributes are plain owned data. Cloning an [`Attributes`] value produces
//! a fully independent copy, so two nodes built from the same defaults can
//! never observe each other's edits.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered `key -> JSON value` configuration for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.0.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Convenience lookup for string-valued keys such as `label`.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Shallow merge: every top-level key in `patch` replaces the existing
    /// value wholesale. Nested objects are not merged.
    ///
    /// Returns the keys whose value actually changed.
    pub fn merge(&mut self, patch: Self) -> Vec<String> {
        let mut changed = Vec::new();
        for (key, value) in patch.0 {
            if self.0.get(&key) != Some(&value) {
                changed.push(key.clone());
            }
            let _ = self.0.insert(key, value);
        }
        changed
    }

    /// Build attributes from a JSON object, as edited in a JSON properties panel.
    pub fn from_json_value(value: Value) -> Result<Self, AttributeError> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(AttributeError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Parse attributes from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, AttributeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| AttributeError::Parse(err.to_string()))?;
        Self::from_json_value(value)
    }

    /// Render as a JSON object value.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors for attribute parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    NotAnObject { found: &'static str },
    Parse(String),
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => {
                write!(f, "attributes must be a JSON object, found {found}")
            }
            Self::Parse(msg) => write!(f, "invalid attributes JSON: {msg}"),
        }
    }
}

impl std::error::Error for AttributeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_nested_objects_wholesale() {
        let mut attrs = Attributes::new()
            .with("label", "Name")
            .with("style", json!({ "bold": true, "size": 12 }));
        let changed = attrs.merge(Attributes::new().with("style", json!({ "size": 14 })));

        assert_eq!(changed, vec!["style".to_string()]);
        assert_eq!(attrs.get("style"), Some(&json!({ "size": 14 })));
        assert_eq!(attrs.get_str("label"), Some("Name"));
    }

    #[test]
    fn merge_reports_only_changed_keys() {
        let mut attrs = Attributes::new().with("required", false);
        let changed = attrs.merge(
            Attributes::new()
                .with("required", false)
                .with("placeholder", "Type here"),
        );
        assert_eq!(changed, vec!["placeholder".to_string()]);
    }

    #[test]
    fn clones_are_independent() {
        let defaults = Attributes::new().with("options", json!(["a"]));
        let mut first = defaults.clone();
        let second = defaults.clone();
        let _ = first.insert("options", json!(["a", "b"]));
        assert_eq!(second.get("options"), Some(&json!(["a"])));
        assert_eq!(defaults.get("options"), Some(&json!(["a"])));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let err = Attributes::from_json_str("[1, 2]").expect_err("array is not an object");
        assert_eq!(err, AttributeError::NotAnObject { found: "array" });
        assert!(matches!(
            Attributes::from_json_str("{oops"),
            Err(AttributeError::Parse(_))
        ));
    }

    #[test]
    fn json_value_round_trip_keeps_keys() {
        let attrs = Attributes::from_json_str(r#"{"label":"Email","required":true}"#)
            .expect("valid object");
        assert_eq!(
            attrs.to_json_value(),
            json!({ "label": "Email", "required": true })
        );
    }
}
