//! Schema inputs for a matching request
//!
//! A schema is the parsed form of one tabular file: an ordered mapping from
//! field key to an example value. Field order matters downstream because
//! ranking tie-breaks on first-seen order, so `SchemaDict` preserves
//! insertion order instead of using a hash map.

use schemamap_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type FieldKey = String;

/// Minimum number of columns a parsed schema must carry
pub const MIN_COLUMNS: usize = 2;

/// One parsed tabular schema: field key -> example value, insertion ordered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDict {
    fields: Vec<(FieldKey, Value)>,
}

impl SchemaDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field; re-inserting an existing key replaces its example
    /// value but keeps the original position
    pub fn insert(&mut self, key: impl Into<FieldKey>, example: Value) {
        let key = key.into();
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = example;
        } else {
            self.fields.push((key, example));
        }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<FieldKey>,
    {
        let mut dict = Self::new();
        for (key, example) in pairs {
            dict.insert(key, example);
        }
        dict
    }

    /// Build from a parsed JSON object, the shape produced by the tabular
    /// parsing collaborator
    pub fn from_json_object(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::MalformedInput("schema must be a JSON object".to_string()))?;
        Ok(Self::from_pairs(
            object.iter().map(|(k, v)| (k.clone(), v.clone())),
        ))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn example(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject schemas the upstream parser should never have produced
    pub fn validate(&self) -> Result<()> {
        if self.fields.len() < MIN_COLUMNS {
            return Err(Error::MalformedInput(format!(
                "schema has {} column(s), at least {} required",
                self.fields.len(),
                MIN_COLUMNS
            )));
        }
        Ok(())
    }
}

/// Caller-supplied provenance for one source schema, passed through verbatim
/// onto every candidate that schema contributes
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SourceInfo {
    pub message: String,
    pub file: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub system: String,
}

impl SourceInfo {
    pub fn new(message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            ..Self::default()
        }
    }
}

/// One source schema with its provenance
#[derive(Debug, Clone)]
pub struct SourceSchema {
    pub info: SourceInfo,
    pub fields: SchemaDict,
}

impl SourceSchema {
    pub fn new(info: SourceInfo, fields: SchemaDict) -> Self {
        Self { info, fields }
    }
}

/// The target schema candidates are ranked against, identified by its
/// caller-supplied message name
#[derive(Debug, Clone)]
pub struct TargetSchema {
    pub message: String,
    pub fields: SchemaDict,
}

impl TargetSchema {
    pub fn new(message: impl Into<String>, fields: SchemaDict) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_preserves_order() {
        let mut dict = SchemaDict::new();
        dict.insert("b", json!(1));
        dict.insert("a", json!(2));
        dict.insert("c", json!(3));
        let keys: Vec<&str> = dict.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut dict = SchemaDict::new();
        dict.insert("a", json!(1));
        dict.insert("b", json!(2));
        dict.insert("a", json!(9));
        let keys: Vec<&str> = dict.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(dict.example("a"), Some(&json!(9)));
    }

    #[test]
    fn test_validate_minimum_columns() {
        let mut dict = SchemaDict::new();
        assert!(dict.validate().is_err());
        dict.insert("only", json!(1));
        assert!(dict.validate().is_err());
        dict.insert("second", json!(2));
        assert!(dict.validate().is_ok());
    }

    #[test]
    fn test_from_json_object() {
        let dict =
            SchemaDict::from_json_object(&json!({"ContainerNumber": "CONT1", "VGM": 24500}))
                .unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.example("VGM"), Some(&json!(24500)));

        assert!(SchemaDict::from_json_object(&json!([1, 2])).is_err());
    }
}
