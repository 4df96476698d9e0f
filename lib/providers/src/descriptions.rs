//! Description-generation capability
//!
//! Every field key being matched gets one short natural-language description
//! (and a machine-oriented format spec) from an external generator, produced
//! in a single batch call before scoring fans out. Unlike the embedding and
//! synonym collaborators this one is fatal: a failed batch aborts the whole
//! matching request, because half the pairs scored with descriptions and
//! half without would not be comparable.

use schemamap_core::{preprocess_key, Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Generated description and expected value format for one field key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescription {
    /// One-line natural-language meaning of the field
    pub description: String,
    /// Machine-oriented value format, carried through untouched for the
    /// downstream transformation step
    pub format: String,
}

/// Descriptions for a batch of field keys
///
/// Lookup falls back to the bare key string when the provider omitted an
/// entry, so every key always has a usable description.
#[derive(Debug, Clone, Default)]
pub struct DescriptionSet {
    entries: AHashMap<String, FieldDescription>,
}

impl DescriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, entry: FieldDescription) {
        self.entries.insert(key.to_string(), entry);
    }

    /// Description text for a key, falling back to the key itself
    pub fn description_for<'a>(&'a self, key: &'a str) -> &'a str {
        match self.entries.get(key) {
            Some(entry) => &entry.description,
            None => key,
        }
    }

    /// Format spec for a key, if the provider produced one
    pub fn format_for(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.format.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Description-generation capability
///
/// One batch call per matching request covering the union of all keys of all
/// schemas being compared. A request-scoped failure here is fatal and must
/// propagate; scoring does not proceed on partial descriptions.
pub trait DescriptionProvider: Send + Sync {
    fn generate(&self, keys: &[String]) -> Result<DescriptionSet>;
}

/// Fallback provider: the description of a key is its preprocessed form
///
/// Keeps the description signal meaningful offline: "ContainerNumber" and
/// "Container No." still produce overlapping enriched texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEchoDescriptions;

impl DescriptionProvider for KeyEchoDescriptions {
    fn generate(&self, keys: &[String]) -> Result<DescriptionSet> {
        let mut set = DescriptionSet::new();
        for key in keys {
            set.insert(
                key,
                FieldDescription {
                    description: preprocess_key(key),
                    format: "string".to_string(),
                },
            );
        }
        Ok(set)
    }
}

/// Map-backed provider for tests and replayed fixtures
#[derive(Debug, Clone, Default)]
pub struct StaticDescriptions {
    entries: AHashMap<String, FieldDescription>,
    fail_with: Option<String>,
}

impl StaticDescriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, description: &str, format: &str) -> Self {
        self.entries.insert(
            key.to_string(),
            FieldDescription {
                description: description.to_string(),
                format: format.to_string(),
            },
        );
        self
    }

    /// Make every `generate` call fail, to exercise the fatal path
    pub fn failing(message: &str) -> Self {
        Self {
            entries: AHashMap::new(),
            fail_with: Some(message.to_string()),
        }
    }
}

impl DescriptionProvider for StaticDescriptions {
    fn generate(&self, keys: &[String]) -> Result<DescriptionSet> {
        if let Some(message) = &self.fail_with {
            return Err(Error::DescriptionGeneration(message.clone()));
        }
        let mut set = DescriptionSet::new();
        for key in keys {
            if let Some(entry) = self.entries.get(key) {
                set.insert(key, entry.clone());
            }
            // omitted keys fall back to the bare key at lookup time
        }
        Ok(set)
    }
}
