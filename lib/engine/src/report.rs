//! Diagnostic score artifacts
//!
//! Byproducts of a matching run for auditing: the full per-pair score table,
//! a best-match-only view, and the derived data-mapping table that the
//! downstream value-transformation step consumes. None of these are required
//! for core correctness.

use crate::schema::FieldKey;
use ahash::AHashMap;
use schemamap_providers::DescriptionSet;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::io::Write;

/// One scored pair with the source schema it came from
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreRow {
    pub target_key: FieldKey,
    pub source_key: FieldKey,
    pub source_message: String,
    pub fuzzy: f32,
    pub semantic: f32,
    pub synonym: f32,
    pub llm_score: f32,
    pub final_score: f32,
}

/// The full per-pair score table for one matching run
///
/// Rows are in deterministic order: source schema order, then target field
/// order, then source field order.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: ScoreRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full mapping view: target key -> every scored candidate
    pub fn full_mapping(&self) -> Value {
        let mut map = Map::new();
        for row in &self.rows {
            let entry = json!({
                "source_key": row.source_key,
                "source_message": row.source_message,
                "fuzzy": row.fuzzy,
                "semantic": row.semantic,
                "synonym": row.synonym,
                "llm_score": row.llm_score,
                "final_score": row.final_score,
            });
            match map.get_mut(&row.target_key) {
                Some(Value::Array(list)) => list.push(entry),
                _ => {
                    map.insert(row.target_key.clone(), Value::Array(vec![entry]));
                }
            }
        }
        Value::Object(map)
    }

    /// Best-match view: target key -> the single highest-scoring candidate
    pub fn best_matches(&self) -> AHashMap<&str, &ScoreRow> {
        let mut best: AHashMap<&str, &ScoreRow> = AHashMap::new();
        for row in &self.rows {
            match best.get(row.target_key.as_str()) {
                Some(current) if current.final_score >= row.final_score => {}
                _ => {
                    best.insert(row.target_key.as_str(), row);
                }
            }
        }
        best
    }

    /// Derived mapping table for the downstream transformation step:
    /// `{target_key: {source, source_format, target_format}}`
    pub fn data_mapping(&self, descriptions: &DescriptionSet) -> Value {
        // rebuild in row order so output ordering stays deterministic
        let best = self.best_matches();
        let mut map = Map::new();
        for row in &self.rows {
            if map.contains_key(&row.target_key) {
                continue;
            }
            if let Some(winner) = best.get(row.target_key.as_str()) {
                map.insert(
                    row.target_key.clone(),
                    json!({
                        "source": winner.source_key,
                        "source_format": descriptions.format_for(&winner.source_key),
                        "target_format": descriptions.format_for(&row.target_key),
                    }),
                );
            }
        }
        Value::Object(map)
    }

    /// Write the table as CSV, scores rounded to 4 decimals
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(
            writer,
            "Target Key,Source Key,Source Message,Fuzzy,Semantic,Synonym,LLM Score,Final Score"
        )?;
        for row in &self.rows {
            writeln!(
                writer,
                "{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4}",
                csv_field(&row.target_key),
                csv_field(&row.source_key),
                csv_field(&row.source_message),
                row.fuzzy,
                row.semantic,
                row.synonym,
                row.llm_score,
                row.final_score
            )?;
        }
        Ok(())
    }
}

/// Quote a CSV field when it contains a delimiter or quote
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
