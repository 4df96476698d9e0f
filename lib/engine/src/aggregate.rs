//! Cross-source aggregation
//!
//! Each source schema contributes a ranked candidate list per target key;
//! this module merges those lists across all source schemas, keeps the top 3
//! overall per target key, and attaches source provenance. Merging is a
//! plain concatenation - identical field names in different source schemas
//! are legitimately distinct candidates, so there is no deduplication.
//!
//! The final sort is stable and ties break on first-seen order, which makes
//! repeated runs on identical input byte-identical.

use crate::schema::{FieldKey, SourceInfo};
use crate::score::ScoreRecord;
use ahash::AHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Candidates retained per target key
pub const TOP_K: usize = 3;

/// A [`ScoreRecord`] enriched with source provenance and its rank among the
/// surviving candidates for its target key. Built as a pure transformation;
/// the original record is never mutated.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchCandidate {
    pub rank: u8,
    pub final_score: f32,
    pub fuzzy: f32,
    pub semantic: f32,
    pub synonym: f32,
    pub llm_score: f32,
    pub source_key: FieldKey,
    pub source_message: String,
    pub source_file: String,
    pub source_country: String,
    pub source_domain: String,
    pub source_system: String,
}

impl MatchCandidate {
    pub fn from_record(record: &ScoreRecord, info: &SourceInfo, rank: u8) -> Self {
        Self {
            rank,
            final_score: record.final_score,
            fuzzy: record.fuzzy,
            semantic: record.semantic,
            synonym: record.synonym,
            llm_score: record.llm_score,
            source_key: record.source_key.clone(),
            source_message: info.message.clone(),
            source_file: info.file.clone(),
            source_country: info.country.clone(),
            source_domain: info.domain.clone(),
            source_system: info.system.clone(),
        }
    }
}

/// Ranked candidates for one target key
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub target_key: FieldKey,
    pub candidates: Vec<MatchCandidate>,
}

/// The externally visible output for one target schema: target key ->
/// ordered top-3 candidate list, in target field order
///
/// Serializes as a JSON object keyed by target key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingResult {
    entries: Vec<MappingEntry>,
}

impl MappingResult {
    pub fn get(&self, target_key: &str) -> Option<&[MatchCandidate]> {
        self.entries
            .iter()
            .find(|e| e.target_key == target_key)
            .map(|e| e.candidates.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MappingResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.target_key, &entry.candidates)?;
        }
        map.end()
    }
}

/// Per-target candidate lists contributed by one source schema
#[derive(Debug, Clone)]
pub struct SourceCandidates {
    pub info: SourceInfo,
    pub by_target: AHashMap<FieldKey, Vec<ScoreRecord>>,
}

/// Merge per-source results for one target schema
///
/// For every target key, in target field order: concatenate the candidate
/// lists from each source in source order, stable-sort by final score
/// descending, truncate to [`TOP_K`] and tag ranks. A target key no source
/// produced candidates for yields an empty list, not an error.
pub fn merge_across_sources(
    target_keys: &[FieldKey],
    sources: &[SourceCandidates],
) -> MappingResult {
    let mut entries = Vec::with_capacity(target_keys.len());

    for target_key in target_keys {
        let mut pooled: Vec<(&ScoreRecord, &SourceInfo)> = Vec::new();
        for source in sources {
            if let Some(records) = source.by_target.get(target_key) {
                pooled.extend(records.iter().map(|r| (r, &source.info)));
            }
        }

        // stable: ties keep first-seen order
        pooled.sort_by(|(a, _), (b, _)| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pooled.truncate(TOP_K);

        let candidates = pooled
            .iter()
            .enumerate()
            .map(|(i, (record, info))| MatchCandidate::from_record(record, info, i as u8 + 1))
            .collect();

        entries.push(MappingEntry {
            target_key: target_key.clone(),
            candidates,
        });
    }

    MappingResult { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(target: &str, source: &str, final_score: f32) -> ScoreRecord {
        ScoreRecord {
            target_key: target.to_string(),
            source_key: source.to_string(),
            fuzzy: 0.0,
            semantic: 0.0,
            synonym: 0.0,
            llm_score: 0.0,
            final_score,
        }
    }

    fn source(message: &str, records: Vec<ScoreRecord>) -> SourceCandidates {
        let mut by_target: AHashMap<String, Vec<ScoreRecord>> = AHashMap::new();
        for r in records {
            by_target.entry(r.target_key.clone()).or_default().push(r);
        }
        SourceCandidates {
            info: SourceInfo::new(message, format!("{}.csv", message)),
            by_target,
        }
    }

    #[test]
    fn test_top_k_bound_and_order() {
        let a = source(
            "schema_a",
            vec![
                record("t", "a1", 0.2),
                record("t", "a2", 0.9),
                record("t", "a3", 0.5),
            ],
        );
        let b = source(
            "schema_b",
            vec![record("t", "b1", 0.7), record("t", "b2", 0.4)],
        );

        let result = merge_across_sources(&["t".to_string()], &[a, b]);
        let candidates = result.get("t").unwrap();

        assert_eq!(candidates.len(), TOP_K);
        assert_eq!(candidates[0].source_key, "a2");
        assert_eq!(candidates[1].source_key, "b1");
        assert_eq!(candidates[2].source_key, "a3");
        assert_eq!(candidates[0].rank, 1);
        assert_eq!(candidates[2].rank, 3);
        // descending scores
        assert!(candidates[0].final_score >= candidates[1].final_score);
        assert!(candidates[1].final_score >= candidates[2].final_score);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let a = source("schema_a", vec![record("t", "first", 0.5)]);
        let b = source("schema_b", vec![record("t", "second", 0.5)]);

        let result = merge_across_sources(&["t".to_string()], &[a, b]);
        let candidates = result.get("t").unwrap();
        assert_eq!(candidates[0].source_key, "first");
        assert_eq!(candidates[1].source_key, "second");
    }

    #[test]
    fn test_same_key_in_two_sources_not_deduplicated() {
        let a = source("schema_a", vec![record("t", "ContainerNumber", 0.8)]);
        let b = source("schema_b", vec![record("t", "ContainerNumber", 0.7)]);

        let result = merge_across_sources(&["t".to_string()], &[a, b]);
        let candidates = result.get("t").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].source_message, "schema_a");
        assert_eq!(candidates[1].source_message, "schema_b");
    }

    #[test]
    fn test_missing_target_key_yields_empty_list() {
        let a = source("schema_a", vec![record("t", "a1", 0.8)]);
        let result = merge_across_sources(&["t".to_string(), "orphan".to_string()], &[a]);
        assert_eq!(result.get("orphan"), Some(&[] as &[MatchCandidate]));
    }

    #[test]
    fn test_repeated_merge_is_byte_identical() {
        let build = || {
            let a = source(
                "schema_a",
                vec![
                    record("t", "a1", 0.31),
                    record("t", "a2", 0.31),
                    record("u", "a3", 0.9),
                ],
            );
            let b = source("schema_b", vec![record("t", "b1", 0.31)]);
            merge_across_sources(&["t".to_string(), "u".to_string()], &[a, b])
        };

        let first = serde_json::to_string(&build()).unwrap();
        let second = serde_json::to_string(&build()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_provenance_passed_through_verbatim() {
        let mut info = SourceInfo::new("gate_moves", "gate_moves.xlsx");
        info.country = "SG".to_string();
        info.domain = "port".to_string();
        info.system = "TOS".to_string();

        let mut by_target: AHashMap<String, Vec<ScoreRecord>> = AHashMap::new();
        by_target.insert("t".to_string(), vec![record("t", "gateDate", 0.6)]);
        let source = SourceCandidates { info, by_target };

        let result = merge_across_sources(&["t".to_string()], &[source]);
        let candidate = &result.get("t").unwrap()[0];
        assert_eq!(candidate.source_country, "SG");
        assert_eq!(candidate.source_domain, "port");
        assert_eq!(candidate.source_system, "TOS");
        assert_eq!(candidate.source_file, "gate_moves.xlsx");
    }
}
