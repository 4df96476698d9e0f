//! Pairwise match engine
//!
//! Orchestrates one matching request end to end, in strictly ordered stages:
//!
//! 1. validate schemas and tokenize every key
//! 2. generate descriptions for the union of all keys (fatal on failure)
//! 3. embed every unique token and every enriched text once
//! 4. score all (target key, source key) pairs concurrently on the pool
//! 5. group per target key per source schema
//! 6. merge across source schemas and truncate to the top 3
//!
//! All pair tasks are pure functions of their two keys plus read-only shared
//! caches, so aggregation is order-independent and the final stable sort
//! makes repeated runs on identical input produce identical output.

use crate::aggregate::{merge_across_sources, MappingResult, SourceCandidates};
use crate::pool::{CancelToken, WorkerPool, DEFAULT_WORKERS};
use crate::report::{ScoreRow, ScoreTable};
use crate::schema::{FieldKey, SourceSchema, TargetSchema};
use crate::score::{score_pair, KeyProfile, ScoreRecord};
use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;
use schemamap_core::{EnglishLemmatizer, Error, Lemmatizer, Result, Vector};
use schemamap_providers::{
    CachedSynonyms, DescriptionProvider, DescriptionSet, EmbeddingProvider, HashEmbedder,
    KeyEchoDescriptions, StaticSynonyms, SynonymProvider,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a matching run produces: the ranked mapping, the full score
/// table for diagnostics, and the generated descriptions (formats feed the
/// data-mapping artifact)
#[derive(Debug)]
pub struct MatchOutcome {
    pub mapping: MappingResult,
    pub table: ScoreTable,
    pub descriptions: DescriptionSet,
}

/// Read-only state shared by every pair-scoring task
struct ScoreContext {
    profiles: AHashMap<FieldKey, KeyProfile>,
    token_vectors: AHashMap<String, Vector>,
    text_vectors: AHashMap<String, Vector>,
}

/// The field-matching engine
///
/// Holds the capability providers and the pool size; construction is cheap
/// and the engine is reusable across requests. Caches live inside the
/// providers, not in the engine, so their lifetime is an explicit choice of
/// whoever built the providers.
pub struct MatchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    synonyms: Arc<dyn SynonymProvider>,
    descriptions: Arc<dyn DescriptionProvider>,
    lemmatizer: Arc<dyn Lemmatizer>,
    workers: usize,
}

impl MatchEngine {
    pub fn builder() -> MatchEngineBuilder {
        MatchEngineBuilder::new()
    }

    /// Engine wired with the built-in offline providers: hash embeddings,
    /// the maritime synonym table behind a cache, key-echo descriptions
    pub fn with_defaults() -> Self {
        Self::builder().build()
    }

    pub fn match_schemas(
        &self,
        target: &TargetSchema,
        sources: &[SourceSchema],
    ) -> Result<MatchOutcome> {
        self.match_schemas_with_cancel(target, sources, &CancelToken::new())
    }

    /// Match one target schema against every source schema
    ///
    /// The cancel token is checked between stages and before each pair task;
    /// a cancelled request returns `Error::Cancelled` instead of partial
    /// results.
    pub fn match_schemas_with_cancel(
        &self,
        target: &TargetSchema,
        sources: &[SourceSchema],
        cancel: &CancelToken,
    ) -> Result<MatchOutcome> {
        // stage 1: validate and collect the key union
        target.fields.validate()?;
        if sources.is_empty() {
            return Err(Error::MalformedInput(
                "at least one source schema is required".to_string(),
            ));
        }
        for source in sources {
            source.fields.validate()?;
        }

        let target_keys: Vec<FieldKey> = target.fields.keys().map(str::to_string).collect();
        let key_union = self.key_union(target, sources);
        info!(
            target = %target.message,
            sources = sources.len(),
            keys = key_union.len(),
            "matching request started"
        );

        // stage 2: one description batch for the whole key union; a failure
        // here aborts the request before any scoring happens
        let descriptions = self.descriptions.generate(&key_union)?;
        debug!(generated = descriptions.len(), "descriptions ready");
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // stage 3: profiles and embedding caches, once per unique key/token
        let context = Arc::new(self.build_context(&key_union, &descriptions));
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // stage 4: concurrent pair scoring
        let records = self.score_all_pairs(&target_keys, sources, &context, cancel);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // stage 5 + 6: group per source, merge across sources, truncate
        let (per_source, table) = group_records(sources, records);
        let mapping = merge_across_sources(&target_keys, &per_source);
        info!(
            target = %target.message,
            pairs = table.len(),
            "matching request finished"
        );

        Ok(MatchOutcome {
            mapping,
            table,
            descriptions,
        })
    }

    /// Match several target schemas against the same source schemas; the
    /// result is keyed by each target's message name
    pub fn match_all(
        &self,
        targets: &[TargetSchema],
        sources: &[SourceSchema],
    ) -> Result<Vec<(String, MatchOutcome)>> {
        targets
            .iter()
            .map(|t| Ok((t.message.clone(), self.match_schemas(t, sources)?)))
            .collect()
    }

    /// Ordered de-duplicated union of every key in every schema
    fn key_union(&self, target: &TargetSchema, sources: &[SourceSchema]) -> Vec<FieldKey> {
        let mut seen = AHashSet::new();
        let mut union = Vec::new();
        let all_keys = target
            .fields
            .keys()
            .chain(sources.iter().flat_map(|s| s.fields.keys()));
        for key in all_keys {
            if seen.insert(key.to_string()) {
                union.push(key.to_string());
            }
        }
        union
    }

    fn build_context(&self, key_union: &[FieldKey], descriptions: &DescriptionSet) -> ScoreContext {
        let mut profiles = AHashMap::with_capacity(key_union.len());
        let mut unique_tokens: Vec<String> = Vec::new();
        let mut seen_tokens = AHashSet::new();

        for key in key_union {
            let profile = KeyProfile::build(key, self.lemmatizer.as_ref(), descriptions);
            for token in &profile.tokens {
                if seen_tokens.insert(token.clone()) {
                    unique_tokens.push(token.clone());
                }
            }
            profiles.insert(key.clone(), profile);
        }

        // one embedding batch per unique token across the whole request
        let token_vectors: AHashMap<String, Vector> = unique_tokens
            .iter()
            .cloned()
            .zip(self.embedder.embed(&unique_tokens))
            .collect();

        // one embedding batch for the enriched "key: description" texts
        let enriched: Vec<String> = key_union
            .iter()
            .map(|k| profiles[k].enriched.clone())
            .collect();
        let text_vectors: AHashMap<String, Vector> = key_union
            .iter()
            .cloned()
            .zip(self.embedder.embed(&enriched))
            .collect();

        debug!(
            profiles = profiles.len(),
            tokens = token_vectors.len(),
            "scoring context built"
        );
        ScoreContext {
            profiles,
            token_vectors,
            text_vectors,
        }
    }

    /// Fan out one task per (source schema, target key, source key) triple
    /// and collect the records with their position indices
    fn score_all_pairs(
        &self,
        target_keys: &[FieldKey],
        sources: &[SourceSchema],
        context: &Arc<ScoreContext>,
        cancel: &CancelToken,
    ) -> Vec<(usize, usize, usize, ScoreRecord)> {
        let pair_count: usize = sources.iter().map(|s| s.fields.len()).sum::<usize>() * target_keys.len();
        let results = Arc::new(Mutex::new(Vec::with_capacity(pair_count)));
        let pool = WorkerPool::new(self.workers);

        for (source_idx, source) in sources.iter().enumerate() {
            for (target_idx, target_key) in target_keys.iter().enumerate() {
                for (key_idx, source_key) in source.fields.keys().enumerate() {
                    let context = context.clone();
                    let synonyms = self.synonyms.clone();
                    let results = results.clone();
                    let cancel = cancel.clone();
                    let target_key = target_key.clone();
                    let source_key = source_key.to_string();

                    pool.submit(move || {
                        if cancel.is_cancelled() {
                            return;
                        }
                        let (Some(target), Some(source)) = (
                            context.profiles.get(&target_key),
                            context.profiles.get(&source_key),
                        ) else {
                            return;
                        };
                        let record = score_pair(
                            target,
                            source,
                            &context.token_vectors,
                            &context.text_vectors,
                            synonyms.as_ref(),
                        );
                        results
                            .lock()
                            .push((source_idx, target_idx, key_idx, record));
                    });
                }
            }
        }
        pool.join();
        drop(pool);

        let mut collected = match Arc::try_unwrap(results) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        };
        // restore the deterministic submission order regardless of worker
        // interleaving
        collected.sort_by_key(|(s, t, k, _)| (*s, *t, *k));
        collected
    }
}

/// Group ordered records into per-source candidate lists and the flat
/// diagnostic table
fn group_records(
    sources: &[SourceSchema],
    records: Vec<(usize, usize, usize, ScoreRecord)>,
) -> (Vec<SourceCandidates>, ScoreTable) {
    let mut per_source: Vec<SourceCandidates> = sources
        .iter()
        .map(|s| SourceCandidates {
            info: s.info.clone(),
            by_target: AHashMap::new(),
        })
        .collect();
    let mut table = ScoreTable::new();

    for (source_idx, _, _, record) in records {
        table.push(ScoreRow {
            target_key: record.target_key.clone(),
            source_key: record.source_key.clone(),
            source_message: per_source[source_idx].info.message.clone(),
            fuzzy: record.fuzzy,
            semantic: record.semantic,
            synonym: record.synonym,
            llm_score: record.llm_score,
            final_score: record.final_score,
        });
        per_source[source_idx]
            .by_target
            .entry(record.target_key.clone())
            .or_default()
            .push(record);
    }

    (per_source, table)
}

/// Builder for [`MatchEngine`] with capability overrides
pub struct MatchEngineBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    synonyms: Arc<dyn SynonymProvider>,
    descriptions: Arc<dyn DescriptionProvider>,
    lemmatizer: Arc<dyn Lemmatizer>,
    workers: usize,
}

impl MatchEngineBuilder {
    pub fn new() -> Self {
        Self {
            embedder: Arc::new(HashEmbedder::default()),
            synonyms: Arc::new(CachedSynonyms::new(StaticSynonyms::maritime())),
            descriptions: Arc::new(KeyEchoDescriptions),
            lemmatizer: Arc::new(EnglishLemmatizer),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn synonyms(mut self, synonyms: Arc<dyn SynonymProvider>) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn descriptions(mut self, descriptions: Arc<dyn DescriptionProvider>) -> Self {
        self.descriptions = descriptions;
        self
    }

    pub fn lemmatizer(mut self, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        self.lemmatizer = lemmatizer;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn build(self) -> MatchEngine {
        MatchEngine {
            embedder: self.embedder,
            synonyms: self.synonyms,
            descriptions: self.descriptions,
            lemmatizer: self.lemmatizer,
            workers: self.workers,
        }
    }
}

impl Default for MatchEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaDict, SourceInfo};
    use schemamap_providers::{NullEmbedder, NullSynonyms, StaticDescriptions};
    use serde_json::json;

    fn target() -> TargetSchema {
        let mut fields = SchemaDict::new();
        fields.insert("Container No.", json!("CONT1122334"));
        fields.insert("Weight Quantity", json!(27800));
        fields.insert("Voyage Number", json!("VOY998877"));
        TargetSchema::new("port_declaration", fields)
    }

    fn source_a() -> SourceSchema {
        let mut fields = SchemaDict::new();
        fields.insert("ContainerNumber", json!("CONT9876543"));
        fields.insert("VGM", json!(24500));
        fields.insert("VoyageID", json!("VOY20250820"));
        SourceSchema::new(SourceInfo::new("schema_a", "a.csv"), fields)
    }

    fn source_b() -> SourceSchema {
        let mut fields = SchemaDict::new();
        fields.insert("containerNumber", json!("CONT0000001"));
        fields.insert("SealNumber", json!("SEAL56789"));
        SourceSchema::new(SourceInfo::new("schema_b", "b.csv"), fields)
    }

    #[test]
    fn test_full_match_produces_entry_per_target_key() {
        let outcome = MatchEngine::with_defaults()
            .match_schemas(&target(), &[source_a(), source_b()])
            .unwrap();

        assert_eq!(outcome.mapping.len(), 3);
        for entry in outcome.mapping.iter() {
            assert!(entry.candidates.len() <= 3);
        }
        // 3 targets x (3 + 2) source keys
        assert_eq!(outcome.table.len(), 15);
    }

    #[test]
    fn test_container_scenario_both_sources_rank_top() {
        let outcome = MatchEngine::with_defaults()
            .match_schemas(&target(), &[source_a(), source_b()])
            .unwrap();

        let candidates = outcome.mapping.get("Container No.").unwrap();
        assert_eq!(candidates.len(), 3);
        let top_two: Vec<&str> = candidates[..2].iter().map(|c| c.source_key.as_str()).collect();
        assert!(top_two.contains(&"ContainerNumber"));
        assert!(top_two.contains(&"containerNumber"));
        // case/format-only difference: near-identical scores
        assert!((candidates[0].final_score - candidates[1].final_score).abs() < 1e-3);
        assert!(candidates[0].synonym > 0.99);
    }

    #[test]
    fn test_rejects_undersized_schema() {
        let mut fields = SchemaDict::new();
        fields.insert("only", json!(1));
        let bad_target = TargetSchema::new("bad", fields);
        let err = MatchEngine::with_defaults()
            .match_schemas(&bad_target, &[source_a()])
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_rejects_empty_source_list() {
        let err = MatchEngine::with_defaults()
            .match_schemas(&target(), &[])
            .unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_description_failure_is_fatal() {
        let engine = MatchEngine::builder()
            .descriptions(Arc::new(StaticDescriptions::failing("llm down")))
            .build();
        let err = engine.match_schemas(&target(), &[source_a()]).unwrap_err();
        assert!(matches!(err, Error::DescriptionGeneration(_)));
    }

    #[test]
    fn test_cancelled_request_aborts() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = MatchEngine::with_defaults()
            .match_schemas_with_cancel(&target(), &[source_a()], &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_degraded_providers_still_complete() {
        let engine = MatchEngine::builder()
            .embedder(Arc::new(NullEmbedder::default()))
            .synonyms(Arc::new(NullSynonyms))
            .build();
        let outcome = engine.match_schemas(&target(), &[source_a()]).unwrap();

        // semantic collapses to zero everywhere, request still succeeds
        assert!(outcome.table.rows().iter().all(|r| r.semantic == 0.0));
        assert_eq!(outcome.mapping.len(), 3);
        // canonical equality still works without any synonym expansion
        let container = outcome.mapping.get("Container No.").unwrap();
        assert_eq!(container[0].source_key, "ContainerNumber");
    }

    #[test]
    fn test_repeated_runs_byte_identical() {
        let engine = MatchEngine::with_defaults();
        let run = || {
            let outcome = engine
                .match_schemas(&target(), &[source_a(), source_b()])
                .unwrap();
            serde_json::to_string(&outcome.mapping).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_single_worker_same_result_as_many() {
        let few = MatchEngine::builder().workers(1).build();
        let many = MatchEngine::builder().workers(8).build();
        let a = few.match_schemas(&target(), &[source_a(), source_b()]).unwrap();
        let b = many.match_schemas(&target(), &[source_a(), source_b()]).unwrap();
        assert_eq!(
            serde_json::to_string(&a.mapping).unwrap(),
            serde_json::to_string(&b.mapping).unwrap()
        );
    }

    #[test]
    fn test_match_all_keyed_by_message() {
        let engine = MatchEngine::with_defaults();
        let second_target = {
            let mut fields = SchemaDict::new();
            fields.insert("Vessel Code", json!("9V1234"));
            fields.insert("Sailing Date", json!("2025-09-10"));
            TargetSchema::new("sailing_notice", fields)
        };
        let results = engine
            .match_all(&[target(), second_target], &[source_a()])
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "port_declaration");
        assert_eq!(results[1].0, "sailing_notice");
    }
}
