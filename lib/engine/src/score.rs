//! Multi-signal pair scoring
//!
//! For one (target key, source key) pair, four independent signals are
//! computed and reduced to a single `final_score`:
//!
//! - `fuzzy` - token-level edit-distance similarity
//! - `semantic` - token-level embedding cosine similarity
//! - `synonym` - weighted canonical-token coverage with synonym expansion
//! - `llm_score` - hybrid similarity over generated field descriptions
//!
//! The fuzzy and semantic signals share one directional procedure: for every
//! token of A take the best similarity against any token of B, average over
//! A, repeat with roles swapped, then combine both directions with a
//! smoothed harmonic mean. The harmonic mean punishes asymmetric containment
//! harder than an arithmetic mean, which keeps overly generic keys from
//! matching everything.

use crate::schema::FieldKey;
use ahash::{AHashMap, AHashSet};
use schemamap_core::{
    canonical_tokens, canonical_weight, levenshtein_similarity, sequence_ratio, tokenize,
    Lemmatizer, Vector,
};
use schemamap_providers::{DescriptionSet, SynonymProvider};
use serde::Serialize;

/// Fixed aggregation weights; a convex combination, so `final_score` stays
/// in [0,1]. Synonym and description dominate because they carry domain
/// knowledge the raw key-name signals cannot.
pub const WEIGHT_FUZZY: f32 = 0.10;
pub const WEIGHT_SEMANTIC: f32 = 0.10;
pub const WEIGHT_SYNONYM: f32 = 0.30;
pub const WEIGHT_DESCRIPTION: f32 = 0.50;

/// Description hybrid: embeddings carry most of the weight, the textual
/// ratio boosts near-verbatim matches
const DESCRIPTION_EMBED_WEIGHT: f32 = 0.7;
const DESCRIPTION_TEXT_WEIGHT: f32 = 0.3;

/// Smoothing term that keeps the harmonic mean defined when both directions
/// are zero
const SMOOTHING_EPS: f32 = 1e-6;

/// Synonym expansion is only requested for abbreviation-like tokens
const ABBREV_MAX_LEN: usize = 3;
const ABBREV_LIKE: &[&str] = &["dob", "id", "no", "num"];

/// Fuzzy alias fallback in the synonym scorer: both tokens short, high
/// lexical similarity
const ALIAS_MAX_LEN: usize = 7;
const ALIAS_MIN_SIMILARITY: f32 = 0.85;

/// The four raw signals plus their weighted combination for one
/// (target key, source key) pair. Immutable once computed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreRecord {
    pub target_key: FieldKey,
    pub source_key: FieldKey,
    pub fuzzy: f32,
    pub semantic: f32,
    pub synonym: f32,
    pub llm_score: f32,
    pub final_score: f32,
}

impl ScoreRecord {
    pub fn new(
        target_key: FieldKey,
        source_key: FieldKey,
        fuzzy: f32,
        semantic: f32,
        synonym: f32,
        llm_score: f32,
    ) -> Self {
        let final_score = WEIGHT_FUZZY * fuzzy
            + WEIGHT_SEMANTIC * semantic
            + WEIGHT_SYNONYM * synonym
            + WEIGHT_DESCRIPTION * llm_score;
        Self {
            target_key,
            source_key,
            fuzzy,
            semantic,
            synonym,
            llm_score,
            final_score,
        }
    }
}

/// Everything about one key the scorers need, computed once per unique key
/// per request
#[derive(Debug, Clone)]
pub struct KeyProfile {
    pub key: FieldKey,
    /// Ordered lemmatized tokens, duplicates retained
    pub tokens: Vec<String>,
    /// De-duplicated canonical token set
    pub canonical: AHashSet<String>,
    /// Lower-cased "key: description" text for the description signal
    pub enriched: String,
}

impl KeyProfile {
    pub fn build(key: &str, lemmatizer: &dyn Lemmatizer, descriptions: &DescriptionSet) -> Self {
        let tokens = tokenize(key, lemmatizer);
        let canonical = canonical_tokens(&tokens);
        let enriched = format!("{}: {}", key, descriptions.description_for(key))
            .to_lowercase()
            .trim()
            .to_string();
        Self {
            key: key.to_string(),
            tokens,
            canonical,
            enriched,
        }
    }
}

#[inline]
fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Smoothed harmonic mean of two directional averages
#[inline]
fn harmonic_mean(a: f32, b: f32) -> f32 {
    (2.0 * a * b) / (a + b + SMOOTHING_EPS)
}

fn token_cosine(a: &str, b: &str, token_vectors: &AHashMap<String, Vector>) -> f32 {
    match (token_vectors.get(a), token_vectors.get(b)) {
        (Some(va), Some(vb)) => clamp01(va.cosine_similarity(vb)),
        _ => 0.0,
    }
}

/// One directional pass: best fuzzy and best cosine per token of `a` against
/// all tokens of `b`, averaged over `a`
fn directional_pass(
    a: &[String],
    b: &[String],
    token_vectors: &AHashMap<String, Vector>,
) -> (f32, f32) {
    let mut fuzzy_sum = 0.0f32;
    let mut semantic_sum = 0.0f32;
    for tok_a in a {
        let mut best_fuzzy = 0.0f32;
        let mut best_semantic = 0.0f32;
        for tok_b in b {
            best_fuzzy = best_fuzzy.max(levenshtein_similarity(tok_a, tok_b));
            best_semantic = best_semantic.max(token_cosine(tok_a, tok_b, token_vectors));
        }
        fuzzy_sum += best_fuzzy;
        semantic_sum += best_semantic;
    }
    (fuzzy_sum / a.len() as f32, semantic_sum / a.len() as f32)
}

/// Token-level fuzzy and semantic signals for one pair
///
/// Both directions, combined with the smoothed harmonic mean. Symmetric:
/// swapping the two keys yields identical scores. An empty token sequence on
/// either side yields (0, 0).
pub fn token_signals(
    target_tokens: &[String],
    source_tokens: &[String],
    token_vectors: &AHashMap<String, Vector>,
) -> (f32, f32) {
    if target_tokens.is_empty() || source_tokens.is_empty() {
        return (0.0, 0.0);
    }

    let (fuzzy_fwd, semantic_fwd) = directional_pass(target_tokens, source_tokens, token_vectors);
    let (fuzzy_rev, semantic_rev) = directional_pass(source_tokens, target_tokens, token_vectors);

    (
        clamp01(harmonic_mean(fuzzy_fwd, fuzzy_rev)),
        clamp01(harmonic_mean(semantic_fwd, semantic_rev)),
    )
}

/// A canonical token gets a synonym expansion only when it looks like an
/// abbreviation; this bounds calls to the external synonym collaborator
fn abbreviation_like(token: &str) -> bool {
    token.chars().count() <= ABBREV_MAX_LEN || ABBREV_LIKE.contains(&token.to_lowercase().as_str())
}

fn matches_as_synonym(a: &str, b: &str, expansion: Option<&AHashSet<String>>) -> bool {
    if a == b {
        return true;
    }
    if let Some(set) = expansion {
        if set.contains(&b.to_lowercase()) {
            return true;
        }
    }
    // fuzzy backup for alias-y abbreviations
    let max_len = a.chars().count().max(b.chars().count());
    max_len <= ALIAS_MAX_LEN && levenshtein_similarity(a, b) >= ALIAS_MIN_SIMILARITY
}

/// Weighted canonical-token coverage of the source key against the target
/// key, with synonym expansion for abbreviation-like source tokens
///
/// Returns matched weight over total weight; 0.0 when the source set is
/// empty (never divides by zero).
pub fn synonym_coverage(
    source_canonical: &AHashSet<String>,
    target_canonical: &AHashSet<String>,
    synonyms: &dyn SynonymProvider,
) -> f32 {
    if source_canonical.is_empty() || target_canonical.is_empty() {
        return 0.0;
    }

    let total_weight: f32 = source_canonical.iter().map(|t| canonical_weight(t)).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }

    let mut matched_weight = 0.0f32;
    for a in source_canonical {
        let expansion = abbreviation_like(a).then(|| synonyms.synonyms_for(a));
        let matched = target_canonical
            .iter()
            .any(|b| matches_as_synonym(a, b, expansion.as_ref()));
        if matched {
            matched_weight += canonical_weight(a);
        }
    }

    clamp01(matched_weight / total_weight)
}

/// Hybrid description similarity: cosine over whole enriched texts plus a
/// plain sequence ratio
pub fn description_similarity(
    target: &KeyProfile,
    source: &KeyProfile,
    text_vectors: &AHashMap<String, Vector>,
) -> f32 {
    let embedding_score = match (text_vectors.get(&target.key), text_vectors.get(&source.key)) {
        (Some(vt), Some(vs)) => clamp01(vt.cosine_similarity(vs)),
        _ => 0.0,
    };
    let text_score = sequence_ratio(&target.enriched, &source.enriched);
    clamp01(DESCRIPTION_EMBED_WEIGHT * embedding_score + DESCRIPTION_TEXT_WEIGHT * text_score)
}

/// Score one (target, source) pair across all four signals
pub fn score_pair(
    target: &KeyProfile,
    source: &KeyProfile,
    token_vectors: &AHashMap<String, Vector>,
    text_vectors: &AHashMap<String, Vector>,
    synonyms: &dyn SynonymProvider,
) -> ScoreRecord {
    let (fuzzy, semantic) = token_signals(&target.tokens, &source.tokens, token_vectors);
    let synonym = synonym_coverage(&source.canonical, &target.canonical, synonyms);
    let llm_score = description_similarity(target, source, text_vectors);
    ScoreRecord::new(
        target.key.clone(),
        source.key.clone(),
        fuzzy,
        semantic,
        synonym,
        llm_score,
    )
}
