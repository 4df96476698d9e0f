//! # schemamap
//!
//! Multi-signal field-name matching for heterogeneous tabular schemas.
//!
//! schemamap takes one target schema (field key -> example value) and any
//! number of source schemas, scores every (target field, source field) pair
//! with four independent signals, and returns the top 3 candidate source
//! fields per target field with full per-signal score breakdowns and source
//! provenance.
//!
//! The four signals, blended into one final score:
//!
//! - **fuzzy** (0.10) - edit-distance similarity of the normalized keys
//! - **semantic** (0.10) - embedding similarity over key tokens
//! - **synonym** (0.30) - canonical-form coverage with synonym expansion
//! - **llm_score** (0.50) - similarity of generated field descriptions
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! cargo install schemamap
//! schemamap --target target.json --source a.json --source b.json --out-dir out/
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use schemamap::prelude::*;
//! use serde_json::json;
//!
//! let mut target_fields = SchemaDict::new();
//! target_fields.insert("Container No.", json!("CONT1122334"));
//! target_fields.insert("Weight Quantity", json!(27800));
//! let target = TargetSchema::new("port_declaration", target_fields);
//!
//! let mut source_fields = SchemaDict::new();
//! source_fields.insert("ContainerNumber", json!("CONT9876543"));
//! source_fields.insert("VGM", json!(24500));
//! let source = SourceSchema::new(SourceInfo::new("schema_a", "a.csv"), source_fields);
//!
//! let engine = MatchEngine::with_defaults();
//! let outcome = engine.match_schemas(&target, &[source]).unwrap();
//! let best = &outcome.mapping.get("Container No.").unwrap()[0];
//! assert_eq!(best.source_key, "ContainerNumber");
//! ```
//!
//! ## Crate Structure
//!
//! schemamap is composed of several crates:
//!
//! - `schemamap-core` - key normalization, tokenization, lexical similarity,
//!   vector math
//! - `schemamap-providers` - pluggable capability providers (embeddings,
//!   synonyms, field descriptions)
//! - `schemamap-engine` - schemas, pair scoring, worker pool, aggregation
//!   and diagnostic artifacts

// Re-export core types
pub use schemamap_core::{
    canonical_tokens, canonicalize, levenshtein_similarity, preprocess_key, sequence_ratio,
    tokenize, EnglishLemmatizer, Error, Lemmatizer, NullLemmatizer, Result, Vector,
};

// Re-export providers
pub use schemamap_providers::{
    CachedSynonyms, DescriptionProvider, DescriptionSet, EmbeddingProvider, FieldDescription,
    HashEmbedder, KeyEchoDescriptions, NullEmbedder, NullSynonyms, StaticDescriptions,
    StaticSynonyms, SynonymProvider,
};

// Re-export the engine
pub use schemamap_engine::{
    CancelToken, MappingEntry, MappingResult, MatchCandidate, MatchEngine, MatchEngineBuilder,
    MatchOutcome, SchemaDict, ScoreRecord, ScoreRow, ScoreTable, SourceInfo, SourceSchema,
    TargetSchema, DEFAULT_WORKERS, TOP_K,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CancelToken, DescriptionProvider, DescriptionSet, EmbeddingProvider, Error, HashEmbedder,
        Lemmatizer, MappingResult, MatchCandidate, MatchEngine, MatchOutcome, Result, SchemaDict,
        ScoreTable, SourceInfo, SourceSchema, SynonymProvider, TargetSchema, Vector,
    };
}
