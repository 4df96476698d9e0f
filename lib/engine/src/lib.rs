//! Schema matching engine
//!
//! Takes one target schema and any number of source schemas and produces,
//! for every target field, a ranked top-3 list of candidate source fields.
//! Each pair is scored by four independent signals (lexical, semantic,
//! canonical synonym coverage, description similarity) blended into a single
//! final score; scoring fans out over a bounded worker pool and the results
//! are merged deterministically.

pub mod aggregate;
pub mod matcher;
pub mod pool;
pub mod report;
pub mod schema;
pub mod score;

pub use aggregate::{merge_across_sources, MappingEntry, MappingResult, MatchCandidate, TOP_K};
pub use matcher::{MatchEngine, MatchEngineBuilder, MatchOutcome};
pub use pool::{CancelToken, WorkerPool, DEFAULT_WORKERS};
pub use report::{ScoreRow, ScoreTable};
pub use schema::{FieldKey, SchemaDict, SourceInfo, SourceSchema, TargetSchema, MIN_COLUMNS};
pub use score::{score_pair, KeyProfile, ScoreRecord};
