//! # schemamap Providers
//!
//! Capability interfaces for the external collaborators of the matching
//! engine, each with a production-shaped implementation and a null/no-op
//! implementation substitutable in tests.
//!
//! The scoring pipeline must stay correct when any collaborator is degraded:
//!
//! - [`EmbeddingProvider`] never fails; a degraded provider returns zero
//!   vectors and semantic similarity silently drops to 0
//! - [`SynonymProvider`] never fails; a degraded provider returns empty sets
//! - [`DescriptionProvider`] is the one fatal collaborator: if the batch
//!   description call fails, the whole matching request aborts

pub mod descriptions;
pub mod embedding;
pub mod synonyms;

pub use descriptions::{
    DescriptionProvider, DescriptionSet, FieldDescription, KeyEchoDescriptions,
    StaticDescriptions,
};
pub use embedding::{EmbeddingProvider, HashEmbedder, NullEmbedder, DEFAULT_EMBED_DIM};
pub use synonyms::{CachedSynonyms, NullSynonyms, StaticSynonyms, SynonymProvider};
