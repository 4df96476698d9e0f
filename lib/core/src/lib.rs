//! # schemamap Core
//!
//! Core library for the schemamap field-matching engine.
//!
//! This crate provides the fundamental primitives shared by the scoring
//! pipeline:
//!
//! - [`Vector`] - Dense embedding vector with cosine similarity
//! - [`token`] - Field-key normalization, tokenization and canonical categories
//! - [`lexical`] - Edit-distance and sequence-ratio string similarity
//! - [`Error`] - Shared error taxonomy for the whole engine
//!
//! ## Example
//!
//! ```rust
//! use schemamap_core::token::{tokenize, canonical_tokens, EnglishLemmatizer};
//!
//! let lemmatizer = EnglishLemmatizer;
//! let tokens = tokenize("Container No.", &lemmatizer);
//! assert_eq!(tokens, vec!["container", "no"]);
//!
//! let canon = canonical_tokens(&tokens);
//! assert!(canon.contains("CONTAINER"));
//! assert!(canon.contains("NUMBER"));
//! ```

pub mod error;
pub mod lexical;
pub mod token;
pub mod vector;

pub use error::{Error, Result};
pub use lexical::{levenshtein, levenshtein_similarity, sequence_ratio};
pub use token::{
    canonical_tokens, canonical_weight, canonicalize, preprocess_key, tokenize, EnglishLemmatizer,
    Lemmatizer, NullLemmatizer,
};
pub use vector::Vector;
