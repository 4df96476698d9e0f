//! Embedding capability
//!
//! Tokens and enriched description texts are embedded into fixed-length real
//! vectors. The contract is infallible: a provider that cannot embed returns
//! all-zero vectors, which makes every cosine similarity 0 rather than
//! failing the request.

use schemamap_core::Vector;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Default dimension for built-in embeddings
pub const DEFAULT_EMBED_DIM: usize = 64;

/// Embedding capability
///
/// Batched for efficiency: the engine embeds all unique tokens of a request
/// in one call. Implementations must return exactly one vector per input
/// text, in order, and must be deterministic for identical input.
pub trait EmbeddingProvider: Send + Sync {
    /// Dimension of the vectors this provider produces
    fn dim(&self) -> usize;

    /// Embed a batch of texts, one vector per text
    fn embed(&self, texts: &[String]) -> Vec<Vector>;
}

/// Degraded embedding provider: always returns zero vectors
///
/// Stands in when no embedding capability is available; cosine similarity
/// against a zero vector is 0, so the semantic signal contributes nothing.
#[derive(Debug, Clone, Copy)]
pub struct NullEmbedder {
    dim: usize,
}

impl NullEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for NullEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_DIM)
    }
}

impl EmbeddingProvider for NullEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, texts: &[String]) -> Vec<Vector> {
        texts.iter().map(|_| Vector::zeros(self.dim)).collect()
    }
}

/// Deterministic hash-based embedder
///
/// Maps character trigrams and whole words to vector positions by hashing.
/// No model download, no network: similar strings share trigrams and words,
/// so they land close in the vector space. Word-level hashes contribute more
/// than trigrams.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vector {
        let mut components = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for trigram in trigrams(&normalized) {
            let pos = (hash_str(&trigram) as usize) % self.dim;
            components[pos] += 1.0;
        }

        for word in normalized.split_whitespace() {
            let pos = (hash_str(word) as usize) % self.dim;
            components[pos] += 2.0;
        }

        let mut vector = Vector::new(components);
        vector.normalize();
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_DIM)
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, texts: &[String]) -> Vec<Vector> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Character trigrams of a padded string
fn trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();

    if chars.len() < 3 {
        return HashSet::new();
    }

    chars
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_null_embedder_zero_vectors() {
        let embedder = NullEmbedder::new(8);
        let vectors = embedder.embed(&texts(&["container", "vessel"]));
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(Vector::is_zero));
        assert!(vectors.iter().all(|v| v.dim() == 8));
    }

    #[test]
    fn test_hash_embedder_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed(&texts(&["container number"]));
        let b = embedder.embed(&texts(&["container number"]));
        assert_eq!(a[0], b[0]);
    }

    #[test]
    fn test_hash_embedder_normalized() {
        let embedder = HashEmbedder::default();
        let v = &embedder.embed(&texts(&["container number"]))[0];
        let magnitude: f32 = v.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_similar_texts_closer_than_different() {
        let embedder = HashEmbedder::default();
        let vs = embedder.embed(&texts(&["container number", "container no", "voyage date"]));
        let close = vs[0].cosine_similarity(&vs[1]);
        let far = vs[0].cosine_similarity(&vs[2]);
        assert!(
            close > far,
            "expected {} (close) > {} (far)",
            close,
            far
        );
    }

    #[test]
    fn test_trigrams() {
        let set = trigrams("hello");
        assert!(set.contains("hel"));
        assert!(set.contains("ell"));
        assert!(set.contains("llo"));
    }
}
