//! Synonym-expansion capability
//!
//! The synonym scorer asks for domain synonyms of abbreviation-like tokens
//! ("vgm" -> "verified gross mass"). The contract is infallible: a provider
//! that cannot answer returns an empty set and the coverage score simply
//! loses that expansion.

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use tracing::debug;

/// Synonym-expansion capability
///
/// Expansions are lower-case single tokens or phrases. Implementations must
/// never fail; unavailable providers return empty sets.
pub trait SynonymProvider: Send + Sync {
    fn synonyms_for(&self, token: &str) -> AHashSet<String>;
}

/// Degraded synonym provider: always returns an empty set
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSynonyms;

impl SynonymProvider for NullSynonyms {
    fn synonyms_for(&self, _token: &str) -> AHashSet<String> {
        AHashSet::new()
    }
}

/// Table-driven synonym provider
///
/// Ships with a maritime/logistics table covering the abbreviations that
/// actually occur in port-community schemas. Extendable at runtime.
#[derive(Debug, Clone, Default)]
pub struct StaticSynonyms {
    table: AHashMap<String, AHashSet<String>>,
}

impl StaticSynonyms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in maritime/logistics abbreviation table
    pub fn maritime() -> Self {
        let mut s = Self::new();
        s.insert("vgm", &["verified gross mass", "gross mass", "weight"]);
        s.insert("grt", &["gross tonnage", "gross register tonnage"]);
        s.insert("bl", &["bill of lading", "lading"]);
        s.insert("pol", &["port of loading", "loading port"]);
        s.insert("pod", &["port of discharge", "discharge port"]);
        s.insert("eta", &["estimated time of arrival", "arrival"]);
        s.insert("etd", &["estimated time of departure", "departure"]);
        s.insert("oog", &["out of gauge", "over dimension"]);
        s.insert("teu", &["twenty foot equivalent unit"]);
        s.insert("imo", &["international maritime organization number"]);
        s
    }

    pub fn insert(&mut self, token: &str, synonyms: &[&str]) {
        self.table.insert(
            token.to_lowercase(),
            synonyms.iter().map(|s| s.to_lowercase()).collect(),
        );
    }
}

impl SynonymProvider for StaticSynonyms {
    fn synonyms_for(&self, token: &str) -> AHashSet<String> {
        self.table
            .get(&token.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

/// Process-lifetime cache around any synonym provider
///
/// The cache is append-only and keyed by the looked-up token. Races on
/// population are benign: recomputing the same value is correctness
/// preserving, just wasteful. Eviction is never needed for correctness.
pub struct CachedSynonyms<P> {
    inner: P,
    cache: RwLock<AHashMap<String, AHashSet<String>>>,
}

impl<P: SynonymProvider> CachedSynonyms<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    pub fn cached_tokens(&self) -> usize {
        self.cache.read().len()
    }
}

impl<P: SynonymProvider> SynonymProvider for CachedSynonyms<P> {
    fn synonyms_for(&self, token: &str) -> AHashSet<String> {
        if let Some(hit) = self.cache.read().get(token) {
            return hit.clone();
        }

        let expansion = self.inner.synonyms_for(token);
        debug!(token, count = expansion.len(), "synonym expansion fetched");
        self.cache
            .write()
            .entry(token.to_string())
            .or_insert_with(|| expansion.clone());
        expansion
    }
}
