//! Field-key normalization and tokenization
//!
//! Raw field keys arrive in wildly inconsistent shapes ("Container No.",
//! "containerNumber", "CNTR_NO (master)"). This module canonicalizes them into
//! comparable token sequences: parenthetical content is stripped, camel-case
//! and acronym boundaries are split, punctuation removed, stop-words dropped,
//! tokens lemmatized, and finally mapped through a fixed canonical-category
//! table so that "no", "num" and "id" all collapse into `NUMBER`.
//!
//! Tokenization is deterministic: the same key always yields the same
//! sequence, order-preserving with duplicates retained.

use ahash::{AHashMap, AHashSet};
use std::sync::OnceLock;

/// Stop-words dropped during tokenization
const STOPWORDS: &[&str] = &[
    "of", "the", "and", "in", "for", "if", "is", "nr", "mt", "y", "n", "yes", "a", "an", "on",
    "by", "to", "with",
];

/// Literal token -> canonical category table
const CANON_TABLE: &[(&str, &str)] = &[
    // numbers / identifiers
    ("no", "NUMBER"),
    ("num", "NUMBER"),
    ("number", "NUMBER"),
    ("id", "NUMBER"),
    ("code", "NUMBER"),
    // dates
    ("dob", "DOB"),
    ("dateofbirth", "DOB"),
    ("birthdate", "DOB"),
    ("date", "DATE"),
    ("dt", "DATE"),
    ("datetime", "DATE"),
    // container / vessel / gate
    ("container", "CONTAINER"),
    ("cntr", "CONTAINER"),
    ("ctr", "CONTAINER"),
    ("vessel", "VESSEL"),
    ("ship", "VESSEL"),
    ("gate", "GATE"),
    // commons
    ("name", "NAME"),
    ("type", "TYPE"),
];

/// Categories so common they are weak evidence of a true match
const GENERIC_CANON: &[&str] = &["NUMBER", "DATE", "TYPE", "NAME"];

/// Weight of a generic canonical token in coverage scoring
pub const GENERIC_TOKEN_WEIGHT: f32 = 0.6;

/// Weight of a specific (non-generic) token in coverage scoring
pub const SPECIFIC_TOKEN_WEIGHT: f32 = 1.6;

fn stopwords() -> &'static AHashSet<&'static str> {
    static SET: OnceLock<AHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

fn canon_map() -> &'static AHashMap<&'static str, &'static str> {
    static MAP: OnceLock<AHashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| CANON_TABLE.iter().copied().collect())
}

/// Lemmatization capability
///
/// The engine works with whatever lemmatizer is available; tests and degraded
/// deployments use [`NullLemmatizer`], which passes tokens through unchanged.
pub trait Lemmatizer: Send + Sync {
    fn lemma(&self, token: &str) -> String;
}

/// Identity lemmatizer, the no-op fallback when no lemmatization capability
/// is available
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLemmatizer;

impl Lemmatizer for NullLemmatizer {
    fn lemma(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Rule-based English plural stripper
///
/// Not a full lemmatizer; it only folds regular plurals ("containers" ->
/// "container", "quantities" -> "quantity") which is what field names
/// actually vary on.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLemmatizer;

impl Lemmatizer for EnglishLemmatizer {
    fn lemma(&self, token: &str) -> String {
        let t = token;
        if t.len() > 3 && t.ends_with("ies") {
            return format!("{}y", &t[..t.len() - 3]);
        }
        if t.len() > 3
            && t.ends_with("es")
            && (t[..t.len() - 2].ends_with('s')
                || t[..t.len() - 2].ends_with('x')
                || t[..t.len() - 2].ends_with('z')
                || t[..t.len() - 2].ends_with("ch")
                || t[..t.len() - 2].ends_with("sh"))
        {
            return t[..t.len() - 2].to_string();
        }
        if t.len() > 2 && t.ends_with('s') && !t.ends_with("ss") && !t.ends_with("us") {
            return t[..t.len() - 1].to_string();
        }
        t.to_string()
    }
}

/// Canonicalize a raw field key into a comparable lower-case phrase
///
/// Strips parenthetical content, splits camel-case and acronym+Word
/// boundaries into separate words, lower-cases, replaces non-alphanumeric
/// characters with spaces and collapses runs of whitespace.
///
/// `"Container No. (master)"` becomes `"container no"`,
/// `"OOGHeight"` becomes `"oog height"`.
pub fn preprocess_key(key: &str) -> String {
    // drop anything inside parentheses
    let mut stripped = String::with_capacity(key.len());
    let mut depth = 0usize;
    for ch in key.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    // split lower->Upper and ACRONYM+Word boundaries
    let chars: Vec<char> = stripped.chars().collect();
    let mut spaced = String::with_capacity(chars.len() + 8);
    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let camel = prev.is_lowercase() && ch.is_uppercase();
            let acronym_end = prev.is_uppercase()
                && ch.is_uppercase()
                && chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if camel || acronym_end {
                spaced.push(' ');
            }
        }
        spaced.push(ch);
    }

    // lower-case, strip punctuation, collapse whitespace
    let mut out = String::with_capacity(spaced.len());
    for ch in spaced.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Tokenize a field key into an ordered sequence of normalized tokens
///
/// Applies [`preprocess_key`], splits on word boundaries, drops stop-words and
/// lemmatizes each surviving token. Duplicates are retained and order is
/// preserved. A key made only of stop-words or punctuation yields an empty
/// sequence; scorers must treat that as zero similarity, never an error.
pub fn tokenize(key: &str, lemmatizer: &dyn Lemmatizer) -> Vec<String> {
    preprocess_key(key)
        .split_whitespace()
        .filter(|t| !stopwords().contains(t))
        .map(|t| lemmatizer.lemma(t))
        .collect()
}

/// Map a single token through the canonical-category table
///
/// Unknown tokens pass through unchanged (lower-cased, alphanumeric only).
pub fn canonicalize(token: &str) -> String {
    let cleaned: String = token
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match canon_map().get(cleaned.as_str()) {
        Some(canon) => (*canon).to_string(),
        None => cleaned,
    }
}

/// Collapse a token sequence into its canonical token set
///
/// Duplicates collapse; empty canonical forms are dropped.
pub fn canonical_tokens(tokens: &[String]) -> AHashSet<String> {
    tokens
        .iter()
        .map(|t| canonicalize(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Coverage weight of a canonical token
///
/// Generic categories (NUMBER, DATE, TYPE, NAME) appear in almost every
/// schema and are weak evidence, so they weigh less than specific tokens.
pub fn canonical_weight(canon: &str) -> f32 {
    if GENERIC_CANON.contains(&canon) {
        GENERIC_TOKEN_WEIGHT
    } else {
        SPECIFIC_TOKEN_WEIGHT
    }
}
