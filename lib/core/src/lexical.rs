//! Edit-distance and sequence-ratio string similarity
//!
//! Provides the lexical primitives used by the scoring pipeline. All
//! similarity functions return a score in [0.0, 1.0] where 1.0 means
//! identical.

use crate::token::preprocess_key;

/// Levenshtein edit distance (substitution/insertion/deletion, unit cost)
///
/// Classic two-row dynamic program, O(|a|*|b|).
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut cur_row: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur_row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let insertions = prev_row[j + 1] + 1;
            let deletions = cur_row[j] + 1;
            let substitutions = prev_row[j] + usize::from(ca != cb);
            cur_row[j + 1] = insertions.min(deletions).min(substitutions);
        }
        std::mem::swap(&mut prev_row, &mut cur_row);
    }
    prev_row[b.len()]
}

/// Normalized edit-distance similarity between two preprocessed keys
///
/// `1 - distance / max(len)`, computed over the [`preprocess_key`] form of
/// both inputs. Clamped to 0.0 when either side preprocesses to an empty
/// string.
pub fn levenshtein_similarity(a: &str, b: &str) -> f32 {
    let a_proc = preprocess_key(a);
    let b_proc = preprocess_key(b);
    if a_proc.is_empty() || b_proc.is_empty() {
        return 0.0;
    }
    let dist = levenshtein(&a_proc, &b_proc);
    let max_len = a_proc.chars().count().max(b_proc.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (1.0 - dist as f32 / max_len as f32).max(0.0)
}

/// Plain sequence-similarity ratio between two strings
///
/// Ratcliff-Obershelp: `2 * M / (|a| + |b|)` where M is the total length of
/// matched blocks found by recursively taking the longest common substring.
/// Operates on the raw strings, no preprocessing.
pub fn sequence_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = matching_len(&a, &b);
    (2.0 * matches as f32) / total as f32
}

fn matching_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (ai, bi, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_len(&a[..ai], &b[..bi]) + matching_len(&a[ai + len..], &b[bi + len..])
}

/// Earliest longest common substring of `a` and `b` as (a_start, b_start, len)
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0usize, 0usize, 0usize);
    // lengths[j] = length of common suffix ending at a[i], b[j-1]
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                cur[j + 1] = prev[j] + 1;
                let len = cur[j + 1];
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            } else {
                cur[j + 1] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
        cur[0] = 0;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("num", "number"), 3);
    }

    #[test]
    fn test_identity_similarity_is_one() {
        assert_eq!(levenshtein_similarity("Container No.", "Container No."), 1.0);
        assert_eq!(levenshtein_similarity("vgm", "vgm"), 1.0);
    }

    #[test]
    fn test_empty_similarity_is_zero() {
        assert_eq!(levenshtein_similarity("", "container"), 0.0);
        assert_eq!(levenshtein_similarity("container", ""), 0.0);
        // preprocesses to empty
        assert_eq!(levenshtein_similarity("(n/a)", "container"), 0.0);
    }

    #[test]
    fn test_similarity_symmetric_and_bounded() {
        let ab = levenshtein_similarity("ContainerNumber", "Container No.");
        let ba = levenshtein_similarity("Container No.", "ContainerNumber");
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_near_abbreviation_similarity() {
        // "num" vs "number" differ by 3 of 6 chars
        let sim = levenshtein_similarity("num", "number");
        assert!((sim - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sequence_ratio() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", "abc"), 1.0);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);

        // shared prefix "abc" of "abcd" (4) and "abce" (4): 2*3/8
        let sim = sequence_ratio("abcd", "abce");
        assert!((sim - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_sequence_ratio_symmetric_blocks() {
        let a = "container number: unique container identifier";
        let b = "container no: identifier of a container";
        let sim = sequence_ratio(a, b);
        assert!(sim > 0.5 && sim < 1.0);
    }
}
