//! Edit-distance and normalized similarity primitives.
//!
//! All functions are pure and deterministic: no caching, no input
//! mutation.  Distances are computed over Unicode scalar values, not
//! bytes, so accented labels behave sensibly.

/// A candidate retained by [`fuzzy_match`], with its distance to the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyCandidate {
    /// Index of the candidate in the original slice.
    pub index: usize,
    /// The candidate text (as given, original casing).
    pub text: String,
    /// Levenshtein distance between the lowercased query and candidate.
    pub distance: usize,
}

/// Classic DP Levenshtein distance with unit-cost insert/delete/substitute.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row DP: `prev` is row i-1, `curr` is row i.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            let insert = curr[j] + 1;
            let delete = prev[j + 1] + 1;
            curr[j + 1] = substitute.min(insert).min(delete);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity in `[0, 1]`: `1 - distance / max(len_a, len_b)`.
///
/// Defined as `1.0` when both strings are empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let max_len = len_a.max(len_b);

    if max_len == 0 {
        return 1.0;
    }

    1.0 - edit_distance(a, b) as f64 / max_len as f64
}

/// Rank `candidates` by case-insensitive edit distance to `query`.
///
/// Candidates farther than `max_distance` are dropped.  The result is
/// sorted ascending by distance with a stable tie-break on original
/// order (equal distances keep their input order).
pub fn fuzzy_match(query: &str, candidates: &[&str], max_distance: usize) -> Vec<FuzzyCandidate> {
    let query = query.to_lowercase();

    let mut kept: Vec<FuzzyCandidate> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let distance = edit_distance(&query, &candidate.to_lowercase());
            (distance <= max_distance).then(|| FuzzyCandidate {
                index,
                text: (*candidate).to_string(),
                distance,
            })
        })
        .collect();

    // sort_by_key is stable, preserving input order among equal distances.
    kept.sort_by_key(|c| c.distance);

    tracing::trace!(
        query = %query,
        max_distance,
        kept = kept.len(),
        "fuzzy match ranked candidates"
    );

    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn distance_identity_is_zero() {
        for s in ["", "a", "email address", "日本語ラベル"] {
            assert_eq!(edit_distance(s, s), 0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [("email", "emial"), ("phone", "fone"), ("", "x"), ("abc", "cba")];
        for (a, b) in pairs {
            assert_eq!(edit_distance(a, b), edit_distance(b, a));
        }
    }

    #[test]
    fn distance_triangle_inequality() {
        let words = ["email", "emial", "mail", "phone", ""];
        for a in words {
            for b in words {
                for c in words {
                    assert!(edit_distance(a, c) <= edit_distance(a, b) + edit_distance(b, c));
                }
            }
        }
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let s = similarity("email", "emial");
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn similarity_counts_chars_not_bytes() {
        // Both strings are 2 chars; one substitution.
        let s = similarity("éa", "éb");
        assert!((s - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn fuzzy_match_filters_and_sorts() {
        let candidates = ["email", "phone", "emral", "e-mail"];
        let ranked = fuzzy_match("email", &candidates, 2);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].text, "email");
        assert_eq!(ranked[0].distance, 0);
        assert_eq!(ranked[1].text, "e-mail");
        assert_eq!(ranked[1].distance, 1);
        assert_eq!(ranked[2].text, "emral");
        assert_eq!(ranked[2].distance, 2);
    }

    #[test]
    fn fuzzy_match_ties_keep_input_order() {
        // "mail" and "emai" are both distance 1 from "email".
        let ranked = fuzzy_match("email", &["mail", "emai"], 1);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].text, "mail");
        assert_eq!(ranked[1].text, "emai");
    }

    #[test]
    fn fuzzy_match_is_case_insensitive() {
        let ranked = fuzzy_match("EMAIL", &["Email"], 0);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].distance, 0);
    }

    #[test]
    fn fuzzy_match_keeps_original_indices() {
        let ranked = fuzzy_match("abc", &["zzzzz", "abd"], 2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].index, 1);
    }
}
