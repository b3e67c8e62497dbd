//! Normalized edit distance between a query and hypothesis person names.
//!
//! ```text
//! distance(q, h) = levenshtein(q, h) / max(len(q), len(h))
//! ```
//!
//! Lengths are counted in characters. The result is an approximate confidence
//! measure in `[0, 1]`, not a metric with formal bounds.

/// Levenshtein distance with unit insert/delete/substitute costs
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row dynamic programming over `b`
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;

        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            let deletion = row[j + 1] + 1;
            let insertion = row[j] + 1;

            diagonal = row[j + 1];
            row[j + 1] = substitution.min(deletion).min(insertion);
        }
    }

    row[b.len()]
}

/// Query string with its character count computed once
#[derive(Debug, Clone)]
pub struct DistanceScorer<'q> {
    query: &'q str,
    query_length: usize,
}

impl<'q> DistanceScorer<'q> {
    #[must_use]
    pub fn new(query: &'q str) -> Self {
        Self {
            query,
            query_length: query.chars().count(),
        }
    }

    /// Normalized distance to a person name whose character count is known
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(&self, person_name: &str, name_length: usize) -> f64 {
        let longest = self.query_length.max(name_length);
        if longest == 0 {
            return 0.0;
        }
        levenshtein(self.query, person_name) as f64 / longest as f64
    }
}

/// Normalized distance between two strings
#[must_use]
pub fn normalized_distance(query: &str, person_name: &str) -> f64 {
    DistanceScorer::new(query).distance(person_name, person_name.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("herve_bredin", "herve_bredin"), 0);
    }

    #[test]
    fn test_levenshtein_known_values() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_levenshtein_is_symmetric() {
        assert_eq!(
            levenshtein("claude_barras", "claude_baras"),
            levenshtein("claude_baras", "claude_barras")
        );
    }

    #[test]
    fn test_levenshtein_counts_characters_not_bytes() {
        // 'é' is two bytes in UTF-8 but a single substitution
        assert_eq!(levenshtein("herve", "hervé"), 1);
    }

    #[test]
    fn test_normalized_distance_identical_is_zero() {
        assert!(normalized_distance("alice", "alice").abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalized_distance_uses_longest_length() {
        // one deletion over max(6, 5)
        let d = normalized_distance("alicia", "alici");
        assert!((d - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_distance_unrelated() {
        let d = normalized_distance("abc", "xyz");
        assert!((d - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalized_distance_both_empty() {
        assert!(normalized_distance("", "").abs() < f64::EPSILON);
    }

    #[test]
    fn test_scorer_matches_free_function() {
        let scorer = DistanceScorer::new("camille_guinaudeau");
        let name = "camille_guinodeau";
        let d = scorer.distance(name, name.chars().count());
        assert!((d - normalized_distance("camille_guinaudeau", name)).abs() < f64::EPSILON);
    }
}
