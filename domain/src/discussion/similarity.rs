//! Word-overlap similarity used to spot a discussion going in circles.

use std::collections::HashSet;

/// Jaccard similarity of the word sets of two texts, in `[0, 1]`.
///
/// Words are lowercased, split on anything that is not alphanumeric, and
/// words of two characters or fewer are ignored. Two texts with no
/// remaining words are identical (1.0); one empty side gives 0.0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let left = word_set(a);
    let right = word_set(b);

    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts() {
        assert_eq!(jaccard_similarity("The loan is fine", "the LOAN is fine!"), 1.0);
    }

    #[test]
    fn test_disjoint_texts() {
        assert_eq!(jaccard_similarity("market prices rising", "policy allows subsidy"), 0.0);
    }

    #[test]
    fn test_partial_overlap_ignores_short_words() {
        // {market} vs {market, down}; "is" and "up" are ignored
        let score = jaccard_similarity("market is up", "market is down");
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_sides() {
        assert_eq!(jaccard_similarity("", "ok"), 1.0);
        assert_eq!(jaccard_similarity("", "something longer"), 0.0);
    }
}
