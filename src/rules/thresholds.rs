//! Minimum-match threshold computation for rules.
//!
//! Every rule gets a set of minimums computed at index-build time: how many
//! tokens (total and legalese, occurrences and unique) a match must cover
//! to be acceptable. Matchers check these at the source so sub-threshold
//! matches never reach refinement.

/// Minimum matched token count for mid-size rules.
pub const MIN_MATCH_LENGTH: usize = 4;

/// Minimum matched legalese token count for mid-size rules.
pub const MIN_MATCH_HIGH_LENGTH: usize = 3;

/// Rules shorter than this are "small": exact match only in most cases.
pub const SMALL_RULE: usize = 15;

/// Rules shorter than this are "tiny" and need full-length matches.
pub const TINY_RULE: usize = 6;

/// Compute thresholds over token occurrences.
///
/// Returns `(minimum_coverage, min_matched_length, min_high_matched_length)`.
/// Short rules demand (nearly) complete matches; long rules accept matching
/// a fraction of their text.
pub fn thresholds_occurrences(
    minimum_coverage: Option<u8>,
    length: usize,
    high_length: usize,
) -> (Option<u8>, usize, usize) {
    if minimum_coverage == Some(100) {
        return (minimum_coverage, length, high_length);
    }

    if length < 3 {
        (Some(100), length, high_length)
    } else if length < 10 {
        (Some(80), length, high_length)
    } else if length < 30 {
        (Some(50), length / 2, high_length.min(MIN_MATCH_HIGH_LENGTH))
    } else if length < 200 {
        (
            minimum_coverage,
            MIN_MATCH_LENGTH,
            high_length.min(MIN_MATCH_HIGH_LENGTH),
        )
    } else {
        (minimum_coverage, length / 10, high_length / 10)
    }
}

/// Compute thresholds over unique token ids.
///
/// Returns `(min_matched_length_unique, min_high_matched_length_unique)`.
pub fn thresholds_unique(
    minimum_coverage: Option<u8>,
    length: usize,
    length_unique: usize,
    high_length_unique: usize,
) -> (usize, usize) {
    if minimum_coverage == Some(100) {
        return (length_unique, high_length_unique);
    }

    if length > 200 {
        (length / 10, high_length_unique / 10)
    } else if length < 5 {
        (length_unique, high_length_unique)
    } else if length < 10 {
        (length_unique.saturating_sub(1).max(1), high_length_unique)
    } else if length < 20 {
        (high_length_unique, high_length_unique)
    } else {
        (
            MIN_MATCH_LENGTH,
            high_length_unique.min(MIN_MATCH_HIGH_LENGTH),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrences_explicit_full_coverage() {
        let (cov, min_len, min_high) = thresholds_occurrences(Some(100), 50, 20);
        assert_eq!(cov, Some(100));
        assert_eq!(min_len, 50);
        assert_eq!(min_high, 20);
    }

    #[test]
    fn test_occurrences_tiny_rule_needs_everything() {
        let (cov, min_len, min_high) = thresholds_occurrences(None, 2, 1);
        assert_eq!(cov, Some(100));
        assert_eq!(min_len, 2);
        assert_eq!(min_high, 1);
    }

    #[test]
    fn test_occurrences_short_rule() {
        let (cov, min_len, min_high) = thresholds_occurrences(None, 8, 3);
        assert_eq!(cov, Some(80));
        assert_eq!(min_len, 8);
        assert_eq!(min_high, 3);
    }

    #[test]
    fn test_occurrences_medium_rule() {
        let (cov, min_len, min_high) = thresholds_occurrences(None, 25, 10);
        assert_eq!(cov, Some(50));
        assert_eq!(min_len, 12);
        assert_eq!(min_high, 3);
    }

    #[test]
    fn test_occurrences_large_rule() {
        let (cov, min_len, min_high) = thresholds_occurrences(None, 100, 40);
        assert_eq!(cov, None);
        assert_eq!(min_len, MIN_MATCH_LENGTH);
        assert_eq!(min_high, MIN_MATCH_HIGH_LENGTH);
    }

    #[test]
    fn test_occurrences_very_large_rule_scales() {
        let (cov, min_len, min_high) = thresholds_occurrences(None, 500, 200);
        assert_eq!(cov, None);
        assert_eq!(min_len, 50);
        assert_eq!(min_high, 20);
    }

    #[test]
    fn test_unique_explicit_full_coverage() {
        let (min_len, min_high) = thresholds_unique(Some(100), 50, 30, 15);
        assert_eq!(min_len, 30);
        assert_eq!(min_high, 15);
    }

    #[test]
    fn test_unique_very_large() {
        let (min_len, min_high) = thresholds_unique(None, 500, 300, 150);
        assert_eq!(min_len, 50);
        assert_eq!(min_high, 15);
    }

    #[test]
    fn test_unique_tiny() {
        let (min_len, min_high) = thresholds_unique(None, 3, 2, 1);
        assert_eq!(min_len, 2);
        assert_eq!(min_high, 1);
    }

    #[test]
    fn test_unique_short_allows_one_missing() {
        let (min_len, min_high) = thresholds_unique(None, 8, 5, 3);
        assert_eq!(min_len, 4);
        assert_eq!(min_high, 3);
    }

    #[test]
    fn test_unique_teens_pins_to_high() {
        let (min_len, min_high) = thresholds_unique(None, 15, 10, 5);
        assert_eq!(min_len, 5);
        assert_eq!(min_high, 5);
    }

    #[test]
    fn test_unique_larger() {
        let (min_len, min_high) = thresholds_unique(None, 100, 40, 20);
        assert_eq!(min_len, MIN_MATCH_LENGTH);
        assert_eq!(min_high, MIN_MATCH_HIGH_LENGTH);
    }

    #[test]
    fn test_size_class_constants() {
        assert!(TINY_RULE < SMALL_RULE);
        assert!(MIN_MATCH_HIGH_LENGTH < MIN_MATCH_LENGTH);
    }
}
