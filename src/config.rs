//! Tuning parameters for matching.
//!
//! The gap and distance bounds below gate approximate matching and match
//! merging. They are deliberately configuration, not hard-coded constants:
//! callers with unusual corpora (very long rules, noisy inputs) can widen
//! or tighten them.

/// Knobs for query building, approximate matching, and match refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Number of consecutive unknown or stopword tokens that splits the
    /// query token stream into separate runs. Long stretches of
    /// out-of-vocabulary text behave like paragraph breaks: no single rule
    /// is expected to span them.
    pub run_break_gap: usize,

    /// Maximum gap, in token positions on either the query side or the rule
    /// side, tolerated between consecutive matched tokens during sequence
    /// alignment. A larger gap terminates the alignment chain.
    pub max_gap: usize,

    /// Maximum distance between two same-rule matches for them to be merged
    /// into one during refinement.
    pub merge_max_dist: usize,

    /// Cap on the number of candidate rules shortlisted for sequence
    /// matching per query run.
    pub max_candidates: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            run_break_gap: 10,
            max_gap: 15,
            merge_max_dist: 120,
            max_candidates: 30,
        }
    }
}
