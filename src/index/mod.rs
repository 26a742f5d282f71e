//! License index construction and structures.

pub mod builder;
pub mod dictionary;
pub mod token_sets;

use bit_set::BitSet;
use daachorse::DoubleArrayAhoCorasick;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::index::dictionary::TokenDictionary;
use crate::models::Rule;

pub use builder::build_index;

/// Options controlling what goes into a built index.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Additional rule records indexed alongside the built-in corpus,
    /// e.g. from user-provided rule directories.
    pub extra_rules: Vec<crate::models::RuleRecord>,

    /// Ignore `extra_rules` and index the built-in corpus only.
    pub builtin_only: bool,

    /// Index rules in every language instead of the primary language only.
    pub all_languages: bool,
}

/// The in-memory index all matching runs against.
///
/// Owns the vocabulary, the rule corpus, the hash-to-rule map, the
/// multi-pattern automaton, and the per-token postings and per-rule
/// bit-vectors used for candidate prefiltering. Built once, then read
/// concurrently by any number of scans; a rebuild constructs a whole new
/// index and swaps it in, never mutating this one.
pub struct LicenseIndex {
    /// Token dictionary shared by rules and queries built against this index
    pub dictionary: TokenDictionary,

    /// Number of reserved legalese ids; token ids below this are high-value
    pub len_legalese: usize,

    /// Token ids whose text is entirely digits
    pub digit_only_tids: HashSet<u16>,

    /// All rules, indexed by rule id
    pub rules_by_rid: Vec<Rule>,

    /// Token-sequence hash to rule id, for whole-run exact matching.
    /// False-positive rules are excluded: they only match via the automaton.
    pub rid_by_hash: HashMap<[u8; 20], usize>,

    /// Multi-pattern automaton over byte-encoded rule token sequences.
    /// None when the index holds no rules.
    pub(crate) automaton: Option<DoubleArrayAhoCorasick<u32>>,

    /// Rule ids per automaton pattern. Distinct rules with identical token
    /// sequences share one deduplicated pattern.
    pub rids_by_pattern: Vec<Vec<usize>>,

    /// Postings: token id to the ids of rules containing it
    pub rids_by_tid: HashMap<u16, Vec<usize>>,

    /// Unique-token sets per regular rule
    pub sets_by_rid: HashMap<usize, HashSet<u16>>,

    /// Token multisets per regular rule
    pub msets_by_rid: HashMap<usize, HashMap<u16, usize>>,

    /// Legalese-token bit-vectors per approx-matchable rule, for the
    /// candidate prefilter
    pub high_bits_by_rid: HashMap<usize, BitSet>,

    /// Ids of regular (non-false-positive) rules
    pub regular_rids: HashSet<usize>,

    /// Ids of false-positive suppression rules
    pub false_positive_rids: HashSet<usize>,

    /// Ids of rules that take part in approximate matching
    pub approx_matchable_rids: HashSet<usize>,
}

impl LicenseIndex {
    /// The rule for a rule id.
    pub fn rule(&self, rid: usize) -> Option<&Rule> {
        self.rules_by_rid.get(rid)
    }

    /// Number of indexed rules.
    pub fn len(&self) -> usize {
        self.rules_by_rid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules_by_rid.is_empty()
    }

    /// True if `rid` is a false-positive suppression rule.
    pub fn is_false_positive(&self, rid: usize) -> bool {
        self.false_positive_rids.contains(&rid)
    }

    pub(crate) fn automaton(&self) -> Option<&DoubleArrayAhoCorasick<u32>> {
        self.automaton.as_ref()
    }
}

impl fmt::Debug for LicenseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseIndex")
            .field("rules", &self.rules_by_rid.len())
            .field("tokens", &self.dictionary.len())
            .field("len_legalese", &self.len_legalese)
            .field("regular", &self.regular_rids.len())
            .field("false_positive", &self.false_positive_rids.len())
            .field("approx_matchable", &self.approx_matchable_rids.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleRecord;

    #[test]
    fn test_empty_index() {
        let index = build_index(vec![], &IndexOptions::default()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.automaton().is_none());
        assert!(index.rid_by_hash.is_empty());
    }

    #[test]
    fn test_index_debug_is_compact() {
        let records = vec![RuleRecord::new("mit_1.RULE", "mit", "MIT License")];
        let index = build_index(records, &IndexOptions::default()).unwrap();
        let debug = format!("{index:?}");
        assert!(debug.contains("rules: 1"));
    }

    #[test]
    fn test_index_rule_lookup() {
        let records = vec![RuleRecord::new("mit_1.RULE", "mit", "MIT License")];
        let index = build_index(records, &IndexOptions::default()).unwrap();
        assert_eq!(index.rule(0).unwrap().identifier, "mit_1.RULE");
        assert!(index.rule(1).is_none());
    }
}
