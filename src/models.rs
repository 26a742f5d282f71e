//! Core data structures: input rule records, indexed rules, and matches.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::spans::Span;

fn default_relevance() -> u8 {
    100
}

/// A parsed rule record as supplied by an external rule-data loader.
///
/// The engine does no file I/O: loaders hand over records in this shape and
/// the index builder turns them into immutable [`Rule`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Unique identifier for this rule (e.g., "mit.LICENSE", "gpl-2.0_12.RULE")
    pub identifier: String,

    /// License expression asserted by a match of this rule
    pub license_expression: String,

    /// Rule text to match
    pub text: String,

    /// Relevance score 0-100 (100 is most relevant)
    #[serde(default = "default_relevance")]
    pub relevance: u8,

    /// Minimum match coverage percentage (0-100) if specified
    #[serde(default)]
    pub minimum_coverage: Option<u8>,

    /// True if this is a full license text (highest confidence)
    #[serde(default)]
    pub is_license_text: bool,

    /// True if this is an explicit notice like "Licensed under the MIT license"
    #[serde(default)]
    pub is_license_notice: bool,

    /// True if this is a reference like a bare name or URL
    #[serde(default)]
    pub is_license_reference: bool,

    /// True if this is a structured licensing tag
    #[serde(default)]
    pub is_license_tag: bool,

    /// True if this is an introductory statement before actual license text
    #[serde(default)]
    pub is_license_intro: bool,

    /// True if matches to this rule are false positives to suppress, not findings
    #[serde(default)]
    pub is_false_positive: bool,

    /// Tokens must appear contiguously for a match to count
    #[serde(default)]
    pub is_continuous: bool,

    /// Natural language of the rule text; None means the primary language
    #[serde(default)]
    pub language: Option<String>,
}

impl RuleRecord {
    /// Minimal record with default metadata, mostly for tests and tooling.
    pub fn new(identifier: &str, license_expression: &str, text: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            license_expression: license_expression.to_string(),
            text: text.to_string(),
            relevance: 100,
            minimum_coverage: None,
            is_license_text: false,
            is_license_notice: false,
            is_license_reference: false,
            is_license_tag: false,
            is_license_intro: false,
            is_false_positive: false,
            is_continuous: false,
            language: None,
        }
    }
}

/// An indexed, immutable rule.
///
/// Built once from a [`RuleRecord`] at index-build time; never mutated
/// during matching. Token ids are resolved against the owning index's
/// dictionary and are meaningless outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Dense rule id, the position of this rule in the index
    pub rid: usize,

    /// Identifier carried over from the source record
    pub identifier: String,

    /// License expression asserted by a match of this rule
    pub license_expression: String,

    /// Token-id sequence of the rule text
    pub tokens: Vec<u16>,

    /// Token count, cached from `tokens.len()`
    pub length: usize,

    /// Relevance score 0-100
    pub relevance: u8,

    /// Minimum match coverage percentage, possibly tightened at build time
    pub minimum_coverage: Option<u8>,

    pub is_license_text: bool,
    pub is_license_notice: bool,
    pub is_license_reference: bool,
    pub is_license_tag: bool,
    pub is_license_intro: bool,
    pub is_false_positive: bool,
    pub is_continuous: bool,

    /// Natural language of the rule text; None means the primary language
    pub language: Option<String>,

    /// Total count of legalese token occurrences
    pub high_length: usize,

    /// Count of unique token ids
    pub length_unique: usize,

    /// Count of unique legalese token ids
    pub high_length_unique: usize,

    /// Minimum matched token count for a match to be acceptable
    pub min_matched_length: usize,

    /// Minimum matched legalese token count
    pub min_high_matched_length: usize,

    /// Minimum unique matched token count
    pub min_matched_length_unique: usize,

    /// Minimum unique matched legalese token count
    pub min_high_matched_length_unique: usize,

    /// True if length < SMALL_RULE
    pub is_small: bool,

    /// True if length < TINY_RULE
    pub is_tiny: bool,
}

impl Rule {
    /// True if the rule has no legalese token at all.
    ///
    /// Weak rules are indexed and can match exactly, but never take part in
    /// approximate matching and lose ties during refinement.
    pub fn is_weak(&self) -> bool {
        self.high_length == 0
    }
}

/// The matching strategy that produced a match, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum MatcherKind {
    /// Whole-run content hash lookup
    #[strum(serialize = "1-hash")]
    Hash,
    /// Automaton exact substring match
    #[strum(serialize = "2-aho")]
    Aho,
    /// Approximate sequence alignment
    #[strum(serialize = "3-seq")]
    Seq,
}

/// One match of a rule inside a query.
///
/// Produced by matchers, filtered and merged by refinement, then returned
/// ranked to the caller. Spans use token positions: `qspan` in query space,
/// `ispan` in rule space, `hispan` the subset of `ispan` on legalese rule
/// positions.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseMatch {
    /// Id of the matched rule in the index the match was made against
    pub rid: usize,

    /// Identifier of the matched rule
    pub rule_identifier: String,

    /// License expression asserted by the matched rule
    pub license_expression: String,

    /// Strategy that produced this match
    pub matcher: MatcherKind,

    /// Matched token positions in query space
    pub qspan: Span,

    /// Matched token positions in rule space
    pub ispan: Span,

    /// Subset of `ispan` restricted to legalese rule positions
    pub hispan: Span,

    /// Token count of the matched rule
    pub rule_length: usize,

    /// Relevance of the matched rule
    pub rule_relevance: u8,

    /// 1-based line of the first matched token in the source text
    pub start_line: usize,

    /// 1-based line of the last matched token in the source text
    pub end_line: usize,
}

impl LicenseMatch {
    /// Number of matched query tokens.
    pub fn len(&self) -> usize {
        self.qspan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qspan.is_empty()
    }

    /// First matched query token position.
    pub fn qstart(&self) -> usize {
        self.qspan.start()
    }

    /// Last matched query token position.
    pub fn qend(&self) -> usize {
        self.qspan.end()
    }

    /// Number of matched legalese tokens.
    pub fn hilen(&self) -> usize {
        self.hispan.len()
    }

    /// Fraction of the rule's tokens accounted for by this match, as a
    /// percentage in 0.0..=100.0.
    pub fn coverage(&self) -> f32 {
        if self.rule_length == 0 {
            return 0.0;
        }
        (self.ispan.len() as f32 / self.rule_length as f32) * 100.0
    }

    /// Final score: coverage weighted by the rule's relevance.
    pub fn score(&self) -> f32 {
        self.coverage() * self.rule_relevance as f32 / 100.0
    }

    /// Flatten into the serializable record handed to formatting layers.
    pub fn to_record(&self) -> MatchRecord {
        MatchRecord {
            rule_identifier: self.rule_identifier.clone(),
            license_expression: self.license_expression.clone(),
            matcher: self.matcher.to_string(),
            query_start: self.qstart(),
            query_end: self.qend(),
            rule_start: self.ispan.start(),
            rule_end: self.ispan.end(),
            matched_length: self.len(),
            coverage_percent: self.coverage(),
            relevance_score: self.score(),
            start_line: self.start_line,
            end_line: self.end_line,
        }
    }
}

/// Flat match record consumed by external result-formatting layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub rule_identifier: String,
    pub license_expression: String,
    pub matcher: String,
    pub query_start: usize,
    pub query_end: usize,
    pub rule_start: usize,
    pub rule_end: usize,
    pub matched_length: usize,
    pub coverage_percent: f32,
    pub relevance_score: f32,
    pub start_line: usize,
    pub end_line: usize,
}
