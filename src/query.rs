//! Query construction: tokenized input text resolved against an index
//! vocabulary.
//!
//! A query tracks the known-token stream plus everything the matchers need
//! around it: line numbers per position, unknown and stopword counts by
//! position, and the split of the stream into runs at long out-of-vocabulary
//! gaps. A query is built against one index and must only be matched against
//! that index's structures.

use std::collections::{HashMap, HashSet};

use crate::config::MatchConfig;
use crate::index::LicenseIndex;
use crate::spans::Span;
use crate::tokenize::{is_short_or_digits, is_stopword, tokenize_keep_stopwords};

/// Tokenized input text bound to the index it was resolved against.
#[derive(Debug)]
pub struct Query<'i> {
    index: &'i LicenseIndex,

    /// Ids of the known tokens, in text order. Unknown tokens and stopwords
    /// are not part of this stream; they are tracked by position below.
    pub tokens: Vec<u16>,

    /// 1-based source line per known-token position
    pub line_by_pos: Vec<usize>,

    /// Count of unknown (out-of-vocabulary) tokens after each known
    /// position; `None` keys tokens before the first known one. Unknown
    /// tokens cannot match exactly but still count toward gap breaking.
    pub unknowns_by_pos: HashMap<Option<usize>, usize>,

    /// Count of stopwords after each known position
    pub stopwords_by_pos: HashMap<Option<usize>, usize>,

    /// Positions holding single-character or digit-only tokens
    pub shorts_and_digits_pos: HashSet<usize>,

    high_matchables: HashSet<usize>,
    low_matchables: HashSet<usize>,

    /// Half-open `[start, end)` token ranges of the query runs
    run_ranges: Vec<(usize, usize)>,
}

impl<'i> Query<'i> {
    /// Tokenize `text` against `index`'s vocabulary.
    ///
    /// Empty text yields an empty query, never an error.
    pub fn new(text: &str, index: &'i LicenseIndex, config: &MatchConfig) -> Self {
        let mut tokens: Vec<u16> = Vec::new();
        let mut line_by_pos: Vec<usize> = Vec::new();
        let mut unknowns_by_pos: HashMap<Option<usize>, usize> = HashMap::new();
        let mut stopwords_by_pos: HashMap<Option<usize>, usize> = HashMap::new();
        let mut shorts_and_digits_pos: HashSet<usize> = HashSet::new();
        let mut run_ranges: Vec<(usize, usize)> = Vec::new();

        let mut run_start = 0usize;
        let mut gap = 0usize;

        for (line_idx, line) in text.lines().enumerate() {
            let line_number = line_idx + 1;
            for word in tokenize_keep_stopwords(line) {
                if is_stopword(&word) {
                    let key = if tokens.is_empty() {
                        None
                    } else {
                        Some(tokens.len() - 1)
                    };
                    *stopwords_by_pos.entry(key).or_insert(0) += 1;
                    gap += 1;
                    continue;
                }

                match index.dictionary.get(&word) {
                    Some(tid) => {
                        let pos = tokens.len();
                        if pos > 0 && gap >= config.run_break_gap {
                            run_ranges.push((run_start, pos));
                            run_start = pos;
                        }
                        gap = 0;
                        tokens.push(tid);
                        line_by_pos.push(line_number);
                        if is_short_or_digits(&word) {
                            shorts_and_digits_pos.insert(pos);
                        }
                    }
                    None => {
                        let key = if tokens.is_empty() {
                            None
                        } else {
                            Some(tokens.len() - 1)
                        };
                        *unknowns_by_pos.entry(key).or_insert(0) += 1;
                        gap += 1;
                    }
                }
            }
        }

        if !tokens.is_empty() {
            run_ranges.push((run_start, tokens.len()));
        }

        let len_legalese = index.len_legalese;
        let mut high_matchables = HashSet::new();
        let mut low_matchables = HashSet::new();
        for (pos, &tid) in tokens.iter().enumerate() {
            if (tid as usize) < len_legalese {
                high_matchables.insert(pos);
            } else {
                low_matchables.insert(pos);
            }
        }

        Query {
            index,
            tokens,
            line_by_pos,
            unknowns_by_pos,
            stopwords_by_pos,
            shorts_and_digits_pos,
            high_matchables,
            low_matchables,
            run_ranges,
        }
    }

    /// The index this query was built against.
    pub fn index(&self) -> &'i LicenseIndex {
        self.index
    }

    /// True when the text produced no known tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of known tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Known-token count, optionally including unknown tokens.
    pub fn tokens_length(&self, with_unknown: bool) -> usize {
        if with_unknown {
            self.tokens.len() + self.unknowns_by_pos.values().sum::<usize>()
        } else {
            self.tokens.len()
        }
    }

    /// Token id at a position.
    #[inline]
    pub fn token_at(&self, pos: usize) -> Option<u16> {
        self.tokens.get(pos).copied()
    }

    /// 1-based source line for a token position.
    #[inline]
    pub fn line_for_pos(&self, pos: usize) -> Option<usize> {
        self.line_by_pos.get(pos).copied()
    }

    /// Count of unknown tokens following a known position (`None` = before
    /// the first known token).
    pub fn unknowns_after(&self, pos: Option<usize>) -> usize {
        self.unknowns_by_pos.get(&pos).copied().unwrap_or(0)
    }

    /// Count of stopwords following a known position.
    pub fn stopwords_after(&self, pos: Option<usize>) -> usize {
        self.stopwords_by_pos.get(&pos).copied().unwrap_or(0)
    }

    /// The half-open run ranges this query was split into.
    pub fn run_ranges(&self) -> &[(usize, usize)] {
        &self.run_ranges
    }

    /// A run covering the whole query.
    pub fn whole_query_run(&self) -> QueryRun<'_, 'i> {
        QueryRun {
            query: self,
            start: 0,
            end: self.tokens.len(),
        }
    }

    /// Runs in text order.
    pub fn query_runs(&self) -> Vec<QueryRun<'_, 'i>> {
        self.run_ranges
            .iter()
            .map(|&(start, end)| QueryRun {
                query: self,
                start,
                end,
            })
            .collect()
    }

    /// True if `pos` has not been consumed by a prior match.
    #[inline]
    pub fn is_matchable(&self, pos: usize) -> bool {
        self.high_matchables.contains(&pos) || self.low_matchables.contains(&pos)
    }

    /// Remove matched positions from the matchable sets so later strategies
    /// do not re-explain the same text.
    pub fn subtract(&mut self, span: &Span) {
        for pos in span.iter() {
            self.high_matchables.remove(&pos);
            self.low_matchables.remove(&pos);
        }
    }

    fn high_matchables_in(&self, start: usize, end: usize) -> HashSet<usize> {
        self.high_matchables
            .iter()
            .copied()
            .filter(|&pos| pos >= start && pos < end)
            .collect()
    }

    fn low_matchables_in(&self, start: usize, end: usize) -> HashSet<usize> {
        self.low_matchables
            .iter()
            .copied()
            .filter(|&pos| pos >= start && pos < end)
            .collect()
    }
}

/// A contiguous slice of a query's token stream.
///
/// Runs carry absolute offsets into the whole query so match spans always
/// translate back to whole-document coordinates.
#[derive(Debug, Clone, Copy)]
pub struct QueryRun<'q, 'i> {
    query: &'q Query<'i>,
    /// Absolute position of the first token of the run
    pub start: usize,
    /// Absolute position one past the last token of the run
    pub end: usize,
}

impl<'q, 'i> QueryRun<'q, 'i> {
    pub fn new(query: &'q Query<'i>, start: usize, end: usize) -> Self {
        Self { query, start, end }
    }

    pub fn query(&self) -> &'q Query<'i> {
        self.query
    }

    pub fn index(&self) -> &'i LicenseIndex {
        self.query.index
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// The run's token ids.
    pub fn tokens(&self) -> &'q [u16] {
        &self.query.tokens[self.start..self.end]
    }

    /// Iterate `(absolute_position, token_id)` over the run.
    pub fn tokens_with_pos(&self) -> impl Iterator<Item = (usize, u16)> + 'q {
        let start = self.start;
        self.tokens()
            .iter()
            .copied()
            .enumerate()
            .map(move |(i, tid)| (start + i, tid))
    }

    /// 1-based line of the run's first token.
    pub fn start_line(&self) -> Option<usize> {
        self.query.line_for_pos(self.start)
    }

    /// 1-based line of the run's last token.
    pub fn end_line(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.query.line_for_pos(self.end - 1)
    }

    /// True when every token of the run is digit-only.
    pub fn is_digits_only(&self) -> bool {
        !self.is_empty()
            && self
                .tokens()
                .iter()
                .all(|tid| self.query.index.digit_only_tids.contains(tid))
    }

    /// Absolute positions still matchable in this run.
    pub fn matchables(&self, include_low: bool) -> HashSet<usize> {
        let mut positions = self.query.high_matchables_in(self.start, self.end);
        if include_low {
            positions.extend(self.query.low_matchables_in(self.start, self.end));
        }
        positions
    }

    /// True if the run still has something to match.
    ///
    /// Runs of digit-only tokens never match: long digit runs are
    /// worst-case input for alignment and carry no license signal.
    pub fn is_matchable(&self, include_low: bool) -> bool {
        if self.is_digits_only() {
            return false;
        }
        !self.matchables(include_low).is_empty()
    }

    /// The run's tokens with unmatchable positions masked to -1.
    ///
    /// Returns an empty vector when no legalese token is matchable: a run
    /// without any high token cannot pass a rule's high minimums.
    pub fn matchable_tokens(&self) -> Vec<i32> {
        if self.query.high_matchables_in(self.start, self.end).is_empty() {
            return Vec::new();
        }
        let matchables = self.matchables(true);
        self.tokens_with_pos()
            .map(|(pos, tid)| {
                if matchables.contains(&pos) {
                    i32::from(tid)
                } else {
                    -1
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexOptions, build_index};
    use crate::models::RuleRecord;

    fn test_index() -> LicenseIndex {
        build_index(
            vec![
                RuleRecord::new(
                    "mit_notice.RULE",
                    "mit",
                    "license copyright permission granted word",
                ),
                RuleRecord::new("nums.RULE", "unknown", "1 2 3"),
            ],
            &IndexOptions::default(),
        )
        .unwrap()
    }

    fn query<'i>(text: &str, index: &'i LicenseIndex) -> Query<'i> {
        Query::new(text, index, &MatchConfig::default())
    }

    #[test]
    fn test_empty_text() {
        let index = test_index();
        let q = query("", &index);
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert!(q.run_ranges().is_empty());
        assert!(q.whole_query_run().is_empty());
    }

    #[test]
    fn test_known_tokens_resolved() {
        let index = test_index();
        let q = query("License copyright permission", &index);
        assert_eq!(q.len(), 3);
        assert_eq!(q.token_at(0), index.dictionary.get("license"));
        assert_eq!(q.token_at(1), index.dictionary.get("copyright"));
    }

    #[test]
    fn test_unknown_tokens_tracked_not_streamed() {
        let index = test_index();
        let q = query("license frobnicate copyright", &index);
        assert_eq!(q.len(), 2);
        assert_eq!(q.unknowns_after(Some(0)), 1);
        assert_eq!(q.unknowns_after(Some(1)), 0);
        assert_eq!(q.tokens_length(true), 3);
        assert_eq!(q.tokens_length(false), 2);
    }

    #[test]
    fn test_leading_unknowns() {
        let index = test_index();
        let q = query("frob nicate license", &index);
        assert_eq!(q.len(), 1);
        assert_eq!(q.unknowns_after(None), 2);
    }

    #[test]
    fn test_stopwords_tracked() {
        let index = test_index();
        let q = query("license div copyright p", &index);
        assert_eq!(q.len(), 2);
        assert_eq!(q.stopwords_after(Some(0)), 1);
        assert_eq!(q.stopwords_after(Some(1)), 1);
    }

    #[test]
    fn test_line_numbers() {
        let index = test_index();
        let q = query("license\n\ncopyright\npermission", &index);
        assert_eq!(q.line_for_pos(0), Some(1));
        assert_eq!(q.line_for_pos(1), Some(3));
        assert_eq!(q.line_for_pos(2), Some(4));
    }

    #[test]
    fn test_shorts_and_digits_positions() {
        let index = test_index();
        let q = query("1 2 license", &index);
        assert!(q.shorts_and_digits_pos.contains(&0));
        assert!(q.shorts_and_digits_pos.contains(&1));
        assert!(!q.shorts_and_digits_pos.contains(&2));
    }

    #[test]
    fn test_single_run_for_plain_text() {
        let index = test_index();
        let q = query("license copyright permission", &index);
        assert_eq!(q.run_ranges(), &[(0, 3)]);
    }

    #[test]
    fn test_run_split_on_unknown_gap() {
        let index = test_index();
        let gap: String = (0..12).map(|i| format!("unk{i} ")).collect();
        let text = format!("license copyright {gap} permission granted");
        let q = query(&text, &index);
        assert_eq!(q.run_ranges().len(), 2);
        assert_eq!(q.run_ranges()[0], (0, 2));
        assert_eq!(q.run_ranges()[1], (2, 4));
    }

    #[test]
    fn test_no_run_split_below_gap_threshold() {
        let index = test_index();
        let text = "license copyright unk1 unk2 unk3 permission";
        let q = query(text, &index);
        assert_eq!(q.run_ranges().len(), 1);
    }

    #[test]
    fn test_run_tokens_and_positions() {
        let index = test_index();
        let q = query("license copyright permission", &index);
        let run = QueryRun::new(&q, 1, 3);
        assert_eq!(run.len(), 2);
        let with_pos: Vec<(usize, u16)> = run.tokens_with_pos().collect();
        assert_eq!(with_pos[0].0, 1);
        assert_eq!(with_pos[1].0, 2);
    }

    #[test]
    fn test_run_lines() {
        let index = test_index();
        let q = query("license\ncopyright", &index);
        let run = q.whole_query_run();
        assert_eq!(run.start_line(), Some(1));
        assert_eq!(run.end_line(), Some(2));
    }

    #[test]
    fn test_digits_only_run_not_matchable() {
        let index = test_index();
        let q = query("1 2 3", &index);
        let run = q.whole_query_run();
        assert!(run.is_digits_only());
        assert!(!run.is_matchable(true));
    }

    #[test]
    fn test_subtract_consumes_positions() {
        let index = test_index();
        let mut q = query("license copyright permission", &index);
        assert!(q.is_matchable(0));
        q.subtract(&Span::from_range(0..2));
        assert!(!q.is_matchable(0));
        assert!(!q.is_matchable(1));
        assert!(q.is_matchable(2));

        let run = q.whole_query_run();
        assert_eq!(run.matchables(true).len(), 1);
    }

    #[test]
    fn test_matchable_tokens_masks_consumed() {
        let index = test_index();
        let mut q = query("license copyright permission", &index);
        q.subtract(&Span::from_range(1..2));
        let run = q.whole_query_run();
        let masked = run.matchable_tokens();
        assert_eq!(masked.len(), 3);
        assert!(masked[0] >= 0);
        assert_eq!(masked[1], -1);
        assert!(masked[2] >= 0);
    }

    #[test]
    fn test_matchable_tokens_empty_without_high() {
        let index = test_index();
        // "word" is a known low-value token in the corpus
        let q = query("word word", &index);
        let run = q.whole_query_run();
        assert!(run.matchable_tokens().is_empty());
    }
}
