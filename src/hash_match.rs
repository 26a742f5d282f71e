//! Whole-run exact matching by content hash.
//!
//! The cheapest and most confident strategy: hash the run's token sequence
//! and look it up in the index. A hit means the run is, token for token,
//! exactly one indexed rule.

use sha1::{Digest, Sha1};

use crate::models::{LicenseMatch, MatcherKind};
use crate::index::LicenseIndex;
use crate::query::QueryRun;
use crate::spans::Span;

/// SHA1 digest of a token sequence, hashing each id as little-endian bytes.
pub fn compute_hash(tokens: &[u16]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    for &token in tokens {
        hasher.update(token.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Match a query run against the index's hash map.
///
/// Returns at most one match covering the entire run and the entire rule.
/// Degenerate (empty) runs return no matches.
pub fn hash_match(index: &LicenseIndex, query_run: &QueryRun<'_, '_>) -> Vec<LicenseMatch> {
    if query_run.is_empty() {
        return Vec::new();
    }

    let hash = compute_hash(query_run.tokens());
    let Some(&rid) = index.rid_by_hash.get(&hash) else {
        return Vec::new();
    };
    let Some(rule) = index.rule(rid) else {
        return Vec::new();
    };

    let qspan = Span::from_range(query_run.start..query_run.end);
    let ispan = Span::from_range(0..rule.length);
    let hispan = Span::new(
        rule.tokens
            .iter()
            .enumerate()
            .filter(|&(_, &tid)| (tid as usize) < index.len_legalese)
            .map(|(pos, _)| pos),
    );

    let start_line = query_run.start_line().unwrap_or(1);
    let end_line = query_run.end_line().unwrap_or(start_line);

    vec![LicenseMatch {
        rid,
        rule_identifier: rule.identifier.clone(),
        license_expression: rule.license_expression.clone(),
        matcher: MatcherKind::Hash,
        qspan,
        ispan,
        hispan,
        rule_length: rule.length,
        rule_relevance: rule.relevance,
        start_line,
        end_line,
    }]
}
