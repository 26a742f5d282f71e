//! Exact substring matching with a multi-pattern automaton.
//!
//! Every rule's token-id sequence is a pattern in a double-array
//! Aho-Corasick automaton, so one pass over a query run discovers every
//! whole rule occurring anywhere inside it. Token ids are encoded as two
//! little-endian bytes each since the automaton works on bytes.

use crate::models::{LicenseMatch, MatcherKind};
use crate::index::LicenseIndex;
use crate::query::QueryRun;
use crate::spans::Span;

/// Encode a token-id sequence as bytes, two little-endian bytes per id.
pub(crate) fn tokens_to_bytes(tokens: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(tokens.len() * 2);
    for &token in tokens {
        bytes.extend_from_slice(&token.to_le_bytes());
    }
    bytes
}

/// Match a query run against the rules automaton.
///
/// Every automaton hit is a whole rule found verbatim inside the run, so
/// each match covers 100% of its rule. Hits over positions already consumed
/// by earlier matches are dropped.
pub fn aho_match(index: &LicenseIndex, query_run: &QueryRun<'_, '_>) -> Vec<LicenseMatch> {
    let mut matches = Vec::new();

    if query_run.is_empty() {
        return matches;
    }
    let Some(automaton) = index.automaton() else {
        return matches;
    };

    let encoded = tokens_to_bytes(query_run.tokens());
    let matchables = query_run.matchables(true);

    for hit in automaton.find_overlapping_iter(&encoded) {
        // a pattern found at an odd byte offset straddles token boundaries
        // and is not a token-aligned occurrence
        if hit.start() % 2 != 0 {
            continue;
        }

        let qstart = query_run.start + hit.start() / 2;
        let qend = query_run.start + hit.end() / 2;
        if qend <= qstart {
            continue;
        }
        if !(qstart..qend).all(|pos| matchables.contains(&pos)) {
            continue;
        }

        let pattern_id = hit.value() as usize;
        let Some(rids) = index.rids_by_pattern.get(pattern_id) else {
            continue;
        };

        for &rid in rids {
            let Some(rule) = index.rule(rid) else {
                continue;
            };

            let qspan = Span::from_range(qstart..qend);
            let ispan = Span::from_range(0..rule.length);
            let hispan = Span::new(
                rule.tokens
                    .iter()
                    .enumerate()
                    .filter(|&(_, &tid)| (tid as usize) < index.len_legalese)
                    .map(|(pos, _)| pos),
            );

            let start_line = query_run.query().line_for_pos(qstart).unwrap_or(1);
            let end_line = query_run
                .query()
                .line_for_pos(qend - 1)
                .unwrap_or(start_line);

            matches.push(LicenseMatch {
                rid,
                rule_identifier: rule.identifier.clone(),
                license_expression: rule.license_expression.clone(),
                matcher: MatcherKind::Aho,
                qspan,
                ispan,
                hispan,
                rule_length: rule.length,
                rule_relevance: rule.relevance,
                start_line,
                end_line,
            });
        }
    }

    matches
}
