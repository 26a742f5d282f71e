//! Approximate sequence matching.
//!
//! The most expensive strategy, bounded in two ways: a bit-vector/postings
//! prefilter shortlists only rules sharing enough high-value tokens with
//! the run, and the alignment itself tolerates token gaps only up to a
//! configured maximum on either side before the chain is terminated.

use std::collections::HashMap;

use crate::config::MatchConfig;
use crate::index::token_sets::{bit_intersection_len, build_set_and_mset, high_bitvec};
use crate::index::LicenseIndex;
use crate::models::{LicenseMatch, MatcherKind};
use crate::query::QueryRun;
use crate::spans::Span;

/// Similarity of a query run to one candidate rule.
///
/// Candidates are ranked by containment (how much of the rule the run
/// holds), then resemblance, then raw matched count.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Similarity {
    containment: f32,
    resemblance: f32,
    matched: usize,
}

/// Shortlist rules worth aligning against this run, best first.
///
/// A rule qualifies only when the run shares at least the rule's minimum
/// count of unique high-value tokens, computed by intersecting legalese
/// bit-vectors. The shortlist is capped at `top` entries.
pub(crate) fn compute_candidates(
    index: &LicenseIndex,
    query_run: &QueryRun<'_, '_>,
    top: usize,
) -> Vec<usize> {
    let masked = query_run.matchable_tokens();
    if masked.is_empty() {
        return Vec::new();
    }

    let query_tids: Vec<u16> = masked
        .iter()
        .filter(|&&t| t >= 0)
        .map(|&t| t as u16)
        .collect();
    if query_tids.is_empty() {
        return Vec::new();
    }

    let (qset, qmset) = build_set_and_mset(&query_tids);
    let qbits = high_bitvec(query_tids.iter().copied(), index.len_legalese);
    let qlen = query_tids.len();

    // walk the postings of the run's legalese tokens: any rule not listed
    // there shares no high token with the run and can never qualify
    let mut rids: Vec<usize> = qset
        .iter()
        .filter(|&&tid| (tid as usize) < index.len_legalese)
        .filter_map(|tid| index.rids_by_tid.get(tid))
        .flatten()
        .copied()
        .filter(|rid| index.approx_matchable_rids.contains(rid))
        .collect();
    rids.sort_unstable();
    rids.dedup();

    let mut scored: Vec<(usize, Similarity)> = Vec::new();
    for rid in rids {
        let Some(rule) = index.rule(rid) else {
            continue;
        };
        let Some(rule_bits) = index.high_bits_by_rid.get(&rid) else {
            continue;
        };

        let high_overlap = bit_intersection_len(&qbits, rule_bits);
        if high_overlap < rule.min_high_matched_length_unique.max(1) {
            continue;
        }

        let Some(rule_mset) = index.msets_by_rid.get(&rid) else {
            continue;
        };

        // multiset intersection: per-token occurrence overlap
        let matched: usize = qset
            .iter()
            .filter_map(|tid| {
                let qcount = qmset.get(tid)?;
                let rcount = rule_mset.get(tid)?;
                Some(qcount.min(rcount))
            })
            .sum();
        if matched == 0 {
            continue;
        }

        let union = qlen + rule.length - matched;
        let resemblance = matched as f32 / union as f32;
        let containment = matched as f32 / rule.length as f32;

        scored.push((
            rid,
            Similarity {
                containment,
                resemblance,
                matched,
            },
        ));
    }

    scored.sort_by(|(a_rid, a), (b_rid, b)| {
        b.containment
            .total_cmp(&a.containment)
            .then(b.resemblance.total_cmp(&a.resemblance))
            .then(b.matched.cmp(&a.matched))
            .then(a_rid.cmp(b_rid))
    });
    scored.truncate(top);
    scored.into_iter().map(|(rid, _)| rid).collect()
}

/// One aligned chain: matched positions relative to the aligned slices.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Chain {
    qpos: Vec<usize>,
    ipos: Vec<usize>,
}

/// Greedy gapped alignment of masked query tokens against a rule.
///
/// Walks the query left to right pairing each matchable token with the
/// next compatible rule position. A small number of insertions or
/// substitutions on either side only skips positions; a gap exceeding
/// `max_gap` on the query side or the rule side terminates the chain and a
/// fresh one starts at the next anchor.
fn align_gapped(masked_query: &[i32], rule_tokens: &[u16], max_gap: usize) -> Vec<Chain> {
    let mut chains = Vec::new();
    if masked_query.is_empty() || rule_tokens.is_empty() {
        return chains;
    }

    let mut positions_by_tid: HashMap<i32, Vec<usize>> = HashMap::new();
    for (pos, &tid) in rule_tokens.iter().enumerate() {
        positions_by_tid.entry(i32::from(tid)).or_default().push(pos);
    }

    let mut current = Chain {
        qpos: Vec::new(),
        ipos: Vec::new(),
    };

    for (q, &qt) in masked_query.iter().enumerate() {
        if qt < 0 {
            continue;
        }
        let Some(rule_positions) = positions_by_tid.get(&qt) else {
            continue;
        };

        if current.qpos.is_empty() {
            current.qpos.push(q);
            current.ipos.push(rule_positions[0]);
            continue;
        }

        let last_q = *current.qpos.last().unwrap_or(&0);
        let last_i = *current.ipos.last().unwrap_or(&0);

        let qgap = q - last_q - 1;
        if qgap > max_gap {
            chains.push(std::mem::replace(
                &mut current,
                Chain {
                    qpos: vec![q],
                    ipos: vec![rule_positions[0]],
                },
            ));
            continue;
        }

        match rule_positions.iter().find(|&&r| r > last_i) {
            Some(&r) if r - last_i - 1 <= max_gap => {
                current.qpos.push(q);
                current.ipos.push(r);
            }
            // the token occurs in the rule but not within reach: treat it
            // as noise and keep the chain open
            _ => {}
        }
    }

    if !current.qpos.is_empty() {
        chains.push(current);
    }

    chains
}

/// Align the run against the shortlisted candidate rules.
///
/// Matches below a rule's stored minimums (matched length, legalese count,
/// coverage) are discarded here at the source and never reach refinement.
pub fn seq_match(
    index: &LicenseIndex,
    query_run: &QueryRun<'_, '_>,
    config: &MatchConfig,
) -> Vec<LicenseMatch> {
    let mut matches = Vec::new();

    let masked = query_run.matchable_tokens();
    if masked.is_empty() {
        return matches;
    }

    let candidates = compute_candidates(index, query_run, config.max_candidates);

    for rid in candidates {
        let Some(rule) = index.rule(rid) else {
            continue;
        };

        for chain in align_gapped(&masked, &rule.tokens, config.max_gap) {
            let matched = chain.ipos.len();
            if matched < rule.min_matched_length {
                continue;
            }

            let high_matched = chain
                .ipos
                .iter()
                .filter(|&&pos| (rule.tokens[pos] as usize) < index.len_legalese)
                .count();
            if high_matched < rule.min_high_matched_length {
                continue;
            }

            let coverage = (matched as f32 / rule.length as f32) * 100.0;
            // rules without an explicit minimum still need half their text:
            // below that an alignment is a scattering of common legal words
            let minimum = rule.minimum_coverage.unwrap_or(50);
            if coverage < minimum as f32 {
                continue;
            }

            let qspan = Span::new(chain.qpos.iter().map(|&q| query_run.start + q));
            let ispan = Span::new(chain.ipos.iter().copied());
            let hispan = Span::new(
                chain
                    .ipos
                    .iter()
                    .copied()
                    .filter(|&pos| (rule.tokens[pos] as usize) < index.len_legalese),
            );

            let start_line = query_run.query().line_for_pos(qspan.start()).unwrap_or(1);
            let end_line = query_run
                .query()
                .line_for_pos(qspan.end())
                .unwrap_or(start_line);

            matches.push(LicenseMatch {
                rid,
                rule_identifier: rule.identifier.clone(),
                license_expression: rule.license_expression.clone(),
                matcher: MatcherKind::Seq,
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
