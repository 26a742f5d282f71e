//! Match refinement: turn the raw bag of matches from every strategy into
//! a minimal, non-overlapping, ranked result.
//!
//! Steps run in a fixed order: false-positive suppression, merging of
//! same-rule matches split across runs, containment resolution, then
//! ranking. Matches below their rule's thresholds were already dropped at
//! the source by each matcher.

use std::collections::BTreeMap;

use crate::config::MatchConfig;
use crate::index::LicenseIndex;
use crate::models::LicenseMatch;

/// Refine raw matches from all strategies over one query.
pub fn refine_matches(
    index: &LicenseIndex,
    matches: Vec<LicenseMatch>,
    config: &MatchConfig,
) -> Vec<LicenseMatch> {
    if matches.is_empty() {
        return matches;
    }

    let matches: Vec<LicenseMatch> = matches.into_iter().filter(|m| !m.is_empty()).collect();

    let matches = suppress_false_positives(index, matches);
    let matches = merge_same_rule_matches(matches, config.merge_max_dist);
    let mut matches = filter_contained_matches(matches);

    rank_matches(&mut matches);
    matches
}

/// Apply false-positive rules, then drop them.
///
/// A false-positive rule match consumes the weaker matches beneath it:
/// any non-exact match whose query span lies inside the false-positive
/// span is an artifact of innocuous text resembling legalese. The
/// false-positive matches themselves are never findings.
fn suppress_false_positives(
    index: &LicenseIndex,
    matches: Vec<LicenseMatch>,
) -> Vec<LicenseMatch> {
    let fp_spans: Vec<_> = matches
        .iter()
        .filter(|m| index.is_false_positive(m.rid))
        .map(|m| m.qspan.clone())
        .collect();

    if fp_spans.is_empty() {
        return matches
            .into_iter()
            .filter(|m| !index.is_false_positive(m.rid))
            .collect();
    }

    matches
        .into_iter()
        .filter(|m| !index.is_false_positive(m.rid))
        .filter(|m| {
            let consumed = fp_spans
                .iter()
                .any(|fp| m.qspan.is_subset(fp) && m.coverage() < 100.0);
            !consumed
        })
        .collect()
}

/// Merge matches of the same rule whose spans are close.
///
/// This reassembles a rule's text that was split across query runs by
/// interleaved unknown tokens. Matches are merged in ascending start
/// order; both the query-side and the rule-side gap must stay within
/// `max_dist`, and the rule side must progress forward so two distinct
/// occurrences of one rule are not collapsed.
fn merge_same_rule_matches(matches: Vec<LicenseMatch>, max_dist: usize) -> Vec<LicenseMatch> {
    let mut by_rid: BTreeMap<usize, Vec<LicenseMatch>> = BTreeMap::new();
    for m in matches {
        by_rid.entry(m.rid).or_default().push(m);
    }

    let mut merged = Vec::new();
    for (_rid, mut group) in by_rid {
        group.sort_by_key(|m| (m.qspan.start(), m.ispan.start()));

        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };

        for next in iter {
            // the rule side must move strictly forward: two full occurrences
            // of one rule are separate matches, not halves of one
            let rule_side_progresses = next.ispan.start() > current.ispan.end();
            let close_on_rule_side = current.ispan.distance(&next.ispan) <= max_dist;

            let combined = if rule_side_progresses && close_on_rule_side {
                current.qspan.merge_if_close(&next.qspan, max_dist)
            } else {
                None
            };

            match combined {
                Some(qspan) => {
                    current.qspan = qspan;
                    current.ispan = current.ispan.union(&next.ispan);
                    current.hispan = current.hispan.union(&next.hispan);
                    current.start_line = current.start_line.min(next.start_line);
                    current.end_line = current.end_line.max(next.end_line);
                    // the cheaper strategy label wins for the merged match
                    current.matcher = current.matcher.min(next.matcher);
                }
                None => {
                    merged.push(std::mem::replace(&mut current, next));
                }
            }
        }
        merged.push(current);
    }

    merged
}

/// Drop matches contained inside an equal-or-better match.
///
/// Candidates are considered best-first, so on ties (identical spans and
/// coverage) the match with more legalese and higher relevance survives:
/// a rule with no legalese overlap always loses such a tie.
fn filter_contained_matches(matches: Vec<LicenseMatch>) -> Vec<LicenseMatch> {
    if matches.len() < 2 {
        return matches;
    }

    let mut candidates = matches;
    candidates.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then(b.coverage().total_cmp(&a.coverage()))
            .then(b.hilen().cmp(&a.hilen()))
            .then(b.rule_relevance.cmp(&a.rule_relevance))
            .then(a.qstart().cmp(&b.qstart()))
            .then(a.rid.cmp(&b.rid))
    });

    let mut kept: Vec<LicenseMatch> = Vec::with_capacity(candidates.len());
    for m in candidates {
        let contained = kept
            .iter()
            .any(|k| m.qspan.is_subset(&k.qspan) && k.coverage() >= m.coverage());
        if !contained {
            kept.push(m);
        }
    }
    kept
}

/// Final ordering: coverage, then rule relevance, then matched length.
/// The trailing keys make the order total so repeated scans of the same
/// text return identical lists.
fn rank_matches(matches: &mut [LicenseMatch]) {
    matches.sort_by(|a, b| {
        b.coverage()
            .total_cmp(&a.coverage())
            .then(b.rule_relevance.cmp(&a.rule_relevance))
            .then(b.len().cmp(&a.len()))
            .then(b.hilen().cmp(&a.hilen()))
            .then(a.qstart().cmp(&b.qstart()))
            .then(a.rid.cmp(&b.rid))
    });
}
