//! Index builder.
//!
//! Turns a corpus of rule records into a [`LicenseIndex`]: assigns
//! vocabulary ids legalese-first, hashes every rule's token sequence,
//! builds the multi-pattern automaton, and derives the postings,
//! bit-vectors, and per-rule thresholds used by the matchers.

use anyhow::{Context, Result, anyhow};
use bit_set::BitSet;
use daachorse::DoubleArrayAhoCorasick;
use log::warn;
use std::collections::{HashMap, HashSet};

use crate::aho_match::tokens_to_bytes;
use crate::hash_match::compute_hash;
use crate::index::dictionary::TokenDictionary;
use crate::index::token_sets::{
    build_set_and_mset, high_bitvec, high_mset_subset, high_set_subset, multiset_len,
};
use crate::index::{IndexOptions, LicenseIndex};
use crate::models::{Rule, RuleRecord};
use crate::rules::legalese::legalese_words;
use crate::rules::thresholds::{
    SMALL_RULE, TINY_RULE, thresholds_occurrences, thresholds_unique,
};
use crate::rules::{assemble_corpus, validate_record};
use crate::tokenize::tokenize;

/// Build an index from parsed rule records.
///
/// Malformed records are skipped with a warning and the build continues; a
/// duplicate token sequence is a warning with the later rule taking over
/// the exact-hash mapping. The build fails only on conditions no rule data
/// should produce, such as vocabulary id exhaustion.
pub fn build_index(records: Vec<RuleRecord>, options: &IndexOptions) -> Result<LicenseIndex> {
    let records = assemble_corpus(records, options);

    let mut dictionary = TokenDictionary::with_legalese(legalese_words());
    let len_legalese = dictionary.len_legalese();

    let mut digit_only_tids: HashSet<u16> = HashSet::new();
    let mut rules_by_rid: Vec<Rule> = Vec::with_capacity(records.len());
    let mut rid_by_hash: HashMap<[u8; 20], usize> = HashMap::with_capacity(records.len());
    let mut rids_by_tid: HashMap<u16, Vec<usize>> = HashMap::new();
    let mut sets_by_rid: HashMap<usize, HashSet<u16>> = HashMap::new();
    let mut msets_by_rid: HashMap<usize, HashMap<u16, usize>> = HashMap::new();
    let mut high_bits_by_rid: HashMap<usize, BitSet> = HashMap::new();
    let mut regular_rids: HashSet<usize> = HashSet::new();
    let mut false_positive_rids: HashSet<usize> = HashSet::new();
    let mut approx_matchable_rids: HashSet<usize> = HashSet::new();

    let mut patterns: Vec<Vec<u8>> = Vec::with_capacity(records.len());
    let mut pattern_id_by_bytes: HashMap<Vec<u8>, usize> = HashMap::new();
    let mut rids_by_pattern: Vec<Vec<usize>> = Vec::new();

    let mut skipped = 0usize;

    for record in records {
        if let Err(err) = validate_record(&record) {
            warn!("skipping malformed rule: {err:#}");
            skipped += 1;
            continue;
        }

        let words = tokenize(&record.text);
        if words.is_empty() {
            warn!(
                "skipping rule '{}': text has no indexable tokens",
                record.identifier
            );
            skipped += 1;
            continue;
        }

        let mut tokens: Vec<u16> = Vec::with_capacity(words.len());
        for word in &words {
            let tid = dictionary
                .get_or_assign(word)
                .with_context(|| format!("indexing rule '{}'", record.identifier))?;
            if word.chars().all(|c| c.is_ascii_digit()) {
                digit_only_tids.insert(tid);
            }
            tokens.push(tid);
        }

        let rid = rules_by_rid.len();
        let (rule, set, mset) = finish_rule(rid, record, tokens, len_legalese);

        let pattern = tokens_to_bytes(&rule.tokens);
        let pattern_id = *pattern_id_by_bytes.entry(pattern.clone()).or_insert_with(|| {
            patterns.push(pattern);
            rids_by_pattern.push(Vec::new());
            patterns.len() - 1
        });
        rids_by_pattern[pattern_id].push(rid);

        if rule.is_false_positive {
            false_positive_rids.insert(rid);
            rules_by_rid.push(rule);
            continue;
        }

        let hash = compute_hash(&rule.tokens);
        if let Some(prev) = rid_by_hash.insert(hash, rid) {
            warn!(
                "rule '{}' duplicates the token sequence of '{}'; the later rule wins exact-hash matching",
                rule.identifier, rules_by_rid[prev].identifier
            );
        }
        regular_rids.insert(rid);

        for &tid in &set {
            rids_by_tid.entry(tid).or_default().push(rid);
        }

        if is_approx_matchable(&rule) {
            approx_matchable_rids.insert(rid);
            high_bits_by_rid.insert(rid, high_bitvec(set.iter().copied(), len_legalese));
        }

        sets_by_rid.insert(rid, set);
        msets_by_rid.insert(rid, mset);
        rules_by_rid.push(rule);
    }

    if skipped > 0 {
        warn!("{skipped} rule record(s) were skipped during index build");
    }

    let automaton = if patterns.is_empty() {
        None
    } else {
        let patvals = patterns
            .iter()
            .enumerate()
            .map(|(id, pattern)| (pattern.as_slice(), id as u32));
        Some(
            DoubleArrayAhoCorasick::with_values(patvals)
                .map_err(|err| anyhow!("failed to build the rules automaton: {err}"))?,
        )
    };

    Ok(LicenseIndex {
        dictionary,
        len_legalese,
        digit_only_tids,
        rules_by_rid,
        rid_by_hash,
        automaton,
        rids_by_pattern,
        rids_by_tid,
        sets_by_rid,
        msets_by_rid,
        high_bits_by_rid,
        regular_rids,
        false_positive_rids,
        approx_matchable_rids,
    })
}

/// Derive the rule's counts, size class, and minimum-match thresholds.
/// Returns the rule along with its token set and multiset so the caller
/// can index them without recomputing.
fn finish_rule(
    rid: usize,
    record: RuleRecord,
    tokens: Vec<u16>,
    len_legalese: usize,
) -> (Rule, HashSet<u16>, HashMap<u16, usize>) {
    let length = tokens.len();
    let (set, mset) = build_set_and_mset(&tokens);
    let high_set = high_set_subset(&set, len_legalese);
    let high_mset = high_mset_subset(&mset, len_legalese);

    let length_unique = set.len();
    let high_length_unique = high_set.len();
    let high_length = multiset_len(&high_mset);

    let is_small = length < SMALL_RULE;
    let is_tiny = length < TINY_RULE;

    let (minimum_coverage, min_matched_length, min_high_matched_length) =
        thresholds_occurrences(record.minimum_coverage, length, high_length);
    let (min_matched_length_unique, min_high_matched_length_unique) =
        thresholds_unique(minimum_coverage, length, length_unique, high_length_unique);

    let rule = Rule {
        rid,
        identifier: record.identifier,
        license_expression: record.license_expression,
        tokens,
        length,
        relevance: record.relevance,
        minimum_coverage,
        is_license_text: record.is_license_text,
        is_license_notice: record.is_license_notice,
        is_license_reference: record.is_license_reference,
        is_license_tag: record.is_license_tag,
        is_license_intro: record.is_license_intro,
        is_false_positive: record.is_false_positive,
        is_continuous: record.is_continuous,
        language: record.language,
        high_length,
        length_unique,
        high_length_unique,
        min_matched_length,
        min_high_matched_length,
        min_matched_length_unique,
        min_high_matched_length_unique,
        is_small,
        is_tiny,
    };
    (rule, set, mset)
}

/// Rules eligible for approximate matching.
///
/// Tiny and continuous rules must match exactly; small references and tags
/// are too short to align reliably; weak rules (no legalese at all) would
/// flood the candidate set with noise.
fn is_approx_matchable(rule: &Rule) -> bool {
    !(rule.is_false_positive
        || rule.is_tiny
        || rule.is_continuous
        || (rule.is_small && (rule.is_license_reference || rule.is_license_tag))
        || rule.is_weak())
}
