//! The scanning engine: a shareable index plus the matching pipeline.
//!
//! The engine owns the active index behind an atomically swapped shared
//! reference. Scans capture the reference once and run entirely against
//! that snapshot, so a concurrent rebuild never exposes a half-built
//! structure to an in-flight scan.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use rayon::prelude::*;

use crate::aho_match::aho_match;
use crate::config::MatchConfig;
use crate::hash_match::hash_match;
use crate::index::{IndexOptions, LicenseIndex, build_index};
use crate::match_refine::refine_matches;
use crate::models::{LicenseMatch, RuleRecord};
use crate::query::{Query, QueryRun};

/// License matching engine.
///
/// Build once from a rule corpus, then scan any number of texts, from any
/// number of threads. `rebuild` replaces the index wholesale.
#[derive(Debug)]
pub struct Engine {
    index: RwLock<Arc<LicenseIndex>>,
    config: MatchConfig,
}

impl Engine {
    /// Build an engine from parsed rule records with default tuning.
    pub fn new(records: Vec<RuleRecord>, options: &IndexOptions) -> Result<Self> {
        Self::with_config(records, options, MatchConfig::default())
    }

    /// Build an engine with explicit tuning parameters.
    pub fn with_config(
        records: Vec<RuleRecord>,
        options: &IndexOptions,
        config: MatchConfig,
    ) -> Result<Self> {
        let index = build_index(records, options)?;
        Ok(Self {
            index: RwLock::new(Arc::new(index)),
            config,
        })
    }

    /// Snapshot of the active index.
    ///
    /// The returned reference stays valid across rebuilds; it simply keeps
    /// pointing at the index it was taken from.
    pub fn index(&self) -> Arc<LicenseIndex> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Build a replacement index and swap it in atomically.
    ///
    /// New scans block until the new index is fully constructed; scans
    /// already running finish against their captured snapshot. On build
    /// failure the active index is left untouched.
    pub fn rebuild(&self, records: Vec<RuleRecord>, options: &IndexOptions) -> Result<()> {
        let fresh = Arc::new(build_index(records, options)?);
        let mut guard = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
        Ok(())
    }

    /// Scan one text, returning the full ranked match list.
    ///
    /// An empty list is a valid result meaning no rule was detected.
    pub fn scan(&self, text: &str) -> Result<Vec<LicenseMatch>> {
        let index = self.index();
        detect(&index, text, &self.config)
    }

    /// Scan many independent texts in parallel against one snapshot.
    ///
    /// Each text produces its own full result or its own error; one failing
    /// text does not abort the others.
    pub fn scan_batch(&self, texts: &[&str]) -> Vec<Result<Vec<LicenseMatch>>> {
        let index = self.index();
        texts
            .par_iter()
            .map(|text| detect(&index, text, &self.config))
            .collect()
    }
}

/// Run the full matching pipeline for one text against one index.
///
/// Strategies run per query run in order of decreasing cheapness: exact
/// hash short-circuits a run, automaton matches consume their positions,
/// and approximate matching aligns whatever is left. The raw matches are
/// then refined into the final ranked list.
pub fn detect(
    index: &LicenseIndex,
    text: &str,
    config: &MatchConfig,
) -> Result<Vec<LicenseMatch>> {
    let mut query = Query::new(text, index, config);
    if query.is_empty() {
        return Ok(Vec::new());
    }

    // the whole text being exactly one rule is common enough (LICENSE
    // files) to settle before any per-run work
    {
        let whole = query.whole_query_run();
        let hits = hash_match(index, &whole);
        if !hits.is_empty() {
            return Ok(hits);
        }
    }

    let mut all_matches: Vec<LicenseMatch> = Vec::new();
    let run_ranges = query.run_ranges().to_vec();

    for (start, end) in run_ranges {
        let hash_hits = {
            let run = QueryRun::new(&query, start, end);
            if run.is_matchable(true) {
                hash_match(index, &run)
            } else {
                Vec::new()
            }
        };
        if !hash_hits.is_empty() {
            for m in &hash_hits {
                query.subtract(&m.qspan);
            }
            all_matches.extend(hash_hits);
            continue;
        }

        let aho_hits = {
            let run = QueryRun::new(&query, start, end);
            aho_match(index, &run)
        };
        for m in &aho_hits {
            // false-positive spans stay matchable: suppression is decided
            // during refinement, not here
            if !index.is_false_positive(m.rid) {
                query.subtract(&m.qspan);
            }
        }
        all_matches.extend(aho_hits);

        let seq_hits = {
            let run = QueryRun::new(&query, start, end);
            crate::seq_match::seq_match(index, &run, config)
        };
        all_matches.extend(seq_hits);
    }

    Ok(refine_matches(index, all_matches, config))
}
