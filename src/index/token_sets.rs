//! Token set, multiset, and bit-vector helpers for candidate selection.

use bit_set::BitSet;
use std::collections::{HashMap, HashSet};

/// Build the unique-token set and the token multiset of a token sequence.
pub fn build_set_and_mset(token_ids: &[u16]) -> (HashSet<u16>, HashMap<u16, usize>) {
    let mut mset: HashMap<u16, usize> = HashMap::new();
    for &tid in token_ids {
        *mset.entry(tid).or_insert(0) += 1;
    }
    let set: HashSet<u16> = mset.keys().copied().collect();
    (set, mset)
}

/// Total number of token occurrences in a multiset.
pub fn multiset_len(mset: &HashMap<u16, usize>) -> usize {
    mset.values().sum()
}

/// Subset of a token set holding only legalese ids.
pub fn high_set_subset(set: &HashSet<u16>, len_legalese: usize) -> HashSet<u16> {
    set.iter()
        .copied()
        .filter(|&tid| (tid as usize) < len_legalese)
        .collect()
}

/// Subset of a multiset holding only legalese ids.
pub fn high_mset_subset(mset: &HashMap<u16, usize>, len_legalese: usize) -> HashMap<u16, usize> {
    mset.iter()
        .filter(|(tid, _)| (**tid as usize) < len_legalese)
        .map(|(&tid, &count)| (tid, count))
        .collect()
}

/// Fixed-width bit-vector with one bit per legalese token id present.
///
/// Candidate prefiltering intersects a rule's bit-vector with the query's
/// and counts set bits, which is much cheaper than a set intersection.
pub fn high_bitvec<I: IntoIterator<Item = u16>>(token_ids: I, len_legalese: usize) -> BitSet {
    let mut bits = BitSet::with_capacity(len_legalese);
    for tid in token_ids {
        if (tid as usize) < len_legalese {
            bits.insert(tid as usize);
        }
    }
    bits
}

/// Number of bits set in both vectors.
pub fn bit_intersection_len(a: &BitSet, b: &BitSet) -> usize {
    let mut shared = a.clone();
    shared.intersect_with(b);
    shared.len()
}
