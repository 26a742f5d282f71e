//! Span - immutable ordered sets of token positions.
//!
//! Spans are the coordinate system for match regions: every match carries a
//! query-side span and a rule-side span. A span may have gaps, so its length
//! is the number of positions it holds, not `end - start + 1`.

use std::fmt;
use std::ops::Range;

/// An immutable ordered set of non-negative token positions.
///
/// Positions are always unique and sorted. Spans are values: operations
/// return new spans and never mutate their operands.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    positions: Vec<usize>,
}

impl Span {
    /// Create a span from any iterator of positions.
    ///
    /// Duplicates are removed and positions are sorted.
    pub fn new(positions: impl IntoIterator<Item = usize>) -> Self {
        let mut positions: Vec<usize> = positions.into_iter().collect();
        positions.sort_unstable();
        positions.dedup();
        Self { positions }
    }

    /// Create a span covering a contiguous half-open range.
    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            positions: range.collect(),
        }
    }

    /// True if this span holds no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of positions in this span.
    ///
    /// For a gapped span this is smaller than `end - start + 1`.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Smallest position, or 0 for an empty span.
    pub fn start(&self) -> usize {
        self.positions.first().copied().unwrap_or(0)
    }

    /// Largest position, or 0 for an empty span.
    pub fn end(&self) -> usize {
        self.positions.last().copied().unwrap_or(0)
    }

    /// `end - start + 1`: the extent of the span including any gaps.
    pub fn magnitude(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end() - self.start() + 1
        }
    }

    /// True if `pos` is one of this span's positions.
    pub fn contains(&self, pos: usize) -> bool {
        self.positions.binary_search(&pos).is_ok()
    }

    /// Iterate over the positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    /// The positions as a sorted slice.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// New span holding the positions of both spans.
    pub fn union(&self, other: &Span) -> Span {
        let mut positions = Vec::with_capacity(self.len() + other.len());
        positions.extend_from_slice(&self.positions);
        positions.extend_from_slice(&other.positions);
        Span::new(positions)
    }

    /// New span holding only the positions present in both spans.
    pub fn intersection(&self, other: &Span) -> Span {
        let positions: Vec<usize> = self
            .positions
            .iter()
            .copied()
            .filter(|p| other.contains(*p))
            .collect();
        Span { positions }
    }

    /// New span holding this span's positions that are not in `other`.
    pub fn difference(&self, other: &Span) -> Span {
        let positions: Vec<usize> = self
            .positions
            .iter()
            .copied()
            .filter(|p| !other.contains(*p))
            .collect();
        Span { positions }
    }

    /// True if the bounding ranges of the two spans intersect.
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start() <= other.end() && other.start() <= self.end()
    }

    /// Number of positions shared by both spans.
    pub fn overlap_len(&self, other: &Span) -> usize {
        self.intersection(other).len()
    }

    /// True if every position of this span is also in `other`.
    pub fn is_subset(&self, other: &Span) -> bool {
        self.positions.iter().all(|p| other.contains(*p))
    }

    /// Distance between the two spans.
    ///
    /// 0 when the spans overlap, otherwise the gap between the nearest
    /// endpoints: a span ending at 5 is at distance 2 from a span starting
    /// at 7.
    pub fn distance(&self, other: &Span) -> usize {
        if self.is_empty() || other.is_empty() {
            return 0;
        }
        if self.overlaps(other) {
            return 0;
        }
        if self.end() < other.start() {
            other.start() - self.end()
        } else {
            self.start() - other.end()
        }
    }

    /// Union the two spans when they are no further than `max_dist` apart.
    ///
    /// Returns `None` whenever `distance(other) > max_dist`.
    pub fn merge_if_close(&self, other: &Span, max_dist: usize) -> Option<Span> {
        if self.distance(other) > max_dist {
            None
        } else {
            Some(self.union(other))
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Span()");
        }
        write!(
            f,
            "Span({}..{}, len={})",
            self.start(),
            self.end(),
            self.len()
        )
    }
}

impl FromIterator<usize> for Span {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Span::new(iter)
    }
}
