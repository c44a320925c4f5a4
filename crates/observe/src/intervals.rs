//! Merge-on-insert interval set.

use smallvec::SmallVec;
use tracespy_core::Interval;

/// Sorted, disjoint byte ranges observed during one call.
///
/// Inserting a range coalesces it with every stored range that overlaps it
/// or lies within `threshold` bytes of it, so stored ranges are always
/// separated by more than the threshold. Calls touch tens of ranges, not
/// millions, so the common case lives inline.
#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    intervals: SmallVec<[Interval; 8]>,
    threshold: u64,
}

impl IntervalSet {
    /// Create an empty set that only merges touching ranges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with a merge threshold.
    pub fn with_threshold(threshold: u64) -> Self {
        IntervalSet {
            intervals: SmallVec::new(),
            threshold,
        }
    }

    /// Insert a range. Zero-length ranges are ignored.
    pub fn insert(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }
        let threshold = self.threshold;

        // First stored range that could merge, and one past the last.
        let lo = self
            .intervals
            .partition_point(|i| i.end.saturating_add(threshold) < interval.start);
        let hi = self
            .intervals
            .partition_point(|i| i.start <= interval.end.saturating_add(threshold));

        if lo >= hi {
            self.intervals.insert(lo, interval);
            return;
        }

        let merged = interval
            .span(&self.intervals[lo])
            .span(&self.intervals[hi - 1]);
        self.intervals.drain(lo..hi);
        self.intervals.insert(lo, merged);
    }

    /// Insert `[base, base + size)`.
    pub fn insert_range(&mut self, base: u64, size: u64) {
        if size > 0 {
            self.insert(Interval::from_base_size(base, size));
        }
    }

    /// Stored ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    /// Remove and return every stored range.
    pub fn take(&mut self) -> SmallVec<[Interval; 8]> {
        std::mem::take(&mut self.intervals)
    }

    /// Number of stored ranges.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Drop every stored range.
    pub fn clear(&mut self) {
        self.intervals.clear();
    }

    /// Merge threshold in bytes.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}
