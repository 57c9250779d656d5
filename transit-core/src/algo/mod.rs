pub mod router;
pub mod schedule_graph;
pub mod scheduler;

use std::cmp::Ordering;

/// `MinScored<K>` holds a score `f64` and a scored object `K` for use
/// with a `BinaryHeap`.
///
/// Compares in reverse order by the score, so that a `BinaryHeap` (a
/// max-heap) can be used as a min-heap to extract the least-score item
/// first. Based on the equivalent helper in the `petgraph` crate.
#[derive(Copy, Clone, PartialEq)]
pub(crate) struct MinScored<K>(pub f64, pub K);

impl<K: Eq> Eq for MinScored<K> {}

impl<K: PartialEq> PartialOrd for MinScored<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.0.partial_cmp(&self.0)
    }
}

impl<K: Eq> Ord for MinScored<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
    }
}
