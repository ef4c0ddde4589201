//! The pair-queue interface shared by both frequency flavors.
//!
//! A queue maps each tracked pair to a record aliasing a sub-range of the
//! position index by plain integer offsets, so index re-allocations can
//! never dangle. The high-frequency flavor serves pairs with frequency at
//! least the phase cutoff; the low-frequency flavor additionally buckets
//! pairs by frequency because its frequency domain is bounded.

use crate::symbol::Pair;

/// Everything the queues know about a tracked pair `ab`.
///
/// `start`/`len` delimit the clustered run inside the position index that
/// holds (a superset of) the pair's occurrences; `freq` is the exact number
/// of live occurrences, so `freq <= len` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRecord {
    pub pair: Pair,
    /// Starting offset of the pair's run inside the position index.
    pub start: u32,
    /// Length of that run: an upper bound on tracked occurrences.
    pub len: u32,
    /// Exact occurrence count in the live text.
    pub freq: u32,
}

/// Operations the substitution rounds need from either queue flavor.
pub trait PairQueue {
    /// Pairs whose frequency drops below this are no longer worth tracking.
    fn min_frequency(&self) -> u32;

    fn contains(&self, ab: Pair) -> bool;

    /// The record for a tracked pair. Panics if `ab` is not tracked.
    fn record(&self, ab: Pair) -> PairRecord;

    /// The pair with the highest frequency, by this flavor's tie-break.
    fn max(&mut self) -> Option<Pair>;

    /// Starts tracking a pair. The pair must not already be tracked.
    fn insert(&mut self, rec: PairRecord);

    /// Rewrites the record of a tracked pair.
    fn update(&mut self, rec: PairRecord);

    /// Lowers a tracked pair's frequency by one.
    fn decrease(&mut self, ab: Pair);

    /// Stops tracking a pair.
    fn remove(&mut self, ab: Pair);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
