//! The high-frequency pair queue.
//!
//! Tracks the pairs whose frequency reaches the phase cutoff. There are at
//! most `n / cutoff` of them alive at once, so `max()` is an on-demand
//! linear scan over the record arena; its cost is charged to the
//! substitution round that asked, and each such round mints a fresh
//! non-terminal.

use crate::queue::{PairQueue, PairRecord};
use crate::symbol::Pair;
use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};
use std::cmp::Reverse;

/// Pair-keyed record store with extract-max by linear scan.
pub struct HfQueue {
    records: SlotMap<DefaultKey, PairRecord>,
    index: HashMap<Pair, DefaultKey>,
    min_freq: u32,
}

impl HfQueue {
    /// Creates a queue with the given cutoff frequency. Pairs are expected
    /// to enter with `freq >= min_freq`; `decrease` may take them below it,
    /// and the engine removes them explicitly when that matters.
    pub fn new(min_freq: u32) -> Self {
        debug_assert!(min_freq > 1);
        Self {
            records: SlotMap::new(),
            index: HashMap::new(),
            min_freq,
        }
    }
}

impl PairQueue for HfQueue {
    fn min_frequency(&self) -> u32 {
        self.min_freq
    }

    fn contains(&self, ab: Pair) -> bool {
        self.index.contains_key(&ab)
    }

    fn record(&self, ab: Pair) -> PairRecord {
        self.records[self.index[&ab]]
    }

    /// Highest frequency first; among equal frequencies the
    /// lexicographically smallest pair wins, which makes the scan order
    /// irrelevant and the grammar deterministic.
    fn max(&mut self) -> Option<Pair> {
        self.records
            .values()
            .map(|r| (r.freq, Reverse(r.pair)))
            .max()
            .map(|(_, Reverse(pair))| pair)
    }

    fn insert(&mut self, rec: PairRecord) {
        debug_assert!(!self.contains(rec.pair));
        debug_assert!(rec.freq >= self.min_freq);
        debug_assert!(rec.freq <= rec.len);
        let key = self.records.insert(rec);
        self.index.insert(rec.pair, key);
    }

    fn update(&mut self, rec: PairRecord) {
        debug_assert!(rec.freq >= self.min_freq);
        let key = self.index[&rec.pair];
        self.records[key] = rec;
    }

    fn decrease(&mut self, ab: Pair) {
        let key = self.index[&ab];
        let rec = &mut self.records[key];
        debug_assert!(rec.freq > 0);
        rec.freq -= 1;
    }

    fn remove(&mut self, ab: Pair) {
        let key = self
            .index
            .remove(&ab)
            .expect("removing a pair that is not tracked");
        self.records.remove(key);
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pair: Pair, start: u32, len: u32, freq: u32) -> PairRecord {
        PairRecord {
            pair,
            start,
            len,
            freq,
        }
    }

    #[test]
    fn insert_and_lookup() {
        let mut q = HfQueue::new(2);
        q.insert(rec((0, 1), 0, 5, 5));
        assert!(q.contains((0, 1)));
        assert!(!q.contains((1, 0)));
        assert_eq!(q.record((0, 1)).freq, 5);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn max_prefers_frequency_then_smaller_pair() {
        let mut q = HfQueue::new(2);
        q.insert(rec((3, 3), 0, 4, 4));
        q.insert(rec((0, 1), 4, 7, 7));
        q.insert(rec((2, 9), 11, 7, 7));
        assert_eq!(q.max(), Some((0, 1)));
        q.remove((0, 1));
        assert_eq!(q.max(), Some((2, 9)));
        q.remove((2, 9));
        q.remove((3, 3));
        assert_eq!(q.max(), None);
    }

    #[test]
    fn decrease_does_not_remove() {
        let mut q = HfQueue::new(3);
        q.insert(rec((1, 2), 0, 3, 3));
        q.decrease((1, 2));
        q.decrease((1, 2));
        // below the cutoff but still tracked: removal is the engine's call
        assert!(q.contains((1, 2)));
        assert_eq!(q.record((1, 2)).freq, 1);
    }

    #[test]
    fn update_rewrites_record() {
        let mut q = HfQueue::new(2);
        q.insert(rec((1, 2), 0, 9, 9));
        q.update(rec((1, 2), 3, 4, 4));
        assert_eq!(q.record((1, 2)), rec((1, 2), 3, 4, 4));
    }
}
