//! The low-frequency pair queue.
//!
//! Frequencies in the low phase live in the bounded domain `[2, cutoff)`,
//! so pairs are bucketed by frequency: one doubly-linked list per
//! frequency, all nodes in a single arena, plus a pair-keyed hash into the
//! arena. `max()` is the head of the highest non-empty bucket, found by a
//! descending cursor that only ever walks down over emptied slots.

use crate::queue::{PairQueue, PairRecord};
use crate::symbol::Pair;
use ahash::AHashMap as HashMap;
use slotmap::{DefaultKey, SlotMap};

struct Node {
    rec: PairRecord,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

/// Frequency-bucketed pair queue with O(1) extract-max.
pub struct LfQueue {
    nodes: SlotMap<DefaultKey, Node>,
    index: HashMap<Pair, DefaultKey>,
    /// List heads indexed by frequency; slots 0 and 1 stay empty.
    buckets: Vec<Option<DefaultKey>>,
    max_cursor: usize,
}

impl LfQueue {
    /// Creates a queue accepting frequencies in `2..=max_freq`.
    pub fn new(max_freq: u32) -> Self {
        let max_freq = max_freq as usize;
        Self {
            nodes: SlotMap::new(),
            index: HashMap::new(),
            buckets: vec![None; max_freq + 1],
            max_cursor: max_freq,
        }
    }

    fn link_at_head(&mut self, key: DefaultKey, freq: usize) {
        let old_head = self.buckets[freq];
        self.nodes[key].prev = None;
        self.nodes[key].next = old_head;
        if let Some(h) = old_head {
            self.nodes[h].prev = Some(key);
        }
        self.buckets[freq] = Some(key);
        self.max_cursor = self.max_cursor.max(freq);
    }

    fn unlink(&mut self, key: DefaultKey) {
        let (prev, next, freq) = {
            let node = &self.nodes[key];
            (node.prev, node.next, node.rec.freq as usize)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.buckets[freq] = next,
        }
        if let Some(n) = next {
            self.nodes[n].prev = prev;
        }
    }
}

impl PairQueue for LfQueue {
    fn min_frequency(&self) -> u32 {
        2
    }

    fn contains(&self, ab: Pair) -> bool {
        self.index.contains_key(&ab)
    }

    fn record(&self, ab: Pair) -> PairRecord {
        self.nodes[self.index[&ab]].rec
    }

    /// Head of the highest non-empty bucket: among equal frequencies, the
    /// most recently inserted pair wins. Deterministic because insertion
    /// order is.
    fn max(&mut self) -> Option<Pair> {
        if self.index.is_empty() {
            return None;
        }
        while self.max_cursor > 1 && self.buckets[self.max_cursor].is_none() {
            self.max_cursor -= 1;
        }
        self.buckets[self.max_cursor].map(|k| self.nodes[k].rec.pair)
    }

    fn insert(&mut self, rec: PairRecord) {
        let freq = rec.freq as usize;
        debug_assert!(!self.contains(rec.pair));
        debug_assert!(freq >= 2 && freq < self.buckets.len());
        debug_assert!(rec.freq <= rec.len);
        let key = self.nodes.insert(Node {
            rec,
            prev: None,
            next: None,
        });
        self.index.insert(rec.pair, key);
        self.link_at_head(key, freq);
    }

    fn update(&mut self, rec: PairRecord) {
        let key = self.index[&rec.pair];
        let node = &mut self.nodes[key];
        debug_assert_eq!(node.rec.freq, rec.freq, "update must keep the frequency");
        node.rec = rec;
    }

    fn decrease(&mut self, ab: Pair) {
        let key = self.index[&ab];
        self.unlink(key);
        let freq = self.nodes[key].rec.freq;
        debug_assert!(freq >= 2);
        if freq == 2 {
            // dropping to one occurrence: not worth tracking any longer
            self.index.remove(&ab);
            self.nodes.remove(key);
        } else {
            self.nodes[key].rec.freq = freq - 1;
            self.link_at_head(key, freq as usize - 1);
        }
    }

    fn remove(&mut self, ab: Pair) {
        let key = self
            .index
            .remove(&ab)
            .expect("removing a pair that is not tracked");
        self.unlink(key);
        self.nodes.remove(key);
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
