//! The position index: an array of text offsets that can be clustered
//! (grouped by the pair each offset currently starts) over arbitrary
//! sub-ranges in linear time.
//!
//! Clustering is an in-place pair-bucketed counting sort driven by a
//! scratch table over the live alphabet. A companion bit per range slot
//! marks the first occurrence of each pair so the scratch table can be
//! restored in time proportional to the range, not the table. Offsets that
//! no longer start a pair (blanked or last-live positions) are clustered
//! to the end of the range.

use crate::symbol::{Pair, BLANK};
use crate::text::SkippableText;

/// Array of text offsets, re-clusterable by pair identity.
pub struct TextPositions {
    tp: Vec<u32>,
    /// `(count-or-begin, cursor)` per pair, flattened `side * side`.
    /// All-zero except while a cluster pass runs.
    scratch: Vec<(u32, u32)>,
    side: usize,
}

impl TextPositions {
    /// Builds the high-phase index: exactly the offsets whose starting byte
    /// pair occurs at least `min_freq` times, clustered by pair identity.
    ///
    /// Counts ordered byte pairs in a 256x256 table, then fills the index
    /// with a single counting-sort pass over the text.
    pub fn high_frequency(text: &SkippableText, min_freq: u32) -> Self {
        let n = text.len();
        debug_assert!(n > 1);
        let side = ((n as f64).powf(0.4) as usize).max(256);

        const NONE: u32 = u32::MAX;
        let mut cursors = vec![0u32; 256 * 256];
        for i in 0..n - 1 {
            let (a, b) = text
                .pair_starting_at(i)
                .expect("fresh text has no blank positions");
            debug_assert!(a < 256 && b < 256, "high-phase text must be byte-mapped");
            cursors[(a as usize) << 8 | b as usize] += 1;
        }

        let mut total = 0u32;
        for c in cursors.iter_mut() {
            if *c < min_freq {
                *c = NONE;
            } else {
                let count = *c;
                *c = total;
                total += count;
            }
        }

        let mut tp = vec![0u32; total as usize];
        for i in 0..n - 1 {
            let (a, b) = text.pair_starting_at(i).expect("fresh text");
            let slot = &mut cursors[(a as usize) << 8 | b as usize];
            if *slot != NONE {
                tp[*slot as usize] = i as u32;
                *slot += 1;
            }
        }

        Self {
            tp,
            scratch: vec![(0, 0); side * side],
            side,
        }
    }

    /// Replaces the index content with every text offset `0..n`.
    ///
    /// Performed exactly once, between the high and low phases, after the
    /// high-frequency queue has been drained. Does not cluster.
    pub fn fill_all(&mut self, n: usize) {
        self.tp.clear();
        self.tp.extend(0..n as u32);
    }

    pub fn len(&self) -> usize {
        self.tp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tp.is_empty()
    }

    /// The text offset stored at index slot `j`.
    pub fn position(&self, j: usize) -> usize {
        self.tp[j] as usize
    }

    /// Clusters `tp[lo..hi]` by the pair each offset currently starts.
    pub fn cluster(&mut self, text: &SkippableText, lo: usize, hi: usize) {
        debug_assert!(lo < hi && hi <= self.tp.len());
        // The scratch table only spans the first `side` symbols; degenerate
        // alphabets fall back to comparison sort.
        if text.max_symbol() as usize >= self.side {
            self.tp[lo..hi].sort_unstable_by_key(|&p| {
                text.pair_starting_at(p as usize).unwrap_or((BLANK, BLANK))
            });
            return;
        }

        let side = self.side;
        let key = |ab: Pair| ab.0 as usize * side + ab.1 as usize;
        let mut first_seen = vec![false; hi - lo];

        // count frequencies, marking the first slot of each distinct pair
        for k in lo..hi {
            if let Some(ab) = text.pair_starting_at(self.tp[k] as usize) {
                let s = key(ab);
                first_seen[k - lo] = self.scratch[s].0 == 0;
                self.scratch[s].0 += 1;
            }
        }

        // cumulate into (begin, cursor); null offsets go after everything
        let mut t = lo as u32;
        for k in lo..hi {
            if first_seen[k - lo] {
                let ab = text
                    .pair_starting_at(self.tp[k] as usize)
                    .expect("marked slot starts a pair");
                let s = key(ab);
                let count = self.scratch[s].0;
                self.scratch[s] = (t, t);
                t += count;
            }
        }
        let null_start = t;
        let mut null_cur = t;
        first_seen.iter_mut().for_each(|f| *f = false);

        // in-place permutation: tp[lo..k] stays clustered
        let mut k = lo;
        while k < hi {
            let ab = text.pair_starting_at(self.tp[k] as usize);
            let (ab_start, ab_end) = match ab {
                None => (null_start, null_cur),
                Some(ab) => self.scratch[key(ab)],
            };
            if k as u32 >= ab_start && k as u32 <= ab_end {
                // already in its bucket; re-mark first occurrences so the
                // scratch table can be restored afterwards
                if ab.is_some() {
                    first_seen[k - lo] = k as u32 == ab_start;
                }
                k += 1;
                match ab {
                    None => null_cur += (ab_end == k as u32) as u32,
                    Some(ab) => self.scratch[key(ab)].1 += (ab_end == k as u32) as u32,
                }
            } else {
                self.tp.swap(k, ab_end as usize);
                match ab {
                    None => null_cur += 1,
                    Some(ab) => self.scratch[key(ab)].1 += 1,
                }
            }
        }

        // restore the scratch table to all-zero
        for k in lo..hi {
            if first_seen[k - lo] {
                let ab = text
                    .pair_starting_at(self.tp[k] as usize)
                    .expect("marked slot starts a pair");
                self.scratch[key(ab)] = (0, 0);
            }
        }
    }

    /// Clusters the whole index.
    pub fn cluster_all(&mut self, text: &SkippableText) {
        if !self.tp.is_empty() {
            let hi = self.tp.len();
            self.cluster(text, 0, hi);
        }
    }
}
