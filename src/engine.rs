//! The two-phase Re-Pair engine.
//!
//! Pairs are partitioned by frequency at a cutoff of about `n^(2/3)`.
//! The high phase tracks only the few pairs above the cutoff, so its
//! position index and queue stay small; the low phase then tracks the
//! remainder over the full position index, batched so that at most `n/50`
//! records are resident at a time. Both phases run the same substitution
//! round: replace every occurrence of the most frequent pair, then
//! resynchronize the records of every neighbor pair whose count changed.

use crate::error::Error;
use crate::grammar::RepairGrammar;
use crate::hf_queue::HfQueue;
use crate::lf_queue::LfQueue;
use crate::positions::TextPositions;
use crate::queue::{PairQueue, PairRecord};
use crate::symbol::{Pair, Symbol, BLANK};
use crate::text::SkippableText;
use log::{debug, info};

/// Phase cutoff exponent: pairs with frequency at least `n^ALPHA` are
/// processed in the high phase.
const ALPHA: f64 = 2.0 / 3.0;

/// Low-phase batching divisor: at most `n / LOW_INSERT_DIVISOR` records are
/// bulk-inserted into the low-frequency queue per batch.
const LOW_INSERT_DIVISOR: usize = 50;

/// Computes the Re-Pair grammar of `input`.
///
/// Greedily replaces the most frequent pair of adjacent symbols with a
/// fresh non-terminal until no pair occurs at least twice. Deterministic:
/// equally frequent pairs are broken lexicographically in the high phase
/// and by insertion recency in the low phase.
pub fn repair(input: &[u8]) -> Result<RepairGrammar, Error> {
    // the all-ones code is the blank marker, so indices must stay below it
    if input.len() >= u32::MAX as usize {
        return Err(Error::Capacity {
            len: input.len() as u64,
        });
    }
    if input.len() < 2 {
        // too short for any pair: the sequence is the (mapped) input
        return Ok(RepairGrammar {
            alphabet: input.to_vec(),
            rules: Vec::new(),
            sequence: input.iter().map(|_| 0).collect(),
        });
    }
    let mut engine = RepairEngine::new(input);
    engine.compress();
    Ok(engine.into_grammar())
}

pub(crate) struct RepairEngine {
    text: SkippableText,
    tp: TextPositions,
    alphabet: Vec<u8>,
    rules: Vec<Pair>,
    /// Next unused non-terminal.
    next_symbol: Symbol,
    /// The phase cutoff frequency (`tau`).
    min_freq: u32,
    /// Frequency of each selected pair at the moment of selection.
    #[cfg(test)]
    pub(crate) selection_freqs: Vec<u32>,
}

impl RepairEngine {
    /// Builds the skippable text (alphabet mapped in first-occurrence
    /// order) and the high-phase position index. `input` must hold at
    /// least two bytes.
    pub(crate) fn new(input: &[u8]) -> Self {
        let n = input.len();
        let mut to_symbol = [BLANK; 256];
        let mut alphabet = Vec::new();
        let mut text = SkippableText::new(n);
        for (i, &byte) in input.iter().enumerate() {
            if to_symbol[byte as usize] == BLANK {
                to_symbol[byte as usize] = alphabet.len() as Symbol;
                alphabet.push(byte);
            }
            text.set(i, to_symbol[byte as usize]);
        }

        let min_freq = ((n as f64).powf(ALPHA) as u32).max(2);
        info!("input: {n} bytes, alphabet {}, cutoff frequency {min_freq}", alphabet.len());

        let tp = TextPositions::high_frequency(&text, min_freq);
        let next_symbol = alphabet.len() as Symbol;
        Self {
            text,
            tp,
            alphabet,
            rules: Vec::new(),
            next_symbol,
            min_freq,
            #[cfg(test)]
            selection_freqs: Vec::new(),
        }
    }

    pub(crate) fn compress(&mut self) {
        self.high_phase();
        self.low_phase();
        info!(
            "done: {} rules, {} of {} symbols live",
            self.rules.len(),
            self.text.live_len(),
            self.text.len()
        );
    }

    pub(crate) fn into_grammar(self) -> RepairGrammar {
        RepairGrammar {
            alphabet: self.alphabet,
            rules: self.rules,
            sequence: self.text.live_symbols().collect(),
        }
    }

    /// Calls `f(pair, run_start, run_len)` for every maximal equal-pair run
    /// in the clustered index range `lo..hi`. Offsets that no longer start
    /// a pair are passed over.
    fn for_each_run<F: FnMut(Pair, u32, u32)>(&self, lo: usize, hi: usize, mut f: F) {
        let mut j = lo;
        while j < hi {
            let Some(ab) = self.text.pair_starting_at(self.tp.position(j)) else {
                j += 1;
                continue;
            };
            let start = j;
            let mut k = 1u32;
            while j + 1 < hi && self.text.pair_starting_at(self.tp.position(j + 1)) == Some(ab) {
                j += 1;
                k += 1;
            }
            f(ab, start as u32, k);
            j += 1;
        }
    }

    /// Replaces every pair with frequency at least the cutoff.
    fn high_phase(&mut self) {
        if self.tp.is_empty() {
            info!("high phase: no pair reaches the cutoff");
            return;
        }
        let mut queue = HfQueue::new(self.min_freq);
        let min = self.min_freq;
        self.for_each_run(0, self.tp.len(), |ab, start, k| {
            if k >= min {
                queue.insert(PairRecord {
                    pair: ab,
                    start,
                    len: k,
                    freq: k,
                });
            }
        });
        info!("high phase: {} distinct pairs", queue.len());

        let mut rounds = 0usize;
        while let Some(ab) = queue.max() {
            self.substitution_round(&mut queue, ab);
            rounds += 1;
        }
        debug!(
            "high phase: {rounds} rounds, {} symbols live",
            self.text.live_len()
        );
    }

    /// Replaces every remaining pair that occurs at least twice.
    ///
    /// The position index is expanded to all offsets and re-clustered
    /// globally once per batch. Each batch picks the lowest frequency
    /// threshold whose runs fit the record cap, bulk-inserts those runs,
    /// and drains rounds while the maximum stays at or above the
    /// threshold, so selection frequencies never increase across batches.
    /// Leftover records are discarded and re-discovered next batch.
    fn low_phase(&mut self) {
        if self.min_freq <= 2 {
            // the high phase already ran with the final cutoff
            return;
        }
        let n = self.text.len();
        self.tp.fill_all(n);
        let cap = (n / LOW_INSERT_DIVISOR).max(1);
        let max_freq = self.min_freq - 1;
        let tau = self.min_freq;
        let mut batch = 0usize;

        loop {
            self.tp.cluster_all(&self.text);

            // histogram of run lengths over the low-frequency domain
            let mut counts = vec![0u64; tau as usize];
            self.for_each_run(0, self.tp.len(), |_, _, k| {
                if k >= 2 {
                    debug_assert!(k < tau, "low-phase pair at or above the cutoff");
                    counts[k as usize] += 1;
                }
            });
            let Some(f_max) = (2..=max_freq).rev().find(|&f| counts[f as usize] > 0) else {
                break; // no pair occurs twice
            };

            // lowest threshold whose cumulative run count fits the cap
            let cap64 = cap as u64;
            let mut threshold = f_max;
            let mut cum = counts[f_max as usize];
            while threshold > 2 && cum + counts[threshold as usize - 1] <= cap64 {
                threshold -= 1;
                cum += counts[threshold as usize];
            }

            let mut queue = LfQueue::new(max_freq);
            let mut seeded = 0usize;
            self.for_each_run(0, self.tp.len(), |ab, start, k| {
                if k >= threshold && seeded < cap {
                    queue.insert(PairRecord {
                        pair: ab,
                        start,
                        len: k,
                        freq: k,
                    });
                    seeded += 1;
                }
            });

            while let Some(ab) = queue.max() {
                if queue.record(ab).freq < threshold {
                    break;
                }
                self.substitution_round(&mut queue, ab);
            }

            batch += 1;
            debug!(
                "low phase batch {batch}: threshold {threshold}, {seeded} pairs seeded, {} symbols live",
                self.text.live_len()
            );
        }
    }

    /// Mints a fresh non-terminal for `ab` and rewrites every occurrence.
    ///
    /// The replace pass runs to completion before any resynchronization:
    /// records are refreshed against a text that no longer changes within
    /// the round.
    fn substitution_round<Q: PairQueue>(&mut self, queue: &mut Q, ab: Pair) {
        let x = self.next_symbol;
        self.rules.push(ab);
        let rec = queue.record(ab);
        debug_assert!(rec.freq >= queue.min_frequency());
        #[cfg(test)]
        self.selection_freqs.push(rec.freq);
        let (lo, hi) = (rec.start as usize, (rec.start + rec.len) as usize);

        // replace pass
        for j in lo..hi {
            let i = self.tp.position(j);
            if self.text.pair_starting_at(i) == Some(ab) {
                // the context reads x A B y; capture the two pairs that are
                // about to disappear before touching the text
                let xa = self.text.pair_ending_at(i);
                let by = self.text.next_pair(i);
                self.text.replace(i, x);
                if let Some(xa) = xa {
                    if xa != ab && queue.contains(xa) {
                        queue.decrease(xa);
                    }
                }
                if let Some(by) = by {
                    if by != ab && queue.contains(by) {
                        queue.decrease(by);
                    }
                }
            }
        }

        // resynchronize pass
        let (a, b) = ab;
        for j in lo..hi {
            let i = self.tp.position(j);
            if self.text.get(i) != Some(x) {
                // this occurrence was subsumed by a cascading replacement
                continue;
            }
            let xx = self.text.pair_ending_at(i);
            let xy = self.text.pair_starting_at(i);
            // a neighbor equal to X means the text read ...ABAB...; the
            // disappeared pair there was (B,A), not (X,A)
            let xa = xx.map(|(left, _)| (if left == x { b } else { left }, a));
            let by = xy.map(|(_, right)| (b, if right == x { a } else { right }));
            if let Some(by) = by {
                if by != ab && queue.contains(by) {
                    self.sync_or_remove(queue, by);
                }
            }
            if let Some(xa) = xa {
                if xa != ab && queue.contains(xa) {
                    self.sync_or_remove(queue, xa);
                }
            }
        }

        // the replaced pair's own range last: adopts the runs of fresh
        // pairs and retires ab, whose live count is now zero
        self.synchronize(queue, ab);
        debug_assert!(!queue.contains(ab));
        self.next_symbol = x + 1;
    }

    /// Re-clusters `ab`'s index range and refreshes the records it holds:
    /// new runs at or above the queue minimum enter the queue, `ab`'s own
    /// record narrows to its surviving run or is removed.
    fn synchronize<Q: PairQueue>(&mut self, queue: &mut Q, ab: Pair) {
        let rec = queue.record(ab);
        let (lo, hi) = (rec.start as usize, (rec.start + rec.len) as usize);
        self.tp.cluster(&self.text, lo, hi);

        let min = queue.min_frequency();
        let mut freq_ab = 0u32;
        self.for_each_run(lo, hi, |xy, start, k| {
            if xy == ab {
                freq_ab = k;
            }
            if k >= min {
                let fresh = PairRecord {
                    pair: xy,
                    start,
                    len: k,
                    freq: k,
                };
                if xy == ab {
                    queue.update(fresh);
                } else if !queue.contains(xy) {
                    queue.insert(fresh);
                }
            }
        });

        if freq_ab < min {
            queue.remove(ab);
        }
    }

    /// The majority heuristic: a record still mostly valid keeps its range;
    /// one that fell below the minimum with a mostly valid range can be
    /// dropped outright, because no untracked pair can hide in it.
    fn sync_or_remove<Q: PairQueue>(&mut self, queue: &mut Q, ab: Pair) {
        let rec = queue.record(ab);
        if rec.freq <= rec.len / 2 {
            self.synchronize(queue, ab);
        } else if rec.freq < queue.min_frequency() {
            queue.remove(ab);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminality_holds(sequence: &[Symbol]) -> bool {
        let mut seen = std::collections::HashSet::new();
        sequence.windows(2).all(|w| seen.insert((w[0], w[1])))
    }

    #[test]
    fn empty_input() {
        let g = repair(b"").unwrap();
        assert_eq!(g.alphabet, Vec::<u8>::new());
        assert!(g.rules.is_empty());
        assert!(g.sequence.is_empty());
        assert_eq!(g.expand(), b"");
    }

    #[test]
    fn single_byte() {
        let g = repair(b"a").unwrap();
        assert_eq!(g.alphabet, vec![0x61]);
        assert!(g.rules.is_empty());
        assert_eq!(g.sequence, vec![0]);
        assert_eq!(g.expand(), b"a");
    }

    #[test]
    fn two_distinct_bytes() {
        let g = repair(b"ab").unwrap();
        assert_eq!(g.alphabet, vec![0x61, 0x62]);
        assert!(g.rules.is_empty());
        assert_eq!(g.sequence, vec![0, 1]);
    }

    #[test]
    fn ababab_builds_two_rules() {
        let g = repair(b"ababab").unwrap();
        assert_eq!(g.alphabet, vec![0x61, 0x62]);
        // 2 -> (0,1) "ab"; its repetition then forces 3 -> (2,2)
        assert_eq!(g.rules, vec![(0, 1), (2, 2)]);
        assert_eq!(g.sequence, vec![3, 2]);
        assert_eq!(g.expand(), b"ababab");
    }

    #[test]
    fn aaaa_builds_one_rule() {
        // "aa" is replaced at its two non-overlapping occurrences; the
        // resulting pair (2,2) occurs once and stays
        let g = repair(b"aaaa").unwrap();
        assert_eq!(g.alphabet, vec![0x61]);
        assert_eq!(g.rules, vec![(0, 0)]);
        assert_eq!(g.sequence, vec![2, 2]);
        assert!(terminality_holds(&g.sequence));
        assert_eq!(g.expand(), b"aaaa");
    }

    #[test]
    fn abc_times_four() {
        let input = b"abcabcabcabc";
        let g = repair(input).unwrap();
        assert!(!g.rules.is_empty());
        assert!(g.sequence.len() < input.len());
        assert!(terminality_holds(&g.sequence));
        assert_eq!(g.expand(), input);
    }

    #[test]
    fn no_repetition_no_rules() {
        let g = repair(b"abcdefgh").unwrap();
        assert!(g.rules.is_empty());
        assert_eq!(g.sequence, (0..8).collect::<Vec<_>>());
        assert_eq!(g.expand(), b"abcdefgh");
    }

    #[test]
    fn all_same_symbol() {
        let input = vec![b'a'; 100];
        let g = repair(&input).unwrap();
        assert_eq!(g.alphabet, vec![b'a']);
        assert!(terminality_holds(&g.sequence));
        assert_eq!(g.expand(), input);
        assert!(g.sequence.len() < input.len());
    }

    #[test]
    fn binary_data_roundtrips() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let g = repair(&data).unwrap();
        assert_eq!(g.alphabet.len(), 256);
        assert!(terminality_holds(&g.sequence));
        assert_eq!(g.expand(), data);
    }

    #[test]
    fn rules_are_well_founded() {
        let g = repair(b"mississippi mississippi mississippi").unwrap();
        let sigma = g.alphabet.len() as Symbol;
        for (k, &(left, right)) in g.rules.iter().enumerate() {
            assert!(left < sigma + k as Symbol);
            assert!(right < sigma + k as Symbol);
        }
        assert_eq!(g.expand(), b"mississippi mississippi mississippi");
    }

    #[test]
    fn no_dead_rules() {
        let input = b"the quick brown fox the quick brown fox the quick";
        let g = repair(input).unwrap();
        let sigma = g.alphabet.len() as Symbol;
        let mut used = vec![false; g.rules.len()];
        let mut mark = |sym: Symbol, used: &mut Vec<bool>| {
            if sym >= sigma {
                used[(sym - sigma) as usize] = true;
            }
        };
        for &s in &g.sequence {
            mark(s, &mut used);
        }
        for &(l, r) in &g.rules {
            mark(l, &mut used);
            mark(r, &mut used);
        }
        assert!(used.iter().all(|&u| u), "every rule is used somewhere");
    }

    #[test]
    fn selection_frequencies_never_increase() {
        let input = b"abracadabra abracadabra abracadabra abracadabra!".repeat(40);
        let mut engine = RepairEngine::new(&input);
        engine.compress();
        let freqs = &engine.selection_freqs;
        assert!(!freqs.is_empty());
        assert!(
            freqs.windows(2).all(|w| w[0] >= w[1]),
            "selection frequencies must be non-increasing: {freqs:?}"
        );
    }

    #[test]
    fn deterministic_output() {
        let input = b"singing in the rain, just singing in the rain".repeat(8);
        let a = repair(&input).unwrap();
        let b = repair(&input).unwrap();
        assert_eq!(a, b);
    }
}
