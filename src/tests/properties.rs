use crate::engine::{repair, RepairEngine};
use crate::grammar::RepairGrammar;
use crate::symbol::Symbol;
use proptest::prelude::*;

/// No ordered pair of symbols occurs more than once among the adjacent
/// symbols of the compressed sequence.
fn terminality_holds(g: &RepairGrammar) -> bool {
    let mut seen = std::collections::HashSet::new();
    g.sequence.windows(2).all(|w| seen.insert((w[0], w[1])))
}

/// Every production references only older symbols and every production is
/// reachable from the sequence or a later rule.
fn grammar_shape_holds(g: &RepairGrammar) -> bool {
    let sigma = g.alphabet.len() as Symbol;
    let well_founded = g
        .rules
        .iter()
        .enumerate()
        .all(|(k, &(l, r))| l < sigma + k as Symbol && r < sigma + k as Symbol);

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
    well_founded && used.iter().all(|&u| u)
}

/// The image of the alphabet map is exactly the set of bytes in the input,
/// and the map is injective.
fn alphabet_holds(input: &[u8], g: &RepairGrammar) -> bool {
    let in_input: std::collections::BTreeSet<u8> = input.iter().copied().collect();
    let in_alphabet: std::collections::BTreeSet<u8> = g.alphabet.iter().copied().collect();
    in_input == in_alphabet && in_alphabet.len() == g.alphabet.len()
}

proptest! {
    /// Property 1: expansion recovers the input exactly.
    #[test]
    fn prop_roundtrip(input in prop::collection::vec(any::<u8>(), 0..2048)) {
        let g = repair(&input).unwrap();
        prop_assert_eq!(g.expand(), input);
    }

    /// Property 1 over a two-symbol alphabet, where cascades are densest.
    #[test]
    fn prop_roundtrip_binary(input in prop::collection::vec(0u8..2, 0..2048)) {
        let g = repair(&input).unwrap();
        prop_assert_eq!(g.expand(), input);
    }

    /// Property 1 over printable ASCII.
    #[test]
    fn prop_roundtrip_ascii(input in "[ -~]{0,1500}") {
        let g = repair(input.as_bytes()).unwrap();
        prop_assert_eq!(g.expand(), input.as_bytes());
    }

    /// Property 2: no adjacent pair repeats in the compressed sequence.
    #[test]
    fn prop_terminality(input in prop::collection::vec(0u8..8, 0..2048)) {
        let g = repair(&input).unwrap();
        prop_assert!(terminality_holds(&g));
    }

    /// Property 3: two right-hand symbols each, no forward references,
    /// no dead rules.
    #[test]
    fn prop_grammar_shape(input in prop::collection::vec(any::<u8>(), 0..2048)) {
        let g = repair(&input).unwrap();
        prop_assert!(grammar_shape_holds(&g));
    }

    /// Property 4: alphabet completeness and injectivity.
    #[test]
    fn prop_alphabet(input in prop::collection::vec(any::<u8>(), 0..2048)) {
        let g = repair(&input).unwrap();
        prop_assert!(alphabet_holds(&input, &g));
    }

    /// Property 5: selection frequencies never increase.
    #[test]
    fn prop_selection_monotone(input in prop::collection::vec(0u8..4, 2..2048)) {
        let mut engine = RepairEngine::new(&input);
        engine.compress();
        prop_assert!(engine.selection_freqs.windows(2).all(|w| w[0] >= w[1]));
    }

    /// Compression is a pure function of its input.
    #[test]
    fn prop_deterministic(input in prop::collection::vec(any::<u8>(), 0..1024)) {
        prop_assert_eq!(repair(&input).unwrap(), repair(&input).unwrap());
    }
}

#[test]
fn sixty_four_kib_mixed_data() {
    // LCG-generated bytes with a planted period so both phases do work
    let mut seed = 0x2545_f491_4f6c_dd1du64;
    let mut data = Vec::with_capacity(1 << 16);
    while data.len() < 1 << 16 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        if data.len() % 5 == 0 {
            data.extend_from_slice(b"lorem ipsum ");
        }
        data.push((seed >> 33) as u8);
    }
    data.truncate(1 << 16);

    let g = repair(&data).unwrap();
    assert!(terminality_holds(&g));
    assert!(grammar_shape_holds(&g));
    assert_eq!(g.expand(), data);
}

#[test]
fn one_mib_quick_brown_fox() {
    let unit = b"The quick brown fox ";
    let mut data = Vec::with_capacity(1 << 20);
    while data.len() < 1 << 20 {
        data.extend_from_slice(unit);
    }
    data.truncate(1 << 20);

    let g = repair(&data).unwrap();
    assert!(terminality_holds(&g));
    assert!(g.sequence.len() < data.len());
    assert_eq!(g.expand(), data);
}

/// Bolero fuzz test: compression never panics and always round-trips.
#[test]
fn fuzz_repair_roundtrip() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let g = repair(input).unwrap();
        assert_eq!(g.expand(), *input);
    });
}
