//! The on-disk archive: magic, gamma-coded lengths, then the grammar and
//! sequence packed at the width of the largest symbol.
//!
//! Decoding validates everything expansion relies on: magic, symbol
//! ranges, and the rule order (a production may only reference symbols
//! minted before it), so a hostile archive fails with a `Format` error
//! instead of breaking the decompressor.

use crate::bits::{BitReader, BitWriter};
use crate::error::Error;
use crate::grammar::RepairGrammar;
use crate::symbol::Symbol;

const MAGIC: [u8; 4] = *b"RPR1";

/// Bits needed to store any symbol of a grammar with `sigma` terminals and
/// `rules` productions.
fn symbol_width(sigma: usize, rules: usize) -> u32 {
    let max_symbol = (sigma + rules).saturating_sub(1) as u64;
    (64 - max_symbol.leading_zeros()).max(1)
}

/// Serializes a grammar into the archive format.
pub fn write_archive(grammar: &RepairGrammar) -> Vec<u8> {
    let mut w = BitWriter::new();
    for byte in MAGIC {
        w.push_bits(byte as u64, 8);
    }
    w.push_gamma(grammar.alphabet.len() as u64 + 1);
    for &byte in &grammar.alphabet {
        w.push_bits(byte as u64, 8);
    }
    w.push_gamma(grammar.rules.len() as u64 + 1);
    w.push_gamma(grammar.sequence.len() as u64 + 1);

    let width = symbol_width(grammar.alphabet.len(), grammar.rules.len());
    for &(left, right) in &grammar.rules {
        w.push_bits(left as u64, width);
        w.push_bits(right as u64, width);
    }
    for &sym in &grammar.sequence {
        w.push_bits(sym as u64, width);
    }
    w.finish()
}

/// Deserializes and validates an archive.
pub fn read_archive(bytes: &[u8]) -> Result<RepairGrammar, Error> {
    let mut r = BitReader::new(bytes);
    for expected in MAGIC {
        if r.read_bits(8)? != expected as u64 {
            return Err(Error::Format("not a Re-Pair archive"));
        }
    }

    let alphabet_len = decode_len(&mut r)?;
    if alphabet_len > 256 {
        return Err(Error::Format("alphabet longer than 256"));
    }
    let mut alphabet = Vec::with_capacity(alphabet_len);
    let mut seen = [false; 256];
    for _ in 0..alphabet_len {
        let byte = r.read_bits(8)? as u8;
        if seen[byte as usize] {
            return Err(Error::Format("alphabet maps a byte twice"));
        }
        seen[byte as usize] = true;
        alphabet.push(byte);
    }

    let rules_len = decode_len(&mut r)?;
    let sequence_len = decode_len(&mut r)?;
    if alphabet_len == 0 && (rules_len > 0 || sequence_len > 0) {
        return Err(Error::Format("symbols without an alphabet"));
    }

    let width = symbol_width(alphabet_len, rules_len);
    // bound allocations by what the buffer can actually hold
    let needed = (2 * rules_len as u64 + sequence_len as u64) * width as u64;
    if needed > r.remaining_bits() {
        return Err(Error::Format("archive too short for its lengths"));
    }

    let sigma = alphabet_len as Symbol;
    let mut rules = Vec::with_capacity(rules_len);
    for k in 0..rules_len {
        let left = r.read_bits(width)? as Symbol;
        let right = r.read_bits(width)? as Symbol;
        // a production may only reference older symbols
        if left >= sigma + k as Symbol || right >= sigma + k as Symbol {
            return Err(Error::Format("production references a younger symbol"));
        }
        rules.push((left, right));
    }

    let limit = sigma + rules_len as Symbol;
    let mut sequence = Vec::with_capacity(sequence_len);
    for _ in 0..sequence_len {
        let sym = r.read_bits(width)? as Symbol;
        if sym >= limit {
            return Err(Error::Format("sequence symbol out of range"));
        }
        sequence.push(sym);
    }

    Ok(RepairGrammar {
        alphabet,
        rules,
        sequence,
    })
}

fn decode_len(r: &mut BitReader<'_>) -> Result<usize, Error> {
    let coded = r.read_gamma()?;
    if coded > u32::MAX as u64 {
        return Err(Error::Format("length field out of range"));
    }
    Ok((coded - 1) as usize)
}
