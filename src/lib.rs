//! # Re-Pair Grammar Compression
//!
//! A Rust implementation of the Re-Pair algorithm: a straight-line
//! context-free grammar is built by repeatedly replacing the most frequent
//! pair of adjacent symbols with a fresh non-terminal, until no pair occurs
//! at least twice.
//!
//! ## Example
//!
//! ```
//! use repair_rs::repair;
//!
//! let grammar = repair(b"ababab").unwrap();
//!
//! // one rule for "ab", one for its repetition
//! assert_eq!(grammar.rules.len(), 2);
//!
//! // expansion reconstructs the original bytes
//! assert_eq!(grammar.expand(), b"ababab");
//! ```
//!
//! ## Working set
//!
//! Inputs up to roughly 4 GiB run with 32-bit internal indices. Pairs are
//! partitioned at a frequency cutoff of about `n^(2/3)`: the few pairs
//! above it are processed over a small position index, the rest over the
//! full index in bounded batches, keeping the total working set near
//! `(2n + sqrt(n)) * log n` bits.
//!
//! ## Archive
//!
//! [`archive`] frames the grammar as a self-validating binary file; the
//! `rp` binary wires it to `compress`/`decompress` subcommands.

mod bits;
mod engine;
mod error;
mod grammar;
mod hf_queue;
mod lf_queue;
mod positions;
mod queue;
mod symbol;
mod text;

pub mod archive;

#[cfg(test)]
mod tests;

pub use engine::repair;
pub use error::Error;
pub use grammar::{GrammarStats, RepairGrammar};
pub use symbol::{Pair, Symbol};
