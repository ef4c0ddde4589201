//! Symbol codes shared by the text, the position index and the queues.
//!
//! The first `sigma` values index the alphabet map (byte -> symbol); values
//! from `sigma` upward name grammar productions. The all-ones code is
//! reserved as the blank marker for erased text positions.

/// A terminal or non-terminal symbol code.
pub type Symbol = u32;

/// An ordered pair of adjacent symbols.
pub type Pair = (Symbol, Symbol);

/// Reserved code marking an erased text position.
///
/// `BLANK` never appears as an alphabet or grammar symbol; inputs are
/// capacity-checked so that `sigma + |G| < BLANK`.
pub const BLANK: Symbol = u32::MAX;
