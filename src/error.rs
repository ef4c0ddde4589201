use thiserror::Error;

/// Errors surfaced by compression, decompression and archive decoding.
///
/// Internal invariant violations are not represented here; they are
/// programmer errors and abort via assertions.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file could not be read or the output could not be written.
    #[error("i/o error: {0}")]
    Input(#[from] std::io::Error),

    /// The input is too long for the 32-bit index width.
    #[error("input of {len} bytes exceeds the 32-bit index range")]
    Capacity { len: u64 },

    /// The archive is truncated or structurally invalid.
    #[error("malformed archive: {0}")]
    Format(&'static str),
}
