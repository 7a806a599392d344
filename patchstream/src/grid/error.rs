//! Codec error types.

use thiserror::Error;

/// Errors from decoding the binary grid format.
///
/// All variants are fatal for the fetch that produced the bytes, never
/// for the pipeline as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Magic token mismatch: the bytes are not a grid file.
    #[error("invalid grid format: magic token {found:#010x}")]
    InvalidFormat {
        /// Token found at the start of the input.
        found: u32,
    },

    /// Recognized grid file with an unsupported format version.
    #[error("unsupported grid version {found:#010x}")]
    UnsupportedVersion {
        /// Version found in the header.
        found: u32,
    },

    /// Input ended before a declared section was fully read.
    #[error("truncated input: needed {needed} more bytes, {remaining} remaining")]
    TruncatedInput {
        /// Bytes the current read required.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
}
