//! Scanner error types.

use thiserror::Error;

/// A lexical error raised by the literal readers.
///
/// Wave compilation is fail-fast: the first error aborts the run, so these
/// carry just enough position detail to be loggable.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// A string literal was still open at end of input.
    #[error("unterminated string literal starting at byte {start}")]
    UnterminatedString {
        /// Byte offset of the opening `"`.
        start: u32,
    },
    /// A `\x` escape was not followed by two hex digits.
    #[error("invalid hex digit {byte:#04x} in \\x escape at byte {pos}")]
    InvalidHexEscape {
        /// The offending byte.
        byte: u8,
        /// Byte offset of the offending byte.
        pos: u32,
    },
    /// An integer literal does not fit in a signed 64-bit value.
    #[error("integer literal at byte {start} does not fit in 64 bits")]
    IntOverflow {
        /// Byte offset of the first literal byte.
        start: u32,
    },
    /// A digit was required and something else was found.
    #[error("expected a digit at byte {pos}")]
    ExpectedDigit {
        /// Byte offset of the non-digit.
        pos: u32,
    },
}
