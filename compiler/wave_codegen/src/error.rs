//! Code generator error types.
//!
//! The compiler is fail-fast: the first error aborts the run, and the CLI
//! collapses every variant into a fixed diagnostic line plus exit status 1.
//! The structured variants here exist for logging and for tests.

use thiserror::Error;
use wave_lexer_core::{Ident, ScanError};

/// A compilation error from the single-pass code generator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A literal failed to scan (string, integer, float).
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A specific punctuation byte was required.
    #[error("expected `{expected}` at byte {pos}, found {found:#04x}")]
    ExpectedByte {
        /// The required byte.
        expected: char,
        /// The byte actually present.
        found: u8,
        /// Byte offset of the mismatch.
        pos: u32,
    },

    /// An identifier was required (function name or parameter).
    #[error("expected an identifier at byte {pos}")]
    ExpectedIdent {
        /// Byte offset of the non-identifier.
        pos: u32,
    },

    /// An expression term was required.
    #[error("expected an expression at byte {pos}")]
    ExpectedExpression {
        /// Byte offset of the non-term.
        pos: u32,
    },

    /// A `{ ... }` block was still open at end of input.
    #[error("missing `}}` before end of input (block opened near byte {pos})")]
    MissingBlockClose {
        /// Byte offset where the close was expected.
        pos: u32,
    },

    /// `break` appeared outside any open loop.
    #[error("`break` outside of a loop at byte {pos}")]
    BreakOutsideLoop {
        /// Byte offset of the `break` keyword.
        pos: u32,
    },

    /// A function body was emitted twice for the same name.
    #[error("duplicate function `{name}`")]
    DuplicateFunction {
        /// The function name.
        name: Ident,
    },

    /// A `unified`/`fate` directive body did not parse.
    #[error("malformed directive at byte {pos}")]
    MalformedDirective {
        /// Byte offset of the offending byte.
        pos: u32,
    },

    /// The variable frame is full.
    #[error("too many variables (limit {limit})")]
    TooManyVariables {
        /// The frame capacity.
        limit: usize,
    },

    /// The function table is full.
    #[error("too many functions (limit {limit})")]
    TooManyFunctions {
        /// The table capacity.
        limit: usize,
    },

    /// A declaration carries more parameter names than the table records.
    #[error("too many parameters for `{name}` (limit {limit})")]
    TooManyParams {
        /// The function name.
        name: Ident,
        /// The per-function parameter capacity.
        limit: usize,
    },

    /// A call site passes more arguments than there are argument registers.
    #[error("too many arguments in call to `{name}` at byte {pos} (limit {limit})")]
    TooManyArguments {
        /// The callee name.
        name: Ident,
        /// Byte offset of the call.
        pos: u32,
        /// The argument register count.
        limit: usize,
    },

    /// Loops are nested deeper than the loop stack.
    #[error("loops nested too deeply (limit {limit})")]
    LoopTooDeep {
        /// The loop stack capacity.
        limit: usize,
    },

    /// The whole-program break fixup cap is exhausted.
    #[error("too many `break` statements (limit {limit})")]
    TooManyBreaks {
        /// The fixup capacity.
        limit: usize,
    },

    /// The emitted code outgrew the code buffer ceiling.
    #[error("emitted code exceeds {limit} bytes")]
    CodeTooLarge {
        /// The code buffer ceiling.
        limit: usize,
    },
}
