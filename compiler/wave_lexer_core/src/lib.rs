//! Low-level source scanner for the Wave programming language.
//!
//! This crate provides a standalone byte-level scanner with **zero `wave_*`
//! dependencies**. It is designed to be reusable by external tools
//! (syntax highlighter, formatter) without pulling in the code generator.
//!
//! # Architecture
//!
//! Wave is compiled in a single pass with no token stream: the statement
//! compiler in `wave_codegen` drives a [`Cursor`] directly and asks
//! targeted questions ("is the keyword `loop` here?", "read an integer").
//! This crate supplies those primitives:
//!
//! - [`SourceBuffer`] / [`Cursor`]: sentinel-terminated buffer and the
//!   byte cursor over it. EOF reads as `0x00` with no bounds checks on the
//!   hot path.
//! - [`Ident`]: the fixed 32-byte identifier name. At most 31 bytes are
//!   meaningful; longer lexemes truncate silently.
//! - [`probe`]: keyword probes and literal readers (integers, fixed-point
//!   floats, escaped strings).
//!
//! # Usage
//!
//! ```
//! use wave_lexer_core::{probe, SourceBuffer};
//!
//! let buf = SourceBuffer::new(b"out \"hi\"");
//! let mut cursor = buf.cursor();
//! assert!(probe::at_keyword(&cursor, b"out"));
//! cursor.advance_n(4);
//! assert_eq!(probe::read_string(&mut cursor), Ok(b"hi".to_vec()));
//! ```

mod cursor;
mod ident;
pub mod probe;
mod scan_error;
mod source_buffer;

pub use cursor::{is_ident_continue, is_ident_start, Cursor};
pub use ident::Ident;
pub use scan_error::ScanError;
pub use source_buffer::SourceBuffer;
