//! Function pre-scan: the first pass over source.
//!
//! Populates the [`FnTable`] with every top-level `fn NAME PARAM... {`
//! declaration — names and parameter lists, not code offsets — so that a
//! call site can be compiled before its callee's body has been reached.
//! Bodies are skipped by brace-depth counting; `#` comments and string
//! literals are skipped structurally so that a literal brace (say, in
//! `out "{"`) cannot desynchronize the depth count.
//!
//! The code-gen pass then starts over from byte 0 with the table in hand.

use tracing::debug;
use wave_lexer_core::{is_ident_start, probe, Cursor, SourceBuffer};

use crate::symbols::{FnTable, ParamList, MAX_PARAMS};
use crate::CompileError;

/// Scan `source` for top-level function declarations, filling `table`.
pub fn prescan(source: &SourceBuffer, table: &mut FnTable) -> Result<(), CompileError> {
    let mut cursor = source.cursor();
    let mut depth: u32 = 0;

    loop {
        cursor.skip_whitespace();
        let b = cursor.current();
        match b {
            0 if cursor.is_eof() => break,
            b'#' => cursor.skip_line(),
            b'"' => skip_string(&mut cursor),
            b'{' => {
                depth += 1;
                cursor.advance();
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                cursor.advance();
            }
            _ if depth == 0 && probe::at_keyword(&cursor, b"fn") => {
                cursor.advance_n(2);
                declare_function(&mut cursor, table)?;
            }
            _ if is_ident_start(b) => {
                // Consume whole identifiers so `fnord` can't half-match.
                probe::read_ident(&mut cursor);
            }
            _ => {
                cursor.advance();
            }
        }
    }
    Ok(())
}

/// Parse `NAME PARAM... ` up to (but not through) the opening `{` and
/// declare it. The main loop then sees the `{` and tracks the body depth.
fn declare_function(cursor: &mut Cursor<'_>, table: &mut FnTable) -> Result<(), CompileError> {
    cursor.skip_whitespace();
    if !is_ident_start(cursor.current()) {
        return Err(CompileError::ExpectedIdent { pos: cursor.pos() });
    }
    let name = probe::read_ident(cursor);

    let mut params = ParamList::new();
    loop {
        cursor.skip_whitespace();
        let b = cursor.current();
        if b == b'{' {
            break;
        }
        if is_ident_start(b) {
            if params.len() == MAX_PARAMS {
                return Err(CompileError::TooManyParams {
                    name,
                    limit: MAX_PARAMS,
                });
            }
            params.push(probe::read_ident(cursor));
        } else {
            // Anything else (EOF included) means the declaration never
            // opens its body.
            return Err(CompileError::ExpectedByte {
                expected: '{',
                found: b,
                pos: cursor.pos(),
            });
        }
    }

    debug!(name = %name, params = params.len(), "pre-scanned function");
    table.declare(name, params)
}

/// Skip a string literal without decoding it.
///
/// Escape pairs are consumed blindly — `\"` must not close the literal and
/// `\x` digits need no validation here; the code-gen pass re-reads every
/// literal it actually compiles. Unterminated literals simply run to EOF
/// and are reported by the second pass.
fn skip_string(cursor: &mut Cursor<'_>) {
    debug_assert_eq!(cursor.current(), b'"');
    cursor.advance();
    loop {
        match cursor.current() {
            0 if cursor.is_eof() => break,
            b'"' => {
                cursor.advance();
                break;
            }
            b'\\' => {
                cursor.advance();
                if !cursor.is_eof() {
                    cursor.advance();
                }
            }
            _ => {
                cursor.advance();
            }
        }
    }
}
