//! Keyword probes and literal readers.
//!
//! Wave has no token stream. The statement compiler asks targeted
//! questions of the [`Cursor`] instead: [`at_keyword`] inspects raw bytes
//! without advancing, and the `read_*` functions consume exactly one
//! literal and leave the cursor on the byte after it.

use crate::{is_ident_continue, is_ident_start, Cursor, Ident, ScanError};

/// Returns `true` if `keyword` starts at the cursor and is not the prefix
/// of a longer identifier.
///
/// The trailing-delimiter check is what distinguishes the keyword in
/// `out "x"` from an assignment to a variable named `output`: the byte
/// after the keyword must be one that cannot continue an identifier
/// (whitespace, `"`, `(`, `{`, EOF, ...). Does not advance.
#[allow(clippy::cast_possible_truncation)] // keyword literals are < 16 bytes
pub fn at_keyword(cursor: &Cursor<'_>, keyword: &[u8]) -> bool {
    cursor.starts_with(keyword) && !is_ident_continue(cursor.peek_at(keyword.len() as u32))
}

/// Read an identifier at the cursor.
///
/// The caller has already checked `is_ident_start(cursor.current())`.
/// Every identifier byte is consumed; bytes past [`Ident::MAX_LEN`] are
/// dropped silently.
pub fn read_ident(cursor: &mut Cursor<'_>) -> Ident {
    debug_assert!(is_ident_start(cursor.current()));
    let mut lexeme = [0u8; Ident::MAX_LEN];
    let mut len = 0usize;
    while is_ident_continue(cursor.current()) {
        let b = cursor.advance();
        if len < lexeme.len() {
            lexeme[len] = b;
            len += 1;
        }
    }
    Ident::new(&lexeme[..len])
}

/// Read a decimal integer literal, with an optional leading `-`.
///
/// The value is accumulated negated so that `i64::MIN` parses; anything
/// outside the signed 64-bit range is an error rather than a silent wrap.
pub fn read_int(cursor: &mut Cursor<'_>) -> Result<i64, ScanError> {
    let start = cursor.pos();
    let negative = cursor.current() == b'-';
    if negative {
        cursor.advance();
    }
    if !cursor.current().is_ascii_digit() {
        return Err(ScanError::ExpectedDigit { pos: cursor.pos() });
    }

    let mut value: i64 = 0;
    while cursor.current().is_ascii_digit() {
        let digit = i64::from(cursor.advance() - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_sub(digit))
            .ok_or(ScanError::IntOverflow { start })?;
    }

    if negative {
        Ok(value)
    } else {
        value.checked_neg().ok_or(ScanError::IntOverflow { start })
    }
}

/// Read a decimal literal `int[.frac]` as a fixed-point value x1000.
///
/// Floats exist only inside `unified { ... }` blocks as compile-time
/// configuration. The first three fractional digits carry weight
/// (milli-units); any further digits are consumed and dropped.
pub fn read_fixed_float(cursor: &mut Cursor<'_>) -> Result<i64, ScanError> {
    let start = cursor.pos();
    let negative = cursor.current() == b'-';
    if negative {
        cursor.advance();
    }
    if !cursor.current().is_ascii_digit() {
        return Err(ScanError::ExpectedDigit { pos: cursor.pos() });
    }

    let mut int_part: i64 = 0;
    while cursor.current().is_ascii_digit() {
        let digit = i64::from(cursor.advance() - b'0');
        int_part = int_part
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(ScanError::IntOverflow { start })?;
    }
    let mut milli = int_part
        .checked_mul(1000)
        .ok_or(ScanError::IntOverflow { start })?;

    if cursor.current() == b'.' {
        cursor.advance();
        if !cursor.current().is_ascii_digit() {
            return Err(ScanError::ExpectedDigit { pos: cursor.pos() });
        }
        let mut scale: i64 = 100;
        while cursor.current().is_ascii_digit() {
            let digit = i64::from(cursor.advance() - b'0');
            milli = milli
                .checked_add(digit * scale)
                .ok_or(ScanError::IntOverflow { start })?;
            scale /= 10;
        }
    }

    if negative {
        Ok(-milli)
    } else {
        Ok(milli)
    }
}

/// Read a `"`-delimited string literal, decoding escapes.
///
/// Escapes: `\n` `\t` `\r` `\0` and `\xHH` (hex digits in either case).
/// Any other escaped byte passes through literally, so `\"` is a quote and
/// `\\` a backslash. Raw bytes, including newlines and non-ASCII, pass
/// through untouched. The cursor must be on the opening `"`.
pub fn read_string(cursor: &mut Cursor<'_>) -> Result<Vec<u8>, ScanError> {
    debug_assert_eq!(cursor.current(), b'"');
    let start = cursor.pos();
    cursor.advance();

    let mut bytes = Vec::new();
    loop {
        match cursor.current() {
            0 if cursor.is_eof() => return Err(ScanError::UnterminatedString { start }),
            b'"' => {
                cursor.advance();
                return Ok(bytes);
            }
            b'\\' => {
                cursor.advance();
                bytes.push(read_escape(cursor, start)?);
            }
            _ => bytes.push(cursor.advance()),
        }
    }
}

/// Decode one escape, cursor positioned on the byte after the backslash.
fn read_escape(cursor: &mut Cursor<'_>, start: u32) -> Result<u8, ScanError> {
    match cursor.current() {
        0 if cursor.is_eof() => Err(ScanError::UnterminatedString { start }),
        b'n' => {
            cursor.advance();
            Ok(b'\n')
        }
        b't' => {
            cursor.advance();
            Ok(b'\t')
        }
        b'r' => {
            cursor.advance();
            Ok(b'\r')
        }
        b'0' => {
            cursor.advance();
            Ok(0)
        }
        b'x' => {
            cursor.advance();
            let hi = hex_digit(cursor)?;
            let lo = hex_digit(cursor)?;
            Ok((hi << 4) | lo)
        }
        _ => Ok(cursor.advance()),
    }
}

/// Consume one hex digit, in either case.
fn hex_digit(cursor: &mut Cursor<'_>) -> Result<u8, ScanError> {
    let b = cursor.current();
    let value = match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => {
            return Err(ScanError::InvalidHexEscape {
                byte: b,
                pos: cursor.pos(),
            })
        }
    };
    cursor.advance();
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceBuffer;
    use pretty_assertions::assert_eq;

    fn cursor_over(buf: &SourceBuffer) -> Cursor<'_> {
        buf.cursor()
    }

    // === at_keyword ===

    #[test]
    fn keyword_followed_by_space_matches() {
        let buf = SourceBuffer::new(b"out \"x\"");
        assert!(at_keyword(&cursor_over(&buf), b"out"));
    }

    #[test]
    fn keyword_followed_by_quote_matches() {
        let buf = SourceBuffer::new(b"out\"x\"");
        assert!(at_keyword(&cursor_over(&buf), b"out"));
    }

    #[test]
    fn keyword_followed_by_paren_matches() {
        let buf = SourceBuffer::new(b"byte(65)");
        assert!(at_keyword(&cursor_over(&buf), b"byte"));
    }

    #[test]
    fn keyword_as_identifier_prefix_does_not_match() {
        let buf = SourceBuffer::new(b"output = 1");
        assert!(!at_keyword(&cursor_over(&buf), b"out"));
        let buf = SourceBuffer::new(b"emitter = 1");
        assert!(!at_keyword(&cursor_over(&buf), b"emit"));
    }

    #[test]
    fn keyword_at_eof_matches() {
        let buf = SourceBuffer::new(b"break");
        assert!(at_keyword(&cursor_over(&buf), b"break"));
    }

    #[test]
    fn dotted_keyword_rejects_longer_ident() {
        let buf = SourceBuffer::new(b"syscall.exit2(0)");
        assert!(!at_keyword(&cursor_over(&buf), b"syscall.exit"));
        let buf = SourceBuffer::new(b"syscall.exit(0)");
        assert!(at_keyword(&cursor_over(&buf), b"syscall.exit"));
    }

    // === read_ident ===

    #[test]
    fn reads_simple_ident() {
        let buf = SourceBuffer::new(b"counter = 1");
        let mut cursor = buf.cursor();
        assert_eq!(read_ident(&mut cursor), Ident::new(b"counter"));
        assert_eq!(cursor.current(), b' ');
    }

    #[test]
    fn reads_dotted_ident() {
        let buf = SourceBuffer::new(b"syscall.exit(");
        let mut cursor = buf.cursor();
        assert_eq!(read_ident(&mut cursor), Ident::new(b"syscall.exit"));
        assert_eq!(cursor.current(), b'(');
    }

    #[test]
    fn long_ident_is_truncated_but_fully_consumed() {
        let mut source = vec![b'a'; 40];
        source.push(b'(');
        let buf = SourceBuffer::new(&source);
        let mut cursor = buf.cursor();
        let id = read_ident(&mut cursor);
        assert_eq!(id.len(), Ident::MAX_LEN);
        // All 40 bytes consumed, cursor on the paren.
        assert_eq!(cursor.current(), b'(');
    }

    // === read_int ===

    #[test]
    fn reads_zero() {
        let buf = SourceBuffer::new(b"0");
        assert_eq!(read_int(&mut buf.cursor()), Ok(0));
    }

    #[test]
    fn reads_positive() {
        let buf = SourceBuffer::new(b"48)");
        let mut cursor = buf.cursor();
        assert_eq!(read_int(&mut cursor), Ok(48));
        assert_eq!(cursor.current(), b')');
    }

    #[test]
    fn reads_negative() {
        let buf = SourceBuffer::new(b"-7 ");
        assert_eq!(read_int(&mut buf.cursor()), Ok(-7));
    }

    #[test]
    fn reads_i64_extremes() {
        let buf = SourceBuffer::new(b"9223372036854775807");
        assert_eq!(read_int(&mut buf.cursor()), Ok(i64::MAX));
        let buf = SourceBuffer::new(b"-9223372036854775808");
        assert_eq!(read_int(&mut buf.cursor()), Ok(i64::MIN));
    }

    #[test]
    fn overflow_is_an_error() {
        let buf = SourceBuffer::new(b"9223372036854775808");
        assert_eq!(
            read_int(&mut buf.cursor()),
            Err(ScanError::IntOverflow { start: 0 })
        );
    }

    #[test]
    fn bare_minus_is_an_error() {
        let buf = SourceBuffer::new(b"- x");
        assert_eq!(
            read_int(&mut buf.cursor()),
            Err(ScanError::ExpectedDigit { pos: 1 })
        );
    }

    // === read_fixed_float ===

    #[test]
    fn integer_float_scales_by_1000() {
        let buf = SourceBuffer::new(b"2,");
        let mut cursor = buf.cursor();
        assert_eq!(read_fixed_float(&mut cursor), Ok(2000));
        assert_eq!(cursor.current(), b',');
    }

    #[test]
    fn fractional_digits_are_milli_units() {
        let buf = SourceBuffer::new(b"1.5");
        assert_eq!(read_fixed_float(&mut buf.cursor()), Ok(1500));
        let buf = SourceBuffer::new(b"0.25");
        assert_eq!(read_fixed_float(&mut buf.cursor()), Ok(250));
        let buf = SourceBuffer::new(b"3.141");
        assert_eq!(read_fixed_float(&mut buf.cursor()), Ok(3141));
    }

    #[test]
    fn fourth_fractional_digit_is_dropped() {
        let buf = SourceBuffer::new(b"3.14159}");
        let mut cursor = buf.cursor();
        assert_eq!(read_fixed_float(&mut cursor), Ok(3141));
        assert_eq!(cursor.current(), b'}');
    }

    #[test]
    fn negative_float() {
        let buf = SourceBuffer::new(b"-0.5");
        assert_eq!(read_fixed_float(&mut buf.cursor()), Ok(-500));
    }

    #[test]
    fn dot_without_digits_is_an_error() {
        let buf = SourceBuffer::new(b"1. ");
        assert_eq!(
            read_fixed_float(&mut buf.cursor()),
            Err(ScanError::ExpectedDigit { pos: 2 })
        );
    }

    // === read_string ===

    #[test]
    fn plain_string() {
        let buf = SourceBuffer::new(b"\"Hello\" rest");
        let mut cursor = buf.cursor();
        assert_eq!(read_string(&mut cursor), Ok(b"Hello".to_vec()));
        assert_eq!(cursor.current(), b' ');
    }

    #[test]
    fn empty_string() {
        let buf = SourceBuffer::new(b"\"\"");
        assert_eq!(read_string(&mut buf.cursor()), Ok(Vec::new()));
    }

    #[test]
    fn named_escapes() {
        let buf = SourceBuffer::new(b"\"a\\tb\\n\\r\\0\"");
        assert_eq!(
            read_string(&mut buf.cursor()),
            Ok(vec![b'a', 0x09, b'b', 0x0A, 0x0D, 0x00])
        );
    }

    #[test]
    fn hex_escapes_both_cases() {
        let buf = SourceBuffer::new(b"\"\\x41\\x6a\\xFF\"");
        assert_eq!(read_string(&mut buf.cursor()), Ok(vec![0x41, 0x6A, 0xFF]));
    }

    #[test]
    fn unknown_escape_passes_byte_through() {
        let buf = SourceBuffer::new(b"\"\\\"\\\\\\q\"");
        assert_eq!(
            read_string(&mut buf.cursor()),
            Ok(vec![b'"', b'\\', b'q'])
        );
    }

    #[test]
    fn raw_newline_passes_through() {
        let buf = SourceBuffer::new(b"\"a\nb\"");
        assert_eq!(read_string(&mut buf.cursor()), Ok(b"a\nb".to_vec()));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let buf = SourceBuffer::new(b"\"oops");
        assert_eq!(
            read_string(&mut buf.cursor()),
            Err(ScanError::UnterminatedString { start: 0 })
        );
    }

    #[test]
    fn trailing_backslash_is_unterminated() {
        let buf = SourceBuffer::new(b"\"oops\\");
        assert_eq!(
            read_string(&mut buf.cursor()),
            Err(ScanError::UnterminatedString { start: 0 })
        );
    }

    #[test]
    fn bad_hex_digit_is_fatal() {
        let buf = SourceBuffer::new(b"\"\\xg1\"");
        assert_eq!(
            read_string(&mut buf.cursor()),
            Err(ScanError::InvalidHexEscape { byte: b'g', pos: 3 })
        );
    }

    // === Property tests ===

    mod proptest_readers {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn read_int_agrees_with_str_parse(n in any::<i64>()) {
                let text = n.to_string();
                let buf = SourceBuffer::new(text.as_bytes());
                prop_assert_eq!(read_int(&mut buf.cursor()), Ok(n));
            }

            #[test]
            fn read_int_consumes_exactly_the_literal(n in any::<i64>(), tail in "[ )+*]{0,4}") {
                let text = format!("{n}{tail}");
                let buf = SourceBuffer::new(text.as_bytes());
                let mut cursor = buf.cursor();
                prop_assert_eq!(read_int(&mut cursor), Ok(n));
                prop_assert_eq!(cursor.pos() as usize, n.to_string().len());
            }

            #[test]
            fn ident_equality_is_31_byte_prefix_equality(
                a in "[a-z_][a-z0-9_.]{0,40}",
                b in "[a-z_][a-z0-9_.]{0,40}",
            ) {
                let ia = Ident::new(a.as_bytes());
                let ib = Ident::new(b.as_bytes());
                let ka = &a.as_bytes()[..a.len().min(Ident::MAX_LEN)];
                let kb = &b.as_bytes()[..b.len().min(Ident::MAX_LEN)];
                prop_assert_eq!(ia == ib, ka == kb);
            }

            #[test]
            fn escape_free_strings_round_trip(s in "[a-zA-Z0-9 .,!?]{0,64}") {
                let text = format!("\"{s}\"");
                let buf = SourceBuffer::new(text.as_bytes());
                prop_assert_eq!(read_string(&mut buf.cursor()), Ok(s.as_bytes().to_vec()));
            }
        }
    }
}
