//! Backslash escape-sequence decoding for delimited fields.
//!
//! Recognized forms: the fixed single-character escapes `\n \t \\ \r \f \v
//! \a \b \e`, hexadecimal `\u`/`\x` (up to four digits), decimal `\d` (up to
//! five digits), and octal `\o` (up to six digits). Variable-length forms stop
//! at the first non-digit; stopping early is not an error. An unrecognized
//! escape is not consumed at all, and the caller treats the backslash as a
//! literal character.

use std::io;

use crate::buffer::CharBuffer;
use crate::source::CharSource;

/// The character introducing an escape sequence.
pub(crate) const ESCAPE_CHAR: char = '\\';

/// Longest recognized sequence: `\oXXXXXX`.
const MAX_ESCAPE_LEN: usize = 8;

/// Attempts to decode one escape sequence at the buffer position, which must
/// hold [`ESCAPE_CHAR`].
///
/// Refills the window first when fewer than [`MAX_ESCAPE_LEN`] characters
/// remain, keeping the unconsumed tail, so a sequence straddling the window
/// edge decodes the same as one in the middle. On success the position is
/// advanced past the sequence; on failure nothing is consumed.
///
/// Callers must flush any pending value run into the builder before calling,
/// since the refill may discard it.
pub(crate) fn decode<S: CharSource>(buffer: &mut CharBuffer<S>) -> io::Result<Option<char>> {
    // Short reads and tiny windows may take several refills (growing the
    // window) before the full lookahead is visible.
    while buffer.len - buffer.pos < MAX_ESCAPE_LEN {
        if !buffer.fill(buffer.len - buffer.pos)? {
            break;
        }
    }

    let mut pos = buffer.pos;
    let end_index = buffer.len.saturating_sub(1);
    match decode_in_slice(&buffer.data[..buffer.len], &mut pos, end_index) {
        Some(value) => {
            buffer.pos = pos;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Decodes one escape sequence from `data`, starting at `*start` (which must
/// hold the escape character) and never reading past `end_index` (inclusive).
///
/// On success advances `*start` past the sequence and returns the decoded
/// character. Returns `None`, without touching `*start`, when the sequence is
/// unrecognized or fewer than two characters follow within the window.
pub(crate) fn decode_in_slice(
    data: &[char],
    start: &mut usize,
    end_index: usize,
) -> Option<char> {
    if *start >= data.len() || end_index >= data.len() {
        return None;
    }
    if end_index - *start < 2 || data[*start] != ESCAPE_CHAR {
        return None;
    }

    let mut pos = *start + 1;
    let value = match data[pos] {
        'n' => '\n',
        't' => '\t',
        '\\' => '\\',
        'r' => '\r',
        'f' => '\u{0C}',
        'v' => '\u{0B}',
        'a' => '\u{07}',
        'b' => '\u{08}',
        'e' => '\u{1B}',
        'u' | 'x' => {
            pos += 1;
            return finish_numeric(data, start, end_index, pos, 16, 4);
        }
        'd' => {
            pos += 1;
            return finish_numeric(data, start, end_index, pos, 10, 5);
        }
        'o' => {
            pos += 1;
            return finish_numeric(data, start, end_index, pos, 8, 6);
        }
        _ => return None,
    };

    *start = pos + 1;
    Some(value)
}

/// Accumulates up to `max_digits` digits in `radix`, stopping at the first
/// non-digit. Zero digits still decode (to NUL), matching the fixed-form
/// contract that the escape letter alone selects the value.
fn finish_numeric(
    data: &[char],
    start: &mut usize,
    end_index: usize,
    mut pos: usize,
    radix: u32,
    max_digits: usize,
) -> Option<char> {
    let mut value: u32 = 0;
    let mut digits = 0;
    while digits < max_digits && pos <= end_index {
        let Some(digit) = data[pos].to_digit(radix) else {
            break;
        };
        value = value * radix + digit;
        digits += 1;
        pos += 1;
    }

    // Out-of-range code points (lone surrogates and beyond) cannot become a
    // `char`; the caller falls back to a literal backslash.
    let decoded = char::from_u32(value)?;
    *start = pos;
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::decode_in_slice;

    fn decode(text: &str) -> (Option<char>, usize) {
        let data: Vec<char> = text.chars().collect();
        let mut start = 0;
        let end_index = data.len() - 1;
        let value = decode_in_slice(&data, &mut start, end_index);
        (value, start)
    }

    #[test]
    fn fixed_escapes_decode() {
        for (input, expected) in [
            ("\\n_.", '\n'),
            ("\\t_.", '\t'),
            ("\\\\_.", '\\'),
            ("\\r_.", '\r'),
            ("\\f_.", '\u{0C}'),
            ("\\v_.", '\u{0B}'),
            ("\\a_.", '\u{07}'),
            ("\\b_.", '\u{08}'),
            ("\\e_.", '\u{1B}'),
        ] {
            let (value, consumed) = decode(input);
            assert_eq!(value, Some(expected), "input {input:?}");
            assert_eq!(consumed, 2);
        }
    }

    #[test]
    fn hex_escape_reads_up_to_four_digits() {
        assert_eq!(decode("\\u0041rest"), (Some('A'), 6));
        assert_eq!(decode("\\x41,next"), (Some('A'), 4));
        // A fifth digit belongs to the field, not the escape.
        assert_eq!(decode("\\u00411"), (Some('A'), 6));
    }

    #[test]
    fn decimal_and_octal_escapes() {
        assert_eq!(decode("\\d65,"), (Some('A'), 4));
        assert_eq!(decode("\\o101,"), (Some('A'), 5));
        // Five digits maximum: `06553` decodes and the final `5` stays put.
        assert_eq!(decode("\\d065535."), (Some('\u{1999}'), 7));
    }

    #[test]
    fn digits_stop_at_first_non_digit() {
        assert_eq!(decode("\\d9x_"), (Some('\t'), 3));
        // Octal digits exclude 8 and 9.
        assert_eq!(decode("\\o79_"), (Some('\u{07}'), 3));
    }

    #[test]
    fn zero_digits_decode_to_nul() {
        assert_eq!(decode("\\uzz"), (Some('\0'), 2));
    }

    #[test]
    fn unrecognized_escape_is_not_consumed() {
        assert_eq!(decode("\\q__"), (None, 0));
    }

    #[test]
    fn too_little_lookahead_is_not_consumed() {
        // Fewer than two characters after the backslash within the window.
        assert_eq!(decode("\\n"), (None, 0));
    }

    #[test]
    fn surrogate_code_point_falls_back_to_literal() {
        assert_eq!(decode("\\ud800__"), (None, 0));
    }
}
