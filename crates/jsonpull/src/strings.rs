//! Encoding text as JSON double-quoted string literals.
//!
//! Used to precompute `select_*` match suffixes and to re-encode an already
//! buffered string when `next_source` seeds its prefix.

use alloc::vec::Vec;
use core::fmt::Write as _;

/// Appends `value` as a complete JSON string literal, quotes included.
pub(crate) fn push_json_string(out: &mut Vec<u8>, value: &str) {
    out.push(b'"');
    push_json_string_contents(out, value);
    out.push(b'"');
}

/// Appends the escaped contents of `value`, without surrounding quotes.
///
/// Escaping is the writer's minimal form: `"` and `\` are escaped, control
/// characters use their short escapes where one exists and `\u00XX`
/// otherwise. Multi-byte UTF-8 passes through untouched.
pub(crate) fn push_json_string_contents(out: &mut Vec<u8>, value: &str) {
    for &b in value.as_bytes() {
        match b {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            0x08 => out.extend_from_slice(b"\\b"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\n' => out.extend_from_slice(b"\\n"),
            0x0C => out.extend_from_slice(b"\\f"),
            b'\r' => out.extend_from_slice(b"\\r"),
            0x00..=0x1F => {
                let mut hex = alloc::string::String::new();
                let _ = write!(hex, "\\u{b:04x}");
                out.extend_from_slice(hex.as_bytes());
            }
            _ => out.push(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn encoded(value: &str) -> Vec<u8> {
        let mut out = Vec::new();
        push_json_string(&mut out, value);
        out
    }

    #[test]
    fn plain_text_is_quoted_verbatim() {
        assert_eq!(encoded("hello"), b"\"hello\"");
        assert_eq!(encoded(""), b"\"\"");
    }

    #[test]
    fn quotes_and_backslashes_escape() {
        assert_eq!(encoded("a\"b"), b"\"a\\\"b\"");
        assert_eq!(encoded("a\\b"), b"\"a\\\\b\"");
    }

    #[test]
    fn control_characters_escape() {
        assert_eq!(encoded("a\nb\tc"), b"\"a\\nb\\tc\"");
        assert_eq!(encoded("\u{0000}"), b"\"\\u0000\"");
        assert_eq!(encoded("\u{001F}"), b"\"\\u001f\"");
    }

    #[test]
    fn multibyte_passes_through() {
        assert_eq!(encoded("caf\u{e9}"), "\"caf\u{e9}\"".as_bytes());
    }
}
