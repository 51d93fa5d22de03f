//! Byte-exact passthrough streaming and the unescaping string variant.

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::StreamError;
use crate::{ByteSource, JsonReader, ReaderOptions, Sink, ValueSink};

fn lenient(json: &str) -> JsonReader {
    JsonReader::with_options(
        ByteSource::of(json),
        ReaderOptions {
            lenient: true,
            ..ReaderOptions::default()
        },
    )
}

fn streamed_root(reader: &mut JsonReader) -> Vec<u8> {
    let mut sink = Vec::new();
    reader.stream_value(&mut sink).unwrap();
    sink
}

#[test]
fn whole_document_round_trips() {
    for json in [
        "{}",
        "[]",
        "[1, 2, 3]",
        r#"{"a":1}"#,
        r#"{"a": [true , null],  "b": {"c": "d"}}"#,
        r#"{"spacing"  :   [ 1 ,2,  3 ]}"#,
        r#""plain""#,
        r#"{"half": "\ud83d"}"#,
        "123",
        "12.75e-2",
        "true",
        "null",
    ] {
        let mut reader = JsonReader::of(json);
        assert_eq!(streamed_root(&mut reader), json.as_bytes(), "{json}");
    }
}

#[test]
fn leading_whitespace_is_not_part_of_the_value() {
    let mut reader = JsonReader::of("   {\"a\": 1}  ");
    assert_eq!(streamed_root(&mut reader), b"{\"a\": 1}");
}

#[test]
fn leading_comment_is_excluded_but_interior_comments_stream() {
    let mut reader = lenient("// hi\n{\"a\":/*c*/ 1}");
    assert_eq!(streamed_root(&mut reader), b"{\"a\":/*c*/ 1}");
}

#[test]
fn escaped_string_value_streams_verbatim() {
    // Scenario: {"a":"\"escaped\""} — the caller mirrors the object
    // structure itself and streams only the value.
    let json = r#"{"a":"\"escaped\""}"#;
    let mut reader = JsonReader::of(json);
    let mut rebuilt = Vec::new();
    reader.begin_object().unwrap();
    let name = reader.next_name().unwrap();
    rebuilt.extend_from_slice(b"{\"");
    rebuilt.extend_from_slice(name.as_bytes());
    rebuilt.extend_from_slice(b"\":");
    reader.stream_value(&mut rebuilt).unwrap();
    reader.end_object().unwrap();
    rebuilt.push(b'}');
    assert_eq!(rebuilt, json.as_bytes());
}

#[test]
fn every_structural_byte_escaped_round_trips() {
    let json = "{\"a\":\"{}[]:, \\n\\t\\r\\f/\\\\;#=\"}";
    let mut reader = JsonReader::of(json);
    assert_eq!(streamed_root(&mut reader), json.as_bytes());
}

#[test]
fn streamed_array_elements_concatenate_to_the_input() {
    // Streaming elements back to back routes each element separator into
    // the sink too, so the caller's own brackets complete the identity.
    let json = "[[1],[2],[3]]";
    let mut reader = JsonReader::of(json);
    reader.begin_array().unwrap();
    let mut out = Vec::new();
    out.push(b'[');
    reader.stream_value(&mut out).unwrap();
    assert_eq!(out, b"[[1]");
    assert_eq!(reader.path(), "$[1]");
    reader.stream_value(&mut out).unwrap();
    assert_eq!(reader.path(), "$[2]");
    reader.stream_value(&mut out).unwrap();
    reader.end_array().unwrap();
    out.push(b']');
    assert_eq!(out, json.as_bytes());
}

#[test]
fn stream_value_of_nested_member() {
    let json = r#"{"keep": {"x": [1,  2], "y": "z:}"}, "after": 1}"#;
    let mut reader = JsonReader::of(json);
    reader.begin_object().unwrap();
    assert_eq!(reader.next_name().unwrap(), "keep");
    let mut sink = Vec::new();
    reader.stream_value(&mut sink).unwrap();
    assert_eq!(sink, br#"{"x": [1,  2], "y": "z:}"}"#);
    assert_eq!(reader.next_name().unwrap(), "after");
    assert_eq!(reader.next_long().unwrap(), 1);
    reader.end_object().unwrap();
}

#[test]
fn stream_value_to_writer_invokes_the_hook() {
    struct IndentWriter {
        out: Vec<u8>,
        hook_calls: usize,
    }
    impl Sink for IndentWriter {
        fn write_all(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
            self.out.extend_from_slice(bytes);
            Ok(())
        }
    }
    impl ValueSink for IndentWriter {
        fn before_value(&mut self) -> Result<(), StreamError> {
            self.hook_calls += 1;
            self.out.extend_from_slice(b"\n  ");
            Ok(())
        }
    }

    let mut reader = JsonReader::of(r#"{"a": [1, 2]}"#);
    let mut writer = IndentWriter {
        out: Vec::new(),
        hook_calls: 0,
    };
    reader.begin_object().unwrap();
    assert_eq!(reader.next_name().unwrap(), "a");
    reader.stream_value_to_writer(&mut writer).unwrap();
    reader.end_object().unwrap();
    assert_eq!(writer.hook_calls, 1);
    assert_eq!(writer.out, b"\n  [1, 2]");
}

#[test]
fn unescape_keeps_quotes_and_decodes_escapes() {
    // "a\"c\"" unescapes to "a"c"" — six bytes, outer quotes included.
    let json = "\"a\\\"c\\\"\"";
    let mut reader = JsonReader::of(json);
    let mut sink = Vec::new();
    reader.stream_double_quoted_string_unescape(&mut sink).unwrap();
    assert_eq!(sink, b"\"a\"c\"\"");
    assert_eq!(sink.len(), 6);
}

#[test]
fn unescape_decodes_two_character_escapes() {
    let mut reader = JsonReader::of(r#""l1\nl2\tend\\""#);
    let mut sink = Vec::new();
    reader.stream_double_quoted_string_unescape(&mut sink).unwrap();
    assert_eq!(sink, b"\"l1\nl2\tend\\\"");
}

#[test]
fn unescape_writes_unicode_escapes_as_utf8() {
    let mut reader = JsonReader::of(r#""caf\u00e9""#);
    let mut sink = Vec::new();
    reader.stream_double_quoted_string_unescape(&mut sink).unwrap();
    assert_eq!(sink, "\"caf\u{e9}\"".as_bytes());
}

#[test]
fn unescape_combines_surrogate_pairs() {
    let mut reader = JsonReader::of(r#""\ud83d\ude00""#);
    let mut sink = Vec::new();
    reader.stream_double_quoted_string_unescape(&mut sink).unwrap();
    let mut expected = Vec::new();
    expected.push(b'"');
    expected.extend_from_slice("\u{1F600}".as_bytes());
    expected.push(b'"');
    assert_eq!(sink, expected);
}

#[test]
fn unescape_rejects_non_strings() {
    let mut reader = JsonReader::of("[1]");
    reader.begin_array().unwrap();
    let err = reader
        .stream_double_quoted_string_unescape(&mut Vec::new())
        .unwrap_err();
    assert!(err.is_data(), "{err}");
}

#[test]
fn unescape_advances_the_path() {
    let mut reader = JsonReader::of(r#"["a", "b"]"#);
    reader.begin_array().unwrap();
    reader
        .stream_double_quoted_string_unescape(&mut Vec::new())
        .unwrap();
    assert_eq!(reader.path(), "$[1]");
    assert_eq!(reader.next_string().unwrap(), "b");
    reader.end_array().unwrap();
}

#[test]
fn lone_surrogate_escape_passes_through() {
    // Passthrough only counts and copies bytes; unlike the decoding paths
    // it must not insist on surrogate pairing.
    let mut reader = JsonReader::of(r#"{"a": "\ud83d", "b": 1}"#);
    reader.begin_object().unwrap();
    assert_eq!(reader.next_name().unwrap(), "a");
    let mut sink = Vec::new();
    reader.stream_value(&mut sink).unwrap();
    assert_eq!(sink, br#""\ud83d""#);
    assert_eq!(reader.next_name().unwrap(), "b");
    assert_eq!(reader.next_long().unwrap(), 1);
    reader.end_object().unwrap();
}

#[test]
fn skip_value_accepts_lone_surrogate_escapes() {
    let mut reader = JsonReader::of(r#"["\ude00", 2]"#);
    reader.begin_array().unwrap();
    reader.skip_value().unwrap();
    assert_eq!(reader.next_long().unwrap(), 2);
    reader.end_array().unwrap();

    // Same for skipped names.
    let mut reader = JsonReader::of(r#"{"\ud83d": 1}"#);
    reader.begin_object().unwrap();
    reader.skip_name().unwrap();
    assert_eq!(reader.next_long().unwrap(), 1);
    reader.end_object().unwrap();
}

#[test]
fn mirrored_walk_reproduces_the_document() {
    // Mirror the outer structure manually, streaming each member value; the
    // concatenation equals the input (which carries no whitespace outside
    // the streamed values).
    let json = r#"{"a":[1, 2 ,3],"b":"x","c":{"d": null}}"#;
    let mut reader = JsonReader::of(json);
    let mut out = String::new();
    reader.begin_object().unwrap();
    out.push('{');
    let mut first = true;
    while reader.has_next().unwrap() {
        if !first {
            out.push(',');
        }
        first = false;
        let name = reader.next_name().unwrap();
        out.push('"');
        out.push_str(&name);
        out.push_str("\":");
        let mut sink = Vec::new();
        reader.stream_value(&mut sink).unwrap();
        out.push_str(core::str::from_utf8(&sink).unwrap());
    }
    reader.end_object().unwrap();
    out.push('}');
    assert_eq!(out.as_bytes(), json.as_bytes());
}
