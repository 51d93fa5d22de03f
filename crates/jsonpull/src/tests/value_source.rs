//! Raw value extraction through `next_source`.

use alloc::vec::Vec;

use crate::tests::ChunkedFill;
use crate::{ByteSource, JsonReader, ReadError, ReaderOptions};

fn raw_value(reader: &mut JsonReader) -> Vec<u8> {
    let mut out = Vec::new();
    let mut source = reader.next_source().unwrap();
    source.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn string_value_keeps_its_quotes() {
    let mut reader = JsonReader::of(r#"{"k": "v"}"#);
    reader.begin_object().unwrap();
    assert_eq!(reader.next_name().unwrap(), "k");
    assert_eq!(raw_value(&mut reader), b"\"v\"");
    reader.end_object().unwrap();
}

#[test]
fn nested_object_extracts_verbatim() {
    let mut reader = JsonReader::of(r#"{"k": {"a":[1,2], "s":"}\""}, "t": 0}"#);
    reader.begin_object().unwrap();
    reader.next_name().unwrap();
    assert_eq!(raw_value(&mut reader), br#"{"a":[1,2], "s":"}\""}"#);
    assert_eq!(reader.next_name().unwrap(), "t");
    assert_eq!(reader.next_long().unwrap(), 0);
    reader.end_object().unwrap();
}

#[test]
fn primitives_are_served_from_the_prefix() {
    let mut reader = JsonReader::of("[12.5e3, true, null, 42]");
    reader.begin_array().unwrap();
    assert_eq!(raw_value(&mut reader), b"12.5e3");
    assert_eq!(raw_value(&mut reader), b"true");
    assert_eq!(raw_value(&mut reader), b"null");
    assert_eq!(raw_value(&mut reader), b"42");
    reader.end_array().unwrap();
}

#[test]
fn array_value_tracks_nesting() {
    let mut reader = JsonReader::of(r#"[[1, [2, {"x": "]"}]], 9]"#);
    reader.begin_array().unwrap();
    assert_eq!(raw_value(&mut reader), br#"[1, [2, {"x": "]"}]]"#);
    assert_eq!(reader.next_long().unwrap(), 9);
    reader.end_array().unwrap();
}

#[test]
fn escapes_do_not_terminate_strings() {
    let mut reader = JsonReader::of(r#"["a\"b\\"]"#);
    reader.begin_array().unwrap();
    assert_eq!(raw_value(&mut reader), br#""a\"b\\""#);
    reader.end_array().unwrap();
}

#[test]
fn partial_read_is_drained_by_the_next_operation() {
    let mut reader = JsonReader::of(r#"{"k": [1, 2, 3], "t": 7}"#);
    reader.begin_object().unwrap();
    reader.next_name().unwrap();
    {
        let mut source = reader.next_source().unwrap();
        // The prefix (the opener the reader already consumed) comes first.
        let mut opener = [0u8; 1];
        assert_eq!(source.read(&mut opener).unwrap(), 1);
        assert_eq!(&opener, b"[");
        let mut chunk = [0u8; 2];
        assert_eq!(source.read(&mut chunk).unwrap(), 2);
        assert_eq!(&chunk, b"1,");
        // Dropped mid-value.
    }
    assert_eq!(reader.next_name().unwrap(), "t");
    assert_eq!(reader.next_long().unwrap(), 7);
    reader.end_object().unwrap();
}

#[test]
fn close_refuses_while_a_source_is_outstanding() {
    let mut reader = JsonReader::of(r#"{"k": [1]}"#);
    reader.begin_object().unwrap();
    reader.next_name().unwrap();
    {
        let _source = reader.next_source().unwrap();
    }
    let err = reader.close().unwrap_err();
    assert!(matches!(err, ReadError::ValueSourceOpen), "{err}");

    // Any reader operation drains the leftover; closing then succeeds.
    assert!(!reader.has_next().unwrap());
    reader.end_object().unwrap();
    reader.close().unwrap();
}

#[test]
fn value_source_advances_the_array_index() {
    let mut reader = JsonReader::of(r#"["a", "b"]"#);
    reader.begin_array().unwrap();
    assert_eq!(raw_value(&mut reader), b"\"a\"");
    assert_eq!(reader.path(), "$[1]");
    assert_eq!(reader.next_string().unwrap(), "b");
    reader.end_array().unwrap();
}

#[test]
fn next_source_rejects_names_and_ends() {
    let mut reader = JsonReader::of(r#"{"k": 1}"#);
    reader.begin_object().unwrap();
    let err = reader.next_source().unwrap_err();
    assert!(err.is_data(), "{err}");
    assert_eq!(reader.next_name().unwrap(), "k");
    assert_eq!(reader.next_long().unwrap(), 1);
    reader.end_object().unwrap();
}

#[test]
fn buffered_string_is_reencoded() {
    // A select miss leaves the string buffered; next_source re-encodes it
    // as a JSON literal.
    let options = crate::SelectOptions::of(&["other"]);
    let mut reader = JsonReader::of(r#"["say \"hi\""]"#);
    reader.begin_array().unwrap();
    assert_eq!(reader.select_string(&options).unwrap(), None);
    assert_eq!(raw_value(&mut reader), br#""say \"hi\"""#);
    reader.end_array().unwrap();
}

#[test]
fn works_over_trickled_input() {
    let json = r#"{"k": {"deep": [true, "x]"]}}"#;
    let mut reader = JsonReader::new(ByteSource::with_fill(ChunkedFill::new(json, 1)));
    reader.begin_object().unwrap();
    reader.next_name().unwrap();
    assert_eq!(raw_value(&mut reader), br#"{"deep": [true, "x]"]}"#);
    reader.end_object().unwrap();
}

#[test]
fn single_quoted_value_streams_in_lenient_mode() {
    let mut reader = JsonReader::with_options(
        ByteSource::of("['a\\'b']"),
        ReaderOptions {
            lenient: true,
            ..ReaderOptions::default()
        },
    );
    reader.begin_array().unwrap();
    assert_eq!(raw_value(&mut reader), b"'a\\'b'");
    reader.end_array().unwrap();
}

#[cfg(feature = "std")]
#[test]
fn value_source_implements_io_read() {
    use std::io::Read as _;

    let mut reader = JsonReader::of(r#"{"k": {"n": 5}}"#);
    reader.begin_object().unwrap();
    reader.next_name().unwrap();
    let mut source = reader.next_source().unwrap();
    let mut text = std::string::String::new();
    source.read_to_string(&mut text).unwrap();
    assert_eq!(text, r#"{"n": 5}"#);
    reader.end_object().unwrap();
}
