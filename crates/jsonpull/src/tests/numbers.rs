//! Number recognition and classification.
//!
//! A literal recognized as a 64-bit integer is canonicalized by
//! `next_string`, while a general number returns its raw lexeme — which
//! makes the internal classification observable without any test hooks.

use alloc::string::{String, ToString};

use crate::{ByteSource, JsonReader, ReaderOptions};

fn reader_for_value(literal: &str) -> JsonReader {
    let mut json = String::from("[");
    json.push_str(literal);
    json.push(']');
    let mut reader = JsonReader::of(&json);
    reader.begin_array().unwrap();
    reader
}

#[test]
fn zero_is_a_long_but_negative_zero_is_not() {
    assert_eq!(reader_for_value("0").next_long().unwrap(), 0);
    // "-0" keeps its lexeme, so it was classified as a general number.
    assert_eq!(reader_for_value("-0").next_string().unwrap(), "-0");
    assert_eq!(reader_for_value("0").next_string().unwrap(), "0");
}

#[test]
fn long_boundaries() {
    assert_eq!(
        reader_for_value("9223372036854775807").next_long().unwrap(),
        i64::MAX
    );
    assert_eq!(
        reader_for_value("-9223372036854775808").next_long().unwrap(),
        i64::MIN
    );
    // One past the boundary falls back to the general number path and keeps
    // its lexeme.
    assert_eq!(
        reader_for_value("9223372036854775808").next_string().unwrap(),
        "9223372036854775808"
    );
    let err = reader_for_value("9223372036854775808").next_long().unwrap_err();
    assert!(err.is_data(), "{err}");
}

#[test]
fn leading_zero_rejects_the_number_path() {
    // Could be octal; strict mode rejects it outright.
    let err = reader_for_value("01").next_long().unwrap_err();
    assert!(err.is_syntax(), "{err}");

    let mut json = JsonReader::with_options(
        ByteSource::of("[01]"),
        ReaderOptions {
            lenient: true,
            ..ReaderOptions::default()
        },
    );
    json.begin_array().unwrap();
    assert_eq!(json.next_string().unwrap(), "01");
}

#[test]
fn decimal_and_exponent_forms_are_numbers() {
    assert_eq!(reader_for_value("1e2").next_string().unwrap(), "1e2");
    assert_eq!(reader_for_value("1.5").next_string().unwrap(), "1.5");
    assert_eq!(reader_for_value("1E+2").next_string().unwrap(), "1E+2");
    assert_eq!(reader_for_value("1e2").next_double().unwrap(), 100.0);
    assert_eq!(reader_for_value("1.5").next_double().unwrap(), 1.5);
    assert_eq!(reader_for_value("-3.25e2").next_double().unwrap(), -325.0);
}

#[test]
fn incomplete_numbers_are_rejected() {
    for literal in ["1.", ".5", "1e", "1e+", "-", "+1"] {
        let err = reader_for_value(literal).next_double().unwrap_err();
        assert!(err.is_syntax(), "{literal}: {err}");
    }
}

#[test]
fn next_long_converts_exact_decimals() {
    assert_eq!(reader_for_value("1e2").next_long().unwrap(), 100);
    assert_eq!(reader_for_value("25.0").next_long().unwrap(), 25);
    assert_eq!(reader_for_value("120e-1").next_long().unwrap(), 12);
    let err = reader_for_value("1.5").next_long().unwrap_err();
    assert_eq!(err.to_string(), "Expected a long but was 1.5 at path $[0]");
}

#[test]
fn quoted_numbers_parse() {
    assert_eq!(reader_for_value("\"123\"").next_long().unwrap(), 123);
    assert_eq!(reader_for_value("\"1e2\"").next_long().unwrap(), 100);
    assert_eq!(reader_for_value("\"-7\"").next_int().unwrap(), -7);
    assert_eq!(reader_for_value("\"2.5\"").next_double().unwrap(), 2.5);
    let err = reader_for_value("\"pear\"").next_long().unwrap_err();
    assert!(err.is_data(), "{err}");
}

#[test]
fn next_int_requires_the_int_range() {
    assert_eq!(reader_for_value("2147483647").next_int().unwrap(), i32::MAX);
    assert_eq!(reader_for_value("-2147483648").next_int().unwrap(), i32::MIN);
    let err = reader_for_value("2147483648").next_int().unwrap_err();
    assert!(err.is_data(), "{err}");
    assert_eq!(reader_for_value("25.0").next_int().unwrap(), 25);
    let err = reader_for_value("25.5").next_int().unwrap_err();
    assert!(err.is_data(), "{err}");
}

#[test]
fn non_finite_doubles_require_lenient() {
    for literal in ["NaN", "Infinity", "-Infinity"] {
        let mut json = String::from("[");
        json.push_str(literal);
        json.push(']');

        let mut strict = JsonReader::of(&json);
        strict.begin_array().unwrap();
        assert!(strict.next_double().is_err(), "{literal}");

        let mut reader = JsonReader::with_options(
            ByteSource::of(&json),
            ReaderOptions {
                lenient: true,
                ..ReaderOptions::default()
            },
        );
        reader.begin_array().unwrap();
        let value = reader.next_double().unwrap();
        assert!(!value.is_finite(), "{literal} -> {value}");
        reader.end_array().unwrap();
    }
}

#[test]
fn longs_lose_no_precision_as_strings() {
    // next_string canonicalizes recognized longs.
    assert_eq!(
        reader_for_value("9007199254740993").next_string().unwrap(),
        "9007199254740993"
    );
    assert_eq!(reader_for_value("42").next_double().unwrap(), 42.0);
}
