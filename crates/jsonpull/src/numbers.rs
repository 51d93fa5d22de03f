//! Exact conversions for number lexemes that miss the fast integer path.
//!
//! A lexeme like `1e2` or `120e-1` still denotes an integer; `next_long`
//! accepts it only when the conversion is exact. The conversion works on the
//! decimal text directly (sign, digits, fraction, exponent) with i128
//! arithmetic, so every in-range i64 is representable and every rounding
//! case is rejected rather than approximated.

use alloc::vec::Vec;

/// Parses a JSON number lexeme as an exact `i64`.
///
/// Returns `None` when the lexeme is not a number, denotes a non-integral
/// value, or overflows `i64`.
pub(crate) fn parse_long_exact(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut i = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &bytes[int_start..i];

    let mut frac_digits: &[u8] = b"";
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = &bytes[frac_start..i];
    }

    let mut exponent: i64 = 0;
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        let exp_negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if exp_start == i {
            return None;
        }
        // Clamp: an exponent this large can never produce an i64, and the
        // clamp keeps the later range arithmetic overflow-free.
        for &b in &bytes[exp_start..i] {
            exponent = (exponent * 10 + i64::from(b - b'0')).min(100_000);
        }
        if exp_negative {
            exponent = -exponent;
        }
    }

    if i != bytes.len() || (int_digits.is_empty() && frac_digits.is_empty()) {
        return None;
    }

    // Unscaled digits with the decimal point removed; scale shifts it back.
    let mut scale = exponent - frac_digits.len() as i64;
    let mut digits: Vec<u8> = Vec::with_capacity(int_digits.len() + frac_digits.len());
    digits.extend_from_slice(int_digits);
    digits.extend_from_slice(frac_digits);

    let Some(first_nonzero) = digits.iter().position(|&b| b != b'0') else {
        return Some(0);
    };
    digits.drain(..first_nonzero);

    // A negative scale may only drop trailing zeros, or the value is not
    // integral.
    while scale < 0 {
        if digits.last() == Some(&b'0') {
            digits.pop();
            scale += 1;
        } else {
            return None;
        }
        if digits.is_empty() {
            return Some(0);
        }
    }

    // 19 significant digits can already exceed i64; more always do.
    if digits.len() as i64 + scale > 19 {
        return None;
    }

    let mut value: i128 = 0;
    for &b in &digits {
        value = value * 10 + i128::from(b - b'0');
    }
    for _ in 0..scale {
        value *= 10;
    }
    if negative {
        value = -value;
    }
    i64::try_from(value).ok()
}
