//! Fixed-width line decoding
//!
//! Widths count characters, not bytes. A line shorter than the schema is
//! treated as if padded with spaces; characters past the last field are
//! ignored. Numeric fields are strict: a value that does not parse fails the
//! whole line.

use crate::error::RowError;
use crate::schema::{FieldSpec, FieldType, Schema};

/// Decode one line into one CSV cell per field
///
/// Stops at the first field that fails to convert.
pub fn decode_line(line: &str, schema: &Schema) -> Result<Vec<String>, RowError> {
    let mut chars = line.chars();
    let mut row = Vec::with_capacity(schema.fields().len());
    let mut segment = String::new();

    for field in schema.fields() {
        segment.clear();
        segment.extend(chars.by_ref().take(field.length));
        let taken = segment.chars().count();
        segment.extend(std::iter::repeat(' ').take(field.length - taken));

        row.push(convert(&segment, field)?);
    }

    Ok(row)
}

fn convert(segment: &str, field: &FieldSpec) -> Result<String, RowError> {
    let value = segment.trim_end_matches('\n').trim_end_matches('\r');

    match field.field_type {
        FieldType::Text => Ok(value.to_string()),
        FieldType::Integer => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(RowError::EmptyInteger { field: field.label() });
            }
            canonical_integer(trimmed).ok_or_else(|| RowError::InvalidInt {
                field: field.label(),
                value: value.to_string(),
            })
        },
        FieldType::Decimal => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(RowError::EmptyFloat { field: field.label() });
            }
            canonical_decimal(trimmed).ok_or_else(|| RowError::InvalidFloat {
                field: field.label(),
                value: value.to_string(),
            })
        },
    }
}

/// Base-10 integer of any magnitude, rewritten without `+` or leading zeros
fn canonical_integer(raw: &str) -> Option<String> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let significant = digits.trim_start_matches('0');
    Some(match (significant.is_empty(), negative) {
        (true, _) => "0".to_string(),
        (false, true) => format!("-{}", significant),
        (false, false) => significant.to_string(),
    })
}

/// Finite decimal with `,` accepted as the decimal separator
///
/// Output is the shortest round-trip form, always with a fractional part or
/// exponent. Magnitudes below `1e-4` or from `1e16` up use a signed exponent
/// of at least two digits (`42.0`, `3.14`, `1e+16`, `1.5e-05`).
fn canonical_decimal(raw: &str) -> Option<String> {
    let normalized = raw.replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let shortest = format!("{:?}", value);
    Some(match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        },
        None => shortest,
    })
}
