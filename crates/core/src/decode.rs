//! HTML character entity decoding for provider text.
//!
//! The provider ships question and answer text entity-encoded
//! (`Don&#039;t`, `A &amp; B`). Decoding must round-trip named and numeric
//! entities to their literal characters; entities that are merely unknown
//! pass through unchanged, while numeric references that cannot map to a
//! Unicode scalar are an error the caller is expected to recover from.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("numeric character reference does not map to a character: &#{raw}")]
    InvalidCharacterReference { raw: String },
}

/// Decode HTML character entities in `input`.
///
/// Named entities (`&amp;`, `&quot;`, ...) and numeric references
/// (`&#233;`, `&#x2603;`) become their literal characters. Unrecognized
/// named entities are left as-is.
///
/// # Errors
///
/// Returns `DecodeError::InvalidCharacterReference` when a numeric
/// reference names a surrogate or a value beyond U+10FFFF.
pub fn decode_text(input: &str) -> Result<String, DecodeError> {
    check_numeric_references(input)?;
    Ok(html_escape::decode_html_entities(input).into_owned())
}

// Scalar values a numeric reference may not produce.
const SURROGATE_RANGE: std::ops::RangeInclusive<u32> = 0xD800..=0xDFFF;
const MAX_SCALAR: u32 = 0x0010_FFFF;

/// Reject numeric references whose value is not a Unicode scalar.
///
/// Only runs of `&#` followed by at least one digit count as references;
/// anything else (including a bare `&#`) is ordinary text.
fn check_numeric_references(input: &str) -> Result<(), DecodeError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while let Some(offset) = input[i..].find("&#") {
        let run_start = i + offset + 2;
        let (base, digits_start) = match bytes.get(run_start) {
            Some(b'x' | b'X') => (16, run_start + 1),
            _ => (10, run_start),
        };

        let mut pos = digits_start;
        let mut value: u32 = 0;
        let mut overflowed = false;
        while let Some(digit) = bytes.get(pos).and_then(|b| (*b as char).to_digit(base)) {
            value = match value.checked_mul(base).and_then(|v| v.checked_add(digit)) {
                Some(v) => v,
                None => {
                    overflowed = true;
                    u32::MAX
                }
            };
            pos += 1;
        }

        if pos > digits_start && (overflowed || value > MAX_SCALAR || SURROGATE_RANGE.contains(&value))
        {
            return Err(DecodeError::InvalidCharacterReference {
                raw: input[run_start..pos].to_string(),
            });
        }

        i = pos.max(run_start);
    }
    Ok(())
}
