//! The secondary tier's record format.
//!
//! ```text
//!   key:value;key:value;key:val
//!   └───┬───┘ └───┬───┘ └──┬──┘
//!    record    record    unterminated tail (dropped)
//! ```
//!
//! - A record is `key` `:` `value` `;`. There is no escaping.
//! - Keys may not contain `:` or `;`. Values may not contain `;`. Values may
//!   contain `:` because decoding splits on the first `:` only.
//! - Decoding skips empty segments silently and reports segments without a
//!   `:`, with an empty key, or without a terminating `;` as malformed. A
//!   write cut short by a crash therefore never surfaces as a truncated value.

use crate::error::{MalformedRecord, StoreError};

/// Separates a key from its value.
pub const KEY_VALUE_SEPARATOR: char = ':';

/// Terminates a record.
pub const RECORD_TERMINATOR: char = ';';

/// Result of decoding a persisted buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Well-formed records in buffer order.
    pub records: Vec<(String, String)>,
    /// Segments that were skipped.
    pub malformed: Vec<MalformedRecord>,
}

/// Renders one record, terminator included.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedRecord`] if the key is empty or either
/// part contains a character the format reserves.
///
/// # Example
///
/// ```
/// use tiercache::store::line_format::encode_record;
///
/// assert_eq!(encode_record("user", "42").unwrap(), "user:42;");
/// assert!(encode_record("a;b", "1").is_err());
/// ```
pub fn encode_record(key: &str, value: &str) -> Result<String, StoreError> {
    if key.is_empty() {
        return Err(StoreError::UnsupportedRecord("empty key".into()));
    }
    if key.contains([KEY_VALUE_SEPARATOR, RECORD_TERMINATOR]) {
        return Err(StoreError::UnsupportedRecord(format!(
            "key {key:?} contains a reserved separator"
        )));
    }
    if value.contains(RECORD_TERMINATOR) {
        return Err(StoreError::UnsupportedRecord(format!(
            "value for key {key:?} contains {RECORD_TERMINATOR:?}"
        )));
    }
    Ok(format!("{key}{KEY_VALUE_SEPARATOR}{value}{RECORD_TERMINATOR}"))
}

/// Splits a persisted buffer into records, skipping malformed segments.
///
/// # Example
///
/// ```
/// use tiercache::store::line_format::decode_records;
///
/// let decoded = decode_records("a:1;garbage;b:2;c:tru");
/// assert_eq!(
///     decoded.records,
///     vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
/// );
/// assert_eq!(decoded.malformed.len(), 2);
/// ```
pub fn decode_records(text: &str) -> Decoded {
    let (terminated, tail) = match text.rfind(RECORD_TERMINATOR) {
        Some(end) => (&text[..end], &text[end + RECORD_TERMINATOR.len_utf8()..]),
        None => ("", text),
    };

    let mut decoded = Decoded::default();
    if !terminated.is_empty() {
        for segment in terminated.split(RECORD_TERMINATOR) {
            match decode_segment(segment) {
                Ok(Some(record)) => decoded.records.push(record),
                Ok(None) => {},
                Err(malformed) => decoded.malformed.push(malformed),
            }
        }
    }
    if !tail.trim().is_empty() {
        decoded
            .malformed
            .push(MalformedRecord::new(tail, "unterminated record"));
    }
    decoded
}

fn decode_segment(segment: &str) -> Result<Option<(String, String)>, MalformedRecord> {
    if segment.is_empty() {
        return Ok(None);
    }
    let (key, value) = segment
        .split_once(KEY_VALUE_SEPARATOR)
        .ok_or_else(|| MalformedRecord::new(segment, "missing ':'"))?;
    if key.is_empty() {
        return Err(MalformedRecord::new(segment, "empty key"));
    }
    Ok(Some((key.to_owned(), value.to_owned())))
}
