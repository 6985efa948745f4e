//! JSON-lines encoding of records.
//!
//! A snapshot holds one JSON object per line. Lines are parsed
//! independently, so a reader never needs more than one record in memory.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Parses one snapshot line into a record.
///
/// # Errors
///
/// Returns [`CodecError::InvalidJson`] for malformed JSON and
/// [`CodecError::NotADocument`] when the line holds something other than an
/// object.
pub fn from_json_line(line: &str) -> CodecResult<Value> {
    let value: Value =
        serde_json::from_str(line.trim()).map_err(|e| CodecError::invalid_json(e.to_string()))?;
    match value {
        Value::Map(_) => Ok(value),
        other => Err(CodecError::NotADocument { found: other.kind() }),
    }
}

/// Serializes a value to compact single-line JSON, keys in stored order.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] for non-finite floats, which JSON
/// cannot represent.
pub fn to_json_line(value: &Value) -> CodecResult<String> {
    check_finite(value)?;
    serde_json::to_string(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Serializes a value to indented JSON for display.
///
/// # Errors
///
/// Same as [`to_json_line`].
pub fn to_json_pretty(value: &Value) -> CodecResult<String> {
    check_finite(value)?;
    serde_json::to_string_pretty(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

// serde_json writes NaN and infinities as `null`, which would silently
// change the record.
fn check_finite(value: &Value) -> CodecResult<()> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(CodecError::encoding_failed(format!(
            "{f:?} cannot be represented in JSON"
        ))),
        Value::Array(items) => items.iter().try_for_each(check_finite),
        Value::Map(entries) => entries.iter().try_for_each(|(_, v)| check_finite(v)),
        _ => Ok(()),
    }
}
