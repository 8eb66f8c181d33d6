//! Response envelope validation
//!
//! Decides whether a raw upstream body may overwrite the stored snapshot.
//! Acceptance requires `status.code == 0` and a non-empty first cell in
//! `data.values`; everything else is rejected without touching storage.

use serde_json::Value;

use crate::{error::RefreshError, types::SnapshotRows};

/// Parses and validates a raw response body
///
/// Returns the verbatim `data.values` rows on acceptance.
///
/// # Errors
/// * [`RefreshError::Protocol`] when the body is not JSON, `status.code` is
///   missing, or the code is non-zero. An unparseable body has no status
///   field at all, so it is reported with an absent code.
/// * [`RefreshError::EmptyResult`] when the status is fine but
///   `data.values[0][0]` is absent or blank after trimming; the error
///   carries the pretty-printed envelope for the diagnostic log.
pub fn validate(raw: &str) -> Result<SnapshotRows, RefreshError> {
    let envelope: Value = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(_) => return Err(RefreshError::protocol(None)),
    };

    let code = envelope.pointer("/status/code").and_then(Value::as_i64);
    if code != Some(0) {
        return Err(RefreshError::protocol(code));
    }

    if !first_cell_usable(&envelope) {
        let pretty = serde_json::to_string_pretty(&envelope)
            .unwrap_or_else(|_| envelope.to_string());
        return Err(RefreshError::empty_result(pretty));
    }

    let values = envelope
        .pointer("/data/values")
        .cloned()
        .unwrap_or(Value::Null);

    // Row 0 is known to be an array at this point; a malformed later row
    // still counts as unusable data rather than an accepted snapshot.
    match serde_json::from_value::<SnapshotRows>(values) {
        Ok(rows) => Ok(rows),
        Err(_) => {
            let pretty = serde_json::to_string_pretty(&envelope)
                .unwrap_or_else(|_| envelope.to_string());
            Err(RefreshError::empty_result(pretty))
        }
    }
}

/// True when `data.values[0][0]` exists and is non-blank
fn first_cell_usable(envelope: &Value) -> bool {
    match envelope.pointer("/data/values/0/0") {
        Some(Value::String(cell)) => !cell.trim().is_empty(),
        Some(Value::Null) | None => false,
        // Numbers, booleans, and nested values stringify to something
        Some(_) => true,
    }
}
