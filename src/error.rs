//! Error types for the stock snapshot tracker

use thiserror::Error;

/// Failure modes of a single refresh run
///
/// Every variant leaves the previously stored snapshot untouched; no failure
/// is fatal to the hosting process.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Network, DNS, or timeout failure before any body was received
    ///
    /// The only variant that triggers the one-shot retry.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response envelope carried a missing or non-zero `status.code`
    ///
    /// Missing and non-zero codes are deliberately merged; the upstream API
    /// does not distinguish them either.
    #[error("unexpected status code: {}", code_label(*code))]
    Protocol { code: Option<i64> },

    /// Well-formed envelope with no usable data in the first cell
    #[error("required data is empty in response")]
    EmptyResult { envelope: String },

    /// API key or symbol list is not configured; the run was skipped
    #[error("configuration incomplete")]
    ConfigIncomplete,
}

impl RefreshError {
    /// Creates a Transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a Protocol error
    pub fn protocol(code: Option<i64>) -> Self {
        Self::Protocol { code }
    }

    /// Creates an EmptyResult error carrying the serialized envelope
    pub fn empty_result(envelope: impl Into<String>) -> Self {
        Self::EmptyResult {
            envelope: envelope.into(),
        }
    }
}

/// Renders a status code for display, "absent" when the field was missing
pub fn code_label(code: Option<i64>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "absent".to_string(),
    }
}
