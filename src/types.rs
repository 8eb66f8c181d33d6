//! Types for the stock snapshot tracker

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::DATE_FORMAT;

/// Snapshot rows as returned by the upstream API
///
/// A sequence of rows, each an ordered sequence of column values. The rows
/// are stored verbatim and never transformed, so the column layout is
/// whatever the upstream endpoint was asked for.
pub type SnapshotRows = Vec<Vec<serde_json::Value>>;

/// The last accepted snapshot together with its capture timestamp
///
/// Both fields are always written together; a reader never observes a
/// snapshot without the timestamp of the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Accepted `data.values` rows, verbatim
    pub values: SnapshotRows,

    /// Epoch seconds at the moment of acceptance, taken in the reference
    /// timezone
    pub captured_at: i64,
}

impl StoredSnapshot {
    /// Creates a stored snapshot
    pub fn new(values: SnapshotRows, captured_at: i64) -> Self {
        Self {
            values,
            captured_at,
        }
    }

    /// Capture time as a datetime in the given timezone, if representable
    pub fn captured_at_in(&self, tz: Tz) -> Option<DateTime<Tz>> {
        tz.timestamp_opt(self.captured_at, 0).single()
    }

    /// Capture time formatted as `YYYY-MM-DD HH:MM:SS` in the given timezone
    pub fn captured_at_text(&self, tz: Tz) -> Option<String> {
        self.captured_at_in(tz)
            .map(|at| at.format(DATE_FORMAT).to_string())
    }
}

/// Query parameters for one snapshot request
///
/// Derived fresh from the config provider on every run; never persisted.
/// The symbol list is already trimmed of leading/trailing `;` here; values
/// are URL-encoded later, when the request URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    /// Stockdio application key
    pub app_key: String,

    /// Semicolon-separated symbol list, separator-trimmed
    pub symbols: String,

    /// Exchange code; `None` lets the upstream default (USA) apply
    pub stock_exchange: Option<String>,
}

impl RequestParams {
    /// Query pairs in the order they appear in the request URL
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("app-key", self.app_key.as_str()),
            ("symbols", self.symbols.as_str()),
        ];
        if let Some(exchange) = &self.stock_exchange {
            pairs.push(("stockExchange", exchange.as_str()));
        }
        pairs
    }
}
