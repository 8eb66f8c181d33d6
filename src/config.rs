//! Configuration provider abstraction
//!
//! The hosting application owns where settings live (database, env, file);
//! the tracker only sees this trait and re-reads it on every run, so setting
//! changes take effect without a restart.

use async_trait::async_trait;

use crate::types::RequestParams;

/// Settings for the snapshot refresh, as plain opaque strings
///
/// Empty API key or symbol list means "not yet enabled": the run is skipped
/// silently rather than treated as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Stockdio application key
    pub api_key: String,

    /// Semicolon-separated symbol list, possibly with stray separators
    pub symbols: String,

    /// Exchange code; empty means upstream default (USA)
    pub stock_exchange: String,
}

impl SnapshotConfig {
    /// True when both the API key and the symbol list are present
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.symbols.is_empty()
    }

    /// Derives request parameters, or `None` while configuration is incomplete
    ///
    /// Leading and trailing `;` are trimmed from the symbol list; the
    /// exchange is included only when non-empty.
    pub fn request_params(&self) -> Option<RequestParams> {
        if !self.is_complete() {
            return None;
        }

        let stock_exchange = if self.stock_exchange.is_empty() {
            None
        } else {
            Some(self.stock_exchange.clone())
        };

        Some(RequestParams {
            app_key: self.api_key.clone(),
            symbols: self.symbols.trim_matches(';').to_string(),
            stock_exchange,
        })
    }
}

/// Source of the current snapshot configuration
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Returns the configuration as of now
    async fn load(&self) -> SnapshotConfig;
}

/// Config provider backed by a fixed value
///
/// Suits hosts whose settings cannot change at runtime, and tests.
pub struct StaticConfig {
    config: SnapshotConfig,
}

impl StaticConfig {
    /// Wraps a fixed configuration
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConfigProvider for StaticConfig {
    async fn load(&self) -> SnapshotConfig {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str, symbols: &str, exchange: &str) -> SnapshotConfig {
        SnapshotConfig {
            api_key: api_key.to_string(),
            symbols: symbols.to_string(),
            stock_exchange: exchange.to_string(),
        }
    }

    #[test]
    fn symbols_are_separator_trimmed() {
        let params = config("key", ";AAPL;MSFT;", "").request_params().unwrap();
        assert_eq!(params.symbols, "AAPL;MSFT");
    }

    #[test]
    fn inner_separators_are_kept() {
        let params = config("key", "AAPL;;MSFT", "").request_params().unwrap();
        assert_eq!(params.symbols, "AAPL;;MSFT");
    }

    #[test]
    fn missing_api_key_or_symbols_yields_no_params() {
        assert!(config("", "AAPL", "").request_params().is_none());
        assert!(config("key", "", "").request_params().is_none());
    }

    #[test]
    fn empty_exchange_is_omitted() {
        let params = config("key", "AAPL", "").request_params().unwrap();
        assert_eq!(params.stock_exchange, None);

        let params = config("key", "AAPL", "LSE").request_params().unwrap();
        assert_eq!(params.stock_exchange.as_deref(), Some("LSE"));
    }
}
