//! HTTP fetcher for the snapshot endpoint

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::{
    constants::{REQUEST_TIMEOUT_SECS, SOURCE_URL, USER_AGENT},
    error::RefreshError,
    types::RequestParams,
};

/// Fetches one raw snapshot body from upstream
///
/// Implementations report only transport-level failures; any HTTP response,
/// whatever its status code, yields the raw body. Acceptance is decided by
/// the envelope alone (see [`crate::validator`]).
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Issues the request and returns the raw response body
    async fn fetch(&self, params: &RequestParams) -> Result<String, RefreshError>;
}

/// reqwest-backed fetcher with a fixed 10-second timeout
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher against the production endpoint
    pub fn new() -> Result<Self, RefreshError> {
        Self::with_base_url(SOURCE_URL)
    }

    /// Creates a fetcher against a custom endpoint (tests, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, RefreshError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RefreshError::transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Builds the request URL by appending encoded query pairs
    fn build_url(&self, params: &RequestParams) -> String {
        let query = params
            .query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.base_url, query)
    }
}

#[async_trait]
impl SnapshotFetcher for HttpFetcher {
    async fn fetch(&self, params: &RequestParams) -> Result<String, RefreshError> {
        let url = self.build_url(params);
        tracing::debug!(url = %url, "fetching stock snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RefreshError::transport(e.to_string()))?;

        // Non-2xx bodies are passed through on purpose: the application
        // envelope, not the HTTP layer, decides acceptance.
        response
            .text()
            .await
            .map_err(|e| RefreshError::transport(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(symbols: &str, exchange: Option<&str>) -> RequestParams {
        RequestParams {
            app_key: "test-key".to_string(),
            symbols: symbols.to_string(),
            stock_exchange: exchange.map(str::to_string),
        }
    }

    #[test]
    fn url_encodes_symbol_separators() {
        let fetcher = HttpFetcher::with_base_url("https://example.test/snapshot").unwrap();
        let url = fetcher.build_url(&params("AAPL;MSFT", None));
        assert_eq!(
            url,
            "https://example.test/snapshot?app-key=test-key&symbols=AAPL%3BMSFT"
        );
    }

    #[test]
    fn url_includes_exchange_only_when_present() {
        let fetcher = HttpFetcher::with_base_url("https://example.test/snapshot").unwrap();

        let url = fetcher.build_url(&params("BMW", Some("XETRA")));
        assert!(url.ends_with("&stockExchange=XETRA"));

        let url = fetcher.build_url(&params("BMW", None));
        assert!(!url.contains("stockExchange"));
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/snapshot"))
            .and(query_param("app-key", "test-key"))
            .and(query_param("symbols", "AAPL;MSFT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":{"code":0}}"#))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_base_url(format!("{}/snapshot", server.uri())).unwrap();
        let body = fetcher.fetch(&params("AAPL;MSFT", None)).await.unwrap();
        assert_eq!(body, r#"{"status":{"code":0}}"#);
    }

    #[tokio::test]
    async fn returns_body_even_on_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_base_url(format!("{}/snapshot", server.uri())).unwrap();
        let body = fetcher.fetch(&params("AAPL", None)).await.unwrap();
        assert_eq!(body, "upstream exploded");
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        // Nothing listens on port 1
        let fetcher = HttpFetcher::with_base_url("http://127.0.0.1:1/snapshot").unwrap();
        let err = fetcher.fetch(&params("AAPL", None)).await.unwrap_err();
        assert!(matches!(err, RefreshError::Transport(_)));
    }
}
