//! Snapshot tracker service
//!
//! Owns one refresh run end to end: read configuration, fetch, validate,
//! and either accept the snapshot into the store or log the failure and
//! leave the previous value untouched.

use std::sync::Arc;

use crate::{
    config::ConfigProvider,
    constants::{REFERENCE_TZ, RETRY_DELAY_SECS},
    error::{code_label, RefreshError},
    fetcher::SnapshotFetcher,
    logger::{DiagnosticLogger, LogValue},
    scheduler::{now_secs, JobIdentity, ScheduleRegistry},
    store::SnapshotStore,
    types::StoredSnapshot,
    validator,
};

/// Scheduled fetcher of the latest stock snapshot
///
/// All collaborators are injected; the tracker itself is state-free between
/// runs. The store keeps the last accepted snapshot, so consumers read
/// through [`Self::snapshot`] at any time regardless of upstream health.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use stock_snapshot_sdk::{
///     HttpFetcher, MemoryScheduleRegistry, MemorySnapshotStore, NullLogger,
///     SnapshotConfig, SnapshotTracker, StaticConfig,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SnapshotConfig {
///     api_key: "app-key".to_string(),
///     symbols: "AAPL;MSFT".to_string(),
///     stock_exchange: String::new(),
/// };
/// let tracker = SnapshotTracker::new(
///     Arc::new(StaticConfig::new(config)),
///     Arc::new(HttpFetcher::new()?),
///     Arc::new(MemorySnapshotStore::new()),
///     Arc::new(NullLogger),
///     Arc::new(MemoryScheduleRegistry::new()),
/// );
/// tracker.run().await?;
/// if let Some(snapshot) = tracker.snapshot().await {
///     println!("captured at {}", snapshot.captured_at);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SnapshotTracker {
    config: Arc<dyn ConfigProvider>,
    fetcher: Arc<dyn SnapshotFetcher>,
    store: Arc<dyn SnapshotStore>,
    logger: Arc<dyn DiagnosticLogger>,
    registry: Arc<dyn ScheduleRegistry>,
    identity: JobIdentity,
    tz: chrono_tz::Tz,
}

impl SnapshotTracker {
    /// Creates a tracker with the default job identity and reference
    /// timezone
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        fetcher: Arc<dyn SnapshotFetcher>,
        store: Arc<dyn SnapshotStore>,
        logger: Arc<dyn DiagnosticLogger>,
        registry: Arc<dyn ScheduleRegistry>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
            logger,
            registry,
            identity: JobIdentity::default(),
            tz: REFERENCE_TZ,
        }
    }

    /// Performs one refresh run
    ///
    /// Configuration is re-read on every call. An incomplete configuration
    /// skips the run silently; a transport failure is logged and a one-shot
    /// retry is registered 15 minutes out; a rejected envelope is logged and
    /// waits for the next daily run. Every failure path leaves the stored
    /// snapshot exactly as it was.
    pub async fn run(&self) -> Result<(), RefreshError> {
        let config = self.config.load().await;
        let Some(params) = config.request_params() else {
            return Err(RefreshError::ConfigIncomplete);
        };

        let raw = match self.fetcher.fetch(&params).await {
            Ok(raw) => raw,
            Err(err) => {
                self.logger
                    .log(&format!("API request failed: {err}"), &[]);
                // Upstream timeouts have no known duration; try once more
                // after a fixed delay instead of hammering the endpoint.
                self.registry
                    .register_once(&self.identity, now_secs(self.tz) + RETRY_DELAY_SECS as i64)
                    .await;
                return Err(err);
            }
        };

        match validator::validate(&raw) {
            Ok(values) => {
                let captured_at = now_secs(self.tz);
                let rows = values.len();
                self.store.write(values, captured_at).await;
                tracing::info!(rows, captured_at, "accepted stock snapshot");
                Ok(())
            }
            Err(err @ RefreshError::Protocol { code }) => {
                let detail = match code {
                    Some(code) => LogValue::Int(code),
                    None => LogValue::Str(code_label(None)),
                };
                self.logger.log(
                    "Status code of API response is not set or not equal 0.",
                    &[detail],
                );
                Err(err)
            }
            Err(err) => {
                if let RefreshError::EmptyResult { envelope } = &err {
                    self.logger.log(
                        "Required data is empty in response.",
                        &[LogValue::Str(envelope.clone())],
                    );
                }
                Err(err)
            }
        }
    }

    /// Last accepted snapshot with its capture timestamp, if any
    pub async fn snapshot(&self) -> Option<StoredSnapshot> {
        self.store.read().await
    }

    /// True when a snapshot has ever been accepted
    pub async fn has_snapshot(&self) -> bool {
        self.store.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{SnapshotConfig, StaticConfig},
        fetcher::mock::MockFetcher,
        logger::MemoryLogger,
        scheduler::{MemoryScheduleRegistry, Recurrence},
        store::{MemorySnapshotStore, SnapshotStore},
    };
    use serde_json::json;

    const GOOD_BODY: &str = r#"{"status":{"code":0},"data":{"values":[["123.45","AAPL"]]}}"#;

    struct Harness {
        fetcher: Arc<MockFetcher>,
        store: Arc<MemorySnapshotStore>,
        logger: Arc<MemoryLogger>,
        registry: Arc<MemoryScheduleRegistry>,
        tracker: SnapshotTracker,
    }

    fn harness(config: SnapshotConfig) -> Harness {
        let fetcher = Arc::new(MockFetcher::new());
        let store = Arc::new(MemorySnapshotStore::new());
        let logger = Arc::new(MemoryLogger::new());
        let registry = Arc::new(MemoryScheduleRegistry::new());
        let tracker = SnapshotTracker::new(
            Arc::new(StaticConfig::new(config)),
            fetcher.clone(),
            store.clone(),
            logger.clone(),
            registry.clone(),
        );
        Harness {
            fetcher,
            store,
            logger,
            registry,
            tracker,
        }
    }

    fn complete_config() -> SnapshotConfig {
        SnapshotConfig {
            api_key: "key".to_string(),
            symbols: ";AAPL;MSFT;".to_string(),
            stock_exchange: String::new(),
        }
    }

    async fn preseed(store: &MemorySnapshotStore) -> StoredSnapshot {
        store.write(vec![vec![json!("99.99")]], 1_000).await;
        store.read().await.unwrap()
    }

    #[tokio::test]
    async fn success_writes_snapshot_and_fresh_timestamp() {
        let h = harness(complete_config());
        h.fetcher.push_body(GOOD_BODY);

        h.tracker.run().await.unwrap();

        let stored = h.store.read().await.unwrap();
        assert_eq!(stored.values, vec![vec![json!("123.45"), json!("AAPL")]]);
        assert!((stored.captured_at - now_secs(REFERENCE_TZ)).abs() <= 1);
        assert!(h.logger.entries().is_empty());
    }

    #[tokio::test]
    async fn symbols_are_trimmed_before_the_request() {
        let h = harness(complete_config());
        h.fetcher.push_body(GOOD_BODY);

        h.tracker.run().await.unwrap();

        assert_eq!(h.fetcher.requests()[0].symbols, "AAPL;MSFT");
    }

    #[tokio::test]
    async fn incomplete_config_skips_silently() {
        let h = harness(SnapshotConfig {
            api_key: String::new(),
            symbols: "AAPL".to_string(),
            stock_exchange: String::new(),
        });

        let err = h.tracker.run().await.unwrap_err();
        assert!(matches!(err, RefreshError::ConfigIncomplete));
        assert_eq!(h.fetcher.call_count(), 0);
        assert!(h.logger.entries().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_schedules_retry_and_keeps_snapshot() {
        let h = harness(complete_config());
        let previous = preseed(&h.store).await;
        h.registry
            .register_recurring(&JobIdentity::default(), now_secs(REFERENCE_TZ) + 3_600)
            .await;
        h.fetcher.push_transport_error("connect timeout");

        let before = now_secs(REFERENCE_TZ);
        let err = h.tracker.run().await.unwrap_err();
        assert!(matches!(err, RefreshError::Transport(_)));

        assert_eq!(h.store.read().await.unwrap(), previous);

        let entries = h.logger.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains("connect timeout"));

        let fires = h.registry.scheduled(&JobIdentity::default()).await;
        let retry = fires
            .iter()
            .find(|f| f.recurrence == Recurrence::Once)
            .expect("retry registered");
        assert!((retry.fire_at - (before + 900)).abs() <= 1);
        assert!(fires.iter().any(|f| f.recurrence == Recurrence::Daily));
    }

    #[tokio::test]
    async fn nonzero_status_code_logs_once_and_keeps_snapshot() {
        let h = harness(complete_config());
        let previous = preseed(&h.store).await;
        h.fetcher
            .push_body(r#"{"status":{"code":1},"data":{"values":[["123.45"]]}}"#);

        let err = h.tracker.run().await.unwrap_err();
        assert!(matches!(err, RefreshError::Protocol { code: Some(1) }));

        assert_eq!(h.store.read().await.unwrap(), previous);

        let entries = h.logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].values, vec![LogValue::Int(1)]);

        // Application-level failures never schedule a retry
        assert!(h
            .registry
            .scheduled(&JobIdentity::default())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn missing_status_code_logs_absent() {
        let h = harness(complete_config());
        h.fetcher.push_body(r#"{"data":{"values":[["123.45"]]}}"#);

        h.tracker.run().await.unwrap_err();

        let entries = h.logger.entries();
        assert_eq!(entries[0].values, vec![LogValue::Str("absent".to_string())]);
    }

    #[tokio::test]
    async fn empty_result_logs_envelope_and_keeps_snapshot() {
        let h = harness(complete_config());
        let previous = preseed(&h.store).await;
        h.fetcher
            .push_body(r#"{"status":{"code":0},"data":{"values":[[""]]}}"#);

        let err = h.tracker.run().await.unwrap_err();
        assert!(matches!(err, RefreshError::EmptyResult { .. }));

        assert_eq!(h.store.read().await.unwrap(), previous);

        let entries = h.logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Required data is empty in response.");
        match &entries[0].values[0] {
            LogValue::Str(envelope) => assert!(envelope.contains("\"code\": 0")),
            other => panic!("expected envelope string, got {other:?}"),
        }
        assert!(h
            .registry
            .scheduled(&JobIdentity::default())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn failure_after_success_preserves_the_good_snapshot() {
        let h = harness(complete_config());
        h.fetcher.push_body(GOOD_BODY);
        h.fetcher.push_transport_error("dns failure");
        h.fetcher.push_body(r#"{"status":{"code":2}}"#);

        h.tracker.run().await.unwrap();
        let good = h.store.read().await.unwrap();

        h.tracker.run().await.unwrap_err();
        h.tracker.run().await.unwrap_err();

        assert_eq!(h.store.read().await.unwrap(), good);
        assert!(h.tracker.has_snapshot().await);
    }

    #[tokio::test]
    async fn exchange_is_forwarded_when_configured() {
        let mut config = complete_config();
        config.stock_exchange = "LSE".to_string();
        let h = harness(config);
        h.fetcher.push_body(GOOD_BODY);

        h.tracker.run().await.unwrap();

        assert_eq!(
            h.fetcher.requests()[0].stock_exchange.as_deref(),
            Some("LSE")
        );
    }
}
