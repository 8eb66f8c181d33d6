//! # Stock Snapshot SDK
//!
//! Periodically fetches a stock-price snapshot from the Stockdio
//! `GetStocksSnapshot` endpoint and caches the latest accepted result, so
//! downstream consumers always see the last good value even while upstream
//! is failing.
//!
//! The refresh cycle runs once a day at a fixed wall-clock instant in the
//! reference timezone (03:00 Europe/Malta), with a single 15-minute retry
//! after transport failures. A response only replaces the cached snapshot
//! after its envelope validates: `status.code == 0` and a non-empty first
//! data cell. Every failure leaves the previous snapshot untouched and is
//! appended to a diagnostic log.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use stock_snapshot_sdk::{
//!     FileLogger, HttpFetcher, MemoryScheduleRegistry, MemorySnapshotStore,
//!     RefreshScheduler, SnapshotConfig, SnapshotTracker, StaticConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SnapshotConfig {
//!     api_key: "your-app-key".to_string(),
//!     symbols: "AAPL;MSFT".to_string(),
//!     stock_exchange: String::new(),
//! };
//!
//! let registry = Arc::new(MemoryScheduleRegistry::new());
//! let tracker = Arc::new(SnapshotTracker::new(
//!     Arc::new(StaticConfig::new(config)),
//!     Arc::new(HttpFetcher::new()?),
//!     Arc::new(MemorySnapshotStore::new()),
//!     Arc::new(FileLogger::new("stockdio-refresh-log.txt")),
//!     registry.clone(),
//! ));
//!
//! let scheduler = Arc::new(RefreshScheduler::new(registry, tracker.clone()));
//! scheduler.ensure_scheduled().await;
//! scheduler.clone().spawn_driver();
//!
//! // Consumers read the cached value at any time
//! if let Some(snapshot) = tracker.snapshot().await {
//!     println!("rows: {}", snapshot.values.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod logger;
pub mod scheduler;
pub mod store;
pub mod tracker;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use config::{ConfigProvider, SnapshotConfig, StaticConfig};
pub use error::RefreshError;
pub use fetcher::{HttpFetcher, SnapshotFetcher};
pub use logger::{DiagnosticLogger, FileLogger, LogEntry, LogValue, MemoryLogger, NullLogger};
pub use scheduler::{
    JobIdentity, MemoryScheduleRegistry, Recurrence, RefreshScheduler, ScheduleRegistry,
    ScheduledFire,
};
pub use store::{MemorySnapshotStore, SnapshotStore};
pub use tracker::SnapshotTracker;
pub use types::{RequestParams, SnapshotRows, StoredSnapshot};
