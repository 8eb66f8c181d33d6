//! Constants for the stock snapshot tracker
//!
//! All fixed settings for the snapshot refresh cycle are centralized here.
//! Credentials and the symbol list come from the injected [`ConfigProvider`]
//! instead; nothing in this module is secret.
//!
//! [`ConfigProvider`]: crate::config::ConfigProvider

use chrono_tz::Tz;

/// Stockdio GetStocksSnapshot endpoint
pub const SOURCE_URL: &str =
    "https://api.stockdio.com/data/financial/prices/v1/GetStocksSnapshot";

/// HTTP request timeout when fetching a snapshot (in seconds)
///
/// Periodically, the API is slow to respond.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Delay before the one-shot retry after a transport failure (in seconds)
pub const RETRY_DELAY_SECS: u64 = 15 * 60;

/// Wall-clock hour (0-23) of the daily refresh anchor in the reference timezone
pub const DAILY_ANCHOR_HOUR: u32 = 3;

/// Reference timezone for all "current time" computations
///
/// Both the scheduling anchor and the stored capture timestamp are taken
/// with this timezone passed explicitly, never machine-local time.
pub const REFERENCE_TZ: Tz = chrono_tz::Europe::Malta;

/// Timestamp format used in diagnostics and the log sink
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Job name half of the scheduler identity
pub const JOB_HOOK: &str = "stock_snapshot_refresh_hook";

/// Job argument half of the scheduler identity
pub const JOB_ARG: &str = "stock_snapshot_refresh_id";

/// Separator line written before each diagnostic log entry
pub const LOG_SEPARATOR: &str = "===========================================";

/// Upper bound on how long the driver task sleeps between registry polls
/// (in seconds), so a retry registered mid-sleep is picked up promptly
pub const DRIVER_POLL_SECS: u64 = 60;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "stock-snapshot-sdk/0.1.0";
