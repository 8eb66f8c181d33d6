//! Refresh scheduling
//!
//! Two layers live here. [`ScheduleRegistry`] models the external timer
//! facility: recurring and one-shot registrations keyed by a (job-name,
//! argument) identity, with query and unregister operations.
//! [`RefreshScheduler`] owns the policy on top of it: a daily run anchored
//! at a fixed wall-clock instant in the reference timezone, plus a one-shot
//! retry after transport failures, both under the same job identity.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::{
    constants::{DAILY_ANCHOR_HOUR, DATE_FORMAT, DRIVER_POLL_SECS, JOB_ARG, JOB_HOOK, REFERENCE_TZ},
    error::RefreshError,
    tracker::SnapshotTracker,
};

const DAY_SECS: i64 = 24 * 60 * 60;

/// The (job-name, argument) pair a registration is keyed by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobIdentity {
    pub hook: String,
    pub arg: String,
}

impl JobIdentity {
    pub fn new(hook: impl Into<String>, arg: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            arg: arg.into(),
        }
    }
}

impl Default for JobIdentity {
    /// Identity of the snapshot refresh job
    fn default() -> Self {
        Self::new(JOB_HOOK, JOB_ARG)
    }
}

/// How a registration fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Fires every day, advancing by 24 hours after each firing
    Daily,
    /// Fires once and self-deletes
    Once,
}

impl Recurrence {
    /// Human-readable descriptor
    pub fn descriptor(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Once => "once",
        }
    }
}

/// A pending firing as reported by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledFire {
    /// Epoch seconds of the next firing
    pub fire_at: i64,
    pub recurrence: Recurrence,
}

/// External timer facility
///
/// At most one recurring registration may exist per identity; one-shot
/// entries may coexist with it under the same identity.
#[async_trait]
pub trait ScheduleRegistry: Send + Sync {
    /// Registers a daily recurring entry anchored at `first_fire`
    ///
    /// Returns false (and registers nothing) when a recurring entry already
    /// exists for the identity.
    async fn register_recurring(&self, id: &JobIdentity, first_fire: i64) -> bool;

    /// Registers a single-fire entry at `fire_at`
    async fn register_once(&self, id: &JobIdentity, fire_at: i64);

    /// Earliest pending firing for the identity, recurring or one-shot
    async fn next_scheduled(&self, id: &JobIdentity) -> Option<ScheduledFire>;

    /// True when a recurring entry exists for the identity
    async fn has_recurring(&self, id: &JobIdentity) -> bool;

    /// Removes the recurring entry for the identity, leaving one-shots alone
    async fn unregister_recurring(&self, id: &JobIdentity);

    /// Returns identities due at `now`, one per firing
    ///
    /// Due one-shot entries self-delete; due recurring entries advance to
    /// their next occurrence.
    async fn take_due(&self, now: i64) -> Vec<JobIdentity>;
}

#[derive(Debug, Clone)]
struct Entry {
    id: JobIdentity,
    fire_at: i64,
    recurrence: Recurrence,
}

/// In-process registry backed by a lock-guarded entry list
///
/// Concurrent `register`/`unregister` calls serialize behind the lock; the
/// final state is whichever call lands last, and the one-recurring-per-
/// identity invariant holds throughout.
pub struct MemoryScheduleRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryScheduleRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// All pending firings for an identity, for diagnostics and tests
    pub async fn scheduled(&self, id: &JobIdentity) -> Vec<ScheduledFire> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| &e.id == id)
            .map(|e| ScheduledFire {
                fire_at: e.fire_at,
                recurrence: e.recurrence,
            })
            .collect()
    }
}

impl Default for MemoryScheduleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRegistry for MemoryScheduleRegistry {
    async fn register_recurring(&self, id: &JobIdentity, first_fire: i64) -> bool {
        let mut entries = self.entries.write().await;
        if entries
            .iter()
            .any(|e| &e.id == id && e.recurrence == Recurrence::Daily)
        {
            return false;
        }
        entries.push(Entry {
            id: id.clone(),
            fire_at: first_fire,
            recurrence: Recurrence::Daily,
        });
        true
    }

    async fn register_once(&self, id: &JobIdentity, fire_at: i64) {
        self.entries.write().await.push(Entry {
            id: id.clone(),
            fire_at,
            recurrence: Recurrence::Once,
        });
    }

    async fn next_scheduled(&self, id: &JobIdentity) -> Option<ScheduledFire> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| &e.id == id)
            .min_by_key(|e| e.fire_at)
            .map(|e| ScheduledFire {
                fire_at: e.fire_at,
                recurrence: e.recurrence,
            })
    }

    async fn has_recurring(&self, id: &JobIdentity) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| &e.id == id && e.recurrence == Recurrence::Daily)
    }

    async fn unregister_recurring(&self, id: &JobIdentity) {
        self.entries
            .write()
            .await
            .retain(|e| !(&e.id == id && e.recurrence == Recurrence::Daily));
    }

    async fn take_due(&self, now: i64) -> Vec<JobIdentity> {
        let mut entries = self.entries.write().await;
        let mut fired = Vec::new();

        entries.retain_mut(|entry| {
            if entry.fire_at > now {
                return true;
            }
            fired.push(entry.id.clone());
            match entry.recurrence {
                Recurrence::Once => false,
                Recurrence::Daily => {
                    while entry.fire_at <= now {
                        entry.fire_at += DAY_SECS;
                    }
                    true
                }
            }
        });

        fired
    }
}

/// Current time in the given timezone
pub(crate) fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Current epoch seconds, acquired with an explicit timezone
pub(crate) fn now_secs(tz: Tz) -> i64 {
    now_in(tz).timestamp()
}

/// Next occurrence of the daily anchor strictly after `now`
///
/// Today's anchor when it is still ahead, otherwise the next day's. A day
/// whose anchor falls into a DST gap is skipped.
fn next_daily_anchor(now: DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();

    for _ in 0..3 {
        if let Some(naive) = day.and_hms_opt(DAILY_ANCHOR_HOUR, 0, 0) {
            if let Some(at) = tz.from_local_datetime(&naive).earliest() {
                if at > now {
                    return at;
                }
            }
        }
        day = day.succ_opt().unwrap_or(day);
    }

    // Unreachable for any sane clock; fall back to an immediate fire.
    now
}

/// Schedule owner for the snapshot refresh job
pub struct RefreshScheduler {
    registry: Arc<dyn ScheduleRegistry>,
    tracker: Arc<SnapshotTracker>,
    identity: JobIdentity,
    tz: Tz,
}

impl RefreshScheduler {
    /// Creates a scheduler with the default job identity and reference
    /// timezone
    pub fn new(registry: Arc<dyn ScheduleRegistry>, tracker: Arc<SnapshotTracker>) -> Self {
        Self {
            registry,
            tracker,
            identity: JobIdentity::default(),
            tz: REFERENCE_TZ,
        }
    }

    /// Registers the daily recurring job if none exists yet
    ///
    /// Idempotent; call once at startup before any run can occur.
    pub async fn ensure_scheduled(&self) {
        if self.registry.has_recurring(&self.identity).await {
            return;
        }

        let anchor = next_daily_anchor(now_in(self.tz));
        if self
            .registry
            .register_recurring(&self.identity, anchor.timestamp())
            .await
        {
            tracing::info!(
                first_fire = %anchor.format(DATE_FORMAT),
                "registered daily snapshot refresh"
            );
        }
    }

    /// Handles a firing reported by the timer facility
    ///
    /// The retry one-shot and the daily entry share one identity, so the
    /// argument check is what keeps foreign jobs on a shared channel from
    /// triggering a refresh.
    pub async fn on_tick(&self, job_arg: &str) {
        if job_arg != self.identity.arg {
            tracing::debug!(job_arg, "ignoring tick for foreign job");
            return;
        }

        match self.tracker.run().await {
            Ok(()) => {}
            // Not yet configured; stay silent like the run itself does.
            Err(RefreshError::ConfigIncomplete) => {}
            Err(e) => tracing::warn!(error = %e, "snapshot refresh failed"),
        }
    }

    /// Registers a one-shot retry at now + `delay_secs`
    ///
    /// Used after transport failures only. The recurring daily entry is not
    /// touched.
    pub async fn schedule_retry(&self, delay_secs: u64) {
        self.registry
            .register_once(&self.identity, now_secs(self.tz) + delay_secs as i64)
            .await;
    }

    /// Human-readable next-fire report; no side effects
    pub async fn status(&self) -> String {
        match self.registry.next_scheduled(&self.identity).await {
            Some(fire) => {
                let readable = self
                    .tz
                    .timestamp_opt(fire.fire_at, 0)
                    .single()
                    .map(|at| at.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| fire.fire_at.to_string());
                format!(
                    "Snapshot refresh is scheduled for: {readable}\nSchedule: {}",
                    fire.recurrence.descriptor()
                )
            }
            None => "Snapshot refresh is not scheduled.".to_string(),
        }
    }

    /// Removes the recurring registration (administrative reset)
    pub async fn cancel(&self) {
        self.registry.unregister_recurring(&self.identity).await;
    }

    /// Spawns the background task that drives the registry
    ///
    /// The task polls for due firings, runs them via [`Self::on_tick`], and
    /// sleeps until the next pending fire, capped so retries registered
    /// mid-sleep are picked up promptly.
    pub fn spawn_driver(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("snapshot refresh driver started");

            loop {
                let now = now_secs(self.tz);
                for id in self.registry.take_due(now).await {
                    self.on_tick(&id.arg).await;
                }

                let sleep_secs = match self.registry.next_scheduled(&self.identity).await {
                    Some(fire) => (fire.fire_at - now).clamp(1, DRIVER_POLL_SECS as i64) as u64,
                    None => DRIVER_POLL_SECS,
                };
                tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
            }
        })
    }
}
