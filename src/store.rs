//! Last-accepted snapshot storage

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::{SnapshotRows, StoredSnapshot};

/// Persistence for the snapshot/timestamp pair
///
/// The pair is the unit of storage: `write` replaces both values in one
/// step, so readers never see a fresh snapshot with a stale timestamp or
/// the other way around. With several concurrent writers the semantics are
/// last-writer-wins.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Atomically replaces the snapshot and its capture timestamp
    async fn write(&self, values: SnapshotRows, captured_at: i64);

    /// Returns the last accepted snapshot, if any
    async fn read(&self) -> Option<StoredSnapshot>;
}

/// In-memory snapshot store
pub struct MemorySnapshotStore {
    slot: RwLock<Option<StoredSnapshot>>,
}

impl MemorySnapshotStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn write(&self, values: SnapshotRows, captured_at: i64) {
        let mut slot = self.slot.write().await;
        // The stored timestamp never moves backwards, even across a clock step.
        let captured_at = match slot.as_ref() {
            Some(prev) => captured_at.max(prev.captured_at),
            None => captured_at,
        };
        *slot = Some(StoredSnapshot::new(values, captured_at));
    }

    async fn read(&self) -> Option<StoredSnapshot> {
        self.slot.read().await.clone()
    }
}
