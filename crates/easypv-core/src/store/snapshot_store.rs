// ── Snapshot store ──
//
// Readers call `load()` and get an `Arc<Snapshot>` they can hold as long as
// they like; the coordinator swaps in a new snapshot atomically after each
// successful refresh. Refresh metadata is broadcast through `watch`.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::Snapshot;

pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            current: ArcSwap::from_pointee(Snapshot::default()),
            last_refresh,
        }
    }

    /// The latest published snapshot (empty before the first refresh).
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Replace the current snapshot and stamp the refresh time.
    pub(crate) fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Arc::clone(&snapshot));
        self.last_refresh.send_replace(Some(Utc::now()));
        snapshot
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn subscribe_last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }

    /// How long ago the last successful refresh happened, if ever.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
