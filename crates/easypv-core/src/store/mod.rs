// ── Snapshot storage ──
//
// Lock-free single-writer, many-reader holder of the latest snapshot.

mod snapshot_store;

pub use snapshot_store::SnapshotStore;
