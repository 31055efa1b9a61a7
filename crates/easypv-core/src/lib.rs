// easypv-core: Refresh coordinator and entity reconciliation on top of easypv-api.

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod setup;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CoordinatorConfig, DEFAULT_REFRESH_INTERVAL, DEFAULT_REFRESH_TIMEOUT};
pub use coordinator::{Coordinator, CoordinatorEvent, CoordinatorState};
pub use entity::{
    EntityHandle, EntityKind, EntityTarget, EntityValue, MANUFACTURER, SensorKind,
    default_factories,
};
pub use error::CoreError;
pub use model::{Device, Entity, Panel, Snapshot, Station};
pub use reconcile::{EntityFactories, EntitySink, ReconcileReport, Reconciler};
pub use registry::{DeviceRegistry, MemoryRegistry, RegistryEntry};
pub use setup::{AccountInfo, SetupError, validate_login};
pub use store::SnapshotStore;

pub use easypv_api::{EasyPvClient, TransportConfig};
