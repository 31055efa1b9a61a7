// ── Domain model ──
//
// Immutable-per-refresh representation of one account's solar inventory:
// stations own devices (inverters), devices own panels (PV inputs). Every
// object carries a flat `entity_id`, unique across the whole snapshot,
// which is the only key used for diffing and registry correlation.

pub mod device;
pub mod panel;
pub mod snapshot;
pub mod station;

pub use device::Device;
pub use panel::Panel;
pub use snapshot::Snapshot;
pub use station::Station;

/// Identity shared by every observable object.
pub trait Entity {
    /// Snapshot-wide unique id.
    fn entity_id(&self) -> &str;
    /// Human-friendly name.
    fn entity_name(&self) -> &str;
}
