// ── Device registry ──
//
// Key-value view of the devices known to the host, keyed by entity id.
// The reconciler only needs lookup and removal; the host (or the CLI's
// in-memory registry) fills entries in as entities are created.

use dashmap::DashMap;
use serde::Serialize;

/// Host-side record describing one registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    /// Entity id of the station, device or panel.
    pub id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub sw_version: Option<String>,
    /// Entity id of the parent device, if any.
    pub via_device: Option<String>,
}

/// Storage the reconciler retires stale devices from.
pub trait DeviceRegistry: Send + Sync {
    fn get(&self, id: &str) -> Option<RegistryEntry>;

    /// Insert or replace the entry with the same id.
    fn update(&self, entry: RegistryEntry);

    /// Remove an entry. Returns `false` if it was not registered.
    fn remove(&self, id: &str) -> bool;
}

/// Thread-safe in-memory registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: DashMap<String, RegistryEntry>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn get(&self, id: &str) -> Option<RegistryEntry> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    fn update(&self, entry: RegistryEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    fn remove(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> RegistryEntry {
        RegistryEntry {
            id: id.into(),
            name: id.into(),
            manufacturer: None,
            model: None,
            serial_number: None,
            sw_version: None,
            via_device: None,
        }
    }

    #[test]
    fn update_replaces_and_remove_is_idempotent() {
        let registry = MemoryRegistry::new();
        registry.update(entry("S1"));
        registry.update(RegistryEntry {
            name: "Roof".into(),
            ..entry("S1")
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("S1").map(|e| e.name), Some("Roof".into()));

        assert!(registry.remove("S1"));
        assert!(!registry.remove("S1"));
        assert!(registry.is_empty());
    }
}
