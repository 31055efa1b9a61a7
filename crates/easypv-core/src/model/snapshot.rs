// ── Point-in-time snapshot ──

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{Device, Entity, Panel, Station};

/// The complete result of one successful refresh, keyed by station id.
///
/// Published behind an `Arc` and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    stations: BTreeMap<String, Station>,
}

impl Snapshot {
    pub fn new(stations: BTreeMap<String, Station>) -> Self {
        Self { stations }
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn station(&self, station_id: &str) -> Option<&Station> {
        self.stations.get(station_id)
    }

    pub fn device(&self, station_id: &str, device_id: &str) -> Option<&Device> {
        self.station(station_id)?.device(device_id)
    }

    pub fn panel(&self, station_id: &str, device_id: &str, idx: usize) -> Option<&Panel> {
        self.device(station_id, device_id)?.panel(idx)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Every station, device and panel id in one set.
    pub fn entity_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for station in self.stations.values() {
            ids.insert(station.entity_id().to_owned());
            for device in station.devices.values() {
                ids.insert(device.entity_id().to_owned());
                ids.extend(device.panels.iter().map(|p| p.entity_id().to_owned()));
            }
        }
        ids
    }
}
