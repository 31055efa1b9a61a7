// ── Entity catalog ──
//
// The observable entities published for each station, device and panel.
// Handles carry ids only; values are read live from the coordinator's
// current snapshot so a handle never holds stale data.

use serde::Serialize;
use strum::{Display, IntoStaticStr};

use crate::coordinator::Coordinator;
use crate::model::{Device, Entity, Panel, Snapshot, Station};
use crate::reconcile::EntityFactories;
use crate::registry::RegistryEntry;

/// Manufacturer reported for every inverter.
pub const MANUFACTURER: &str = "Electronic Way Technology";

// ── Kinds ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorKind {
    Power,
    EnergyToday,
    EnergyMonth,
    EnergyTotal,
    GridVoltage,
    Voltage,
    Current,
}

impl SensorKind {
    /// Suffix of the unique id, e.g. `energy_today`.
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Power => "W",
            Self::EnergyToday | Self::EnergyMonth | Self::EnergyTotal => "kWh",
            Self::GridVoltage | Self::Voltage => "V",
            Self::Current => "A",
        }
    }

    pub fn device_class(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::EnergyToday | Self::EnergyMonth | Self::EnergyTotal => "energy",
            Self::GridVoltage | Self::Voltage => "voltage",
            Self::Current => "current",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sensor(SensorKind),
    /// Diagnostic tracker with the station's address and coordinates.
    Location,
}

impl EntityKind {
    pub fn key(self) -> &'static str {
        match self {
            Self::Sensor(kind) => kind.key(),
            Self::Location => "location",
        }
    }
}

/// What an entity observes, by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum EntityTarget {
    Station {
        station_id: String,
    },
    Device {
        station_id: String,
        device_id: String,
    },
    Panel {
        station_id: String,
        device_id: String,
        idx: usize,
    },
}

/// A live reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityValue {
    Number(f64),
    Location {
        name: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
}

// ── Handle ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityHandle {
    /// `"{entity_id}_{key}"`, stable across refreshes.
    pub unique_id: String,
    pub target: EntityTarget,
    pub kind: EntityKind,
}

impl EntityHandle {
    fn new(entity_id: &str, target: EntityTarget, kind: EntityKind) -> Self {
        Self {
            unique_id: format!("{entity_id}_{}", kind.key()),
            target,
            kind,
        }
    }

    pub fn station(station: &Station, kind: EntityKind) -> Self {
        Self::new(
            station.entity_id(),
            EntityTarget::Station {
                station_id: station.id.clone(),
            },
            kind,
        )
    }

    pub fn device(device: &Device, kind: SensorKind) -> Self {
        Self::new(
            device.entity_id(),
            EntityTarget::Device {
                station_id: device.station_id.clone(),
                device_id: device.id.clone(),
            },
            EntityKind::Sensor(kind),
        )
    }

    pub fn panel(panel: &Panel, kind: SensorKind) -> Self {
        Self::new(
            panel.entity_id(),
            EntityTarget::Panel {
                station_id: panel.station_id.clone(),
                device_id: panel.device_id.clone(),
                idx: panel.idx,
            },
            EntityKind::Sensor(kind),
        )
    }

    /// Value from the coordinator's current snapshot.
    pub fn value(&self, coordinator: &Coordinator) -> Option<EntityValue> {
        self.value_in(&coordinator.snapshot())
    }

    /// Value from a given snapshot; `None` when the target vanished or the
    /// service sent no reading.
    pub fn value_in(&self, snapshot: &Snapshot) -> Option<EntityValue> {
        match (&self.target, self.kind) {
            (EntityTarget::Station { station_id }, kind) => {
                let station = snapshot.station(station_id)?;
                match kind {
                    EntityKind::Location => Some(EntityValue::Location {
                        name: station.address.clone(),
                        latitude: station.latitude,
                        longitude: station.longitude,
                    }),
                    EntityKind::Sensor(SensorKind::Power) => station.power.map(EntityValue::Number),
                    EntityKind::Sensor(SensorKind::EnergyToday) => {
                        station.energy_today.map(EntityValue::Number)
                    }
                    EntityKind::Sensor(SensorKind::EnergyTotal) => {
                        station.energy_total.map(EntityValue::Number)
                    }
                    EntityKind::Sensor(_) => None,
                }
            }
            (
                EntityTarget::Device {
                    station_id,
                    device_id,
                },
                EntityKind::Sensor(kind),
            ) => {
                let device = snapshot.device(station_id, device_id)?;
                let reading = match kind {
                    SensorKind::Power => device.power,
                    SensorKind::EnergyToday => device.energy_today,
                    SensorKind::EnergyMonth => device.energy_month,
                    SensorKind::GridVoltage => device.grid_voltage,
                    _ => None,
                };
                reading.map(EntityValue::Number)
            }
            (
                EntityTarget::Panel {
                    station_id,
                    device_id,
                    idx,
                },
                EntityKind::Sensor(kind),
            ) => {
                let panel = snapshot.panel(station_id, device_id, *idx)?;
                let reading = match kind {
                    SensorKind::Power => panel.power,
                    SensorKind::Voltage => panel.voltage,
                    SensorKind::Current => panel.current,
                    _ => None,
                };
                reading.map(EntityValue::Number)
            }
            (_, EntityKind::Location) => None,
        }
    }

    /// Entities are available exactly while the coordinator holds a token.
    #[allow(clippy::unused_self)]
    pub fn available(&self, coordinator: &Coordinator) -> bool {
        coordinator.is_logged_in()
    }

    /// Suggested decimals; panel readings are shown as reported.
    pub fn display_precision(&self) -> Option<u8> {
        match (&self.target, self.kind) {
            (EntityTarget::Panel { .. }, _) | (_, EntityKind::Location) => None,
            _ => Some(2),
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self.kind {
            EntityKind::Sensor(kind) => Some(kind.unit()),
            EntityKind::Location => None,
        }
    }

    /// Registry record of the device this entity belongs to.
    pub fn device_info(&self, snapshot: &Snapshot) -> Option<RegistryEntry> {
        match &self.target {
            EntityTarget::Station { station_id } => {
                let station = snapshot.station(station_id)?;
                Some(RegistryEntry {
                    id: station.entity_id().to_owned(),
                    name: station.entity_name().to_owned(),
                    manufacturer: None,
                    model: None,
                    serial_number: None,
                    sw_version: None,
                    via_device: None,
                })
            }
            EntityTarget::Device {
                station_id,
                device_id,
            } => {
                let device = snapshot.device(station_id, device_id)?;
                Some(RegistryEntry {
                    id: device.entity_id().to_owned(),
                    name: device.entity_name().to_owned(),
                    manufacturer: Some(MANUFACTURER.to_owned()),
                    model: Some(device.product_code.clone()),
                    serial_number: device.device_serial.clone(),
                    sw_version: device.app_firmware_version.clone(),
                    via_device: Some(station_id.clone()),
                })
            }
            EntityTarget::Panel {
                station_id,
                device_id,
                idx,
            } => {
                let device = snapshot.device(station_id, device_id)?;
                let panel = device.panel(*idx)?;
                Some(RegistryEntry {
                    id: panel.entity_id().to_owned(),
                    name: panel.entity_name().to_owned(),
                    manufacturer: None,
                    model: None,
                    serial_number: None,
                    sw_version: None,
                    via_device: Some(device.entity_id().to_owned()),
                })
            }
        }
    }
}

// ── Catalog ──────────────────────────────────────────────────────

const STATION_SENSORS: [SensorKind; 3] = [
    SensorKind::Power,
    SensorKind::EnergyToday,
    SensorKind::EnergyTotal,
];

const DEVICE_SENSORS: [SensorKind; 4] = [
    SensorKind::Power,
    SensorKind::EnergyToday,
    SensorKind::EnergyMonth,
    SensorKind::GridVoltage,
];

const PANEL_SENSORS: [SensorKind; 3] = [SensorKind::Power, SensorKind::Voltage, SensorKind::Current];

/// Factories producing the standard sensor and tracker set.
pub fn default_factories() -> EntityFactories<EntityHandle> {
    EntityFactories::new()
        .with_station(|station| {
            STATION_SENSORS
                .iter()
                .map(|kind| EntityHandle::station(station, EntityKind::Sensor(*kind)))
                .chain(std::iter::once(EntityHandle::station(
                    station,
                    EntityKind::Location,
                )))
                .collect()
        })
        .with_device(|_, device| {
            DEVICE_SENSORS
                .iter()
                .map(|kind| EntityHandle::device(device, *kind))
                .collect()
        })
        .with_panel(|_, _, panel| {
            PANEL_SENSORS
                .iter()
                .map(|kind| EntityHandle::panel(panel, *kind))
                .collect()
        })
}
