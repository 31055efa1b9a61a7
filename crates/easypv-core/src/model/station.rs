// ── Station domain type ──

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Device, Entity};

/// A solar plant: location, plant-wide totals and its inverters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub entity_id: String,
    pub entity_name: String,
    pub name: String,
    pub address: Option<String>,
    /// Free-text location as configured in the app.
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Current generation in W.
    pub power: Option<f64>,
    /// kWh generated today.
    pub energy_today: Option<f64>,
    /// Lifetime kWh.
    pub energy_total: Option<f64>,
    /// Keyed by device id. Rebuilt in full on every refresh.
    pub devices: BTreeMap<String, Device>,
}

impl Station {
    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn panel_count(&self) -> usize {
        self.devices.values().map(|d| d.panels.len()).sum()
    }
}

impl Entity for Station {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn entity_name(&self) -> &str {
        &self.entity_name
    }
}
