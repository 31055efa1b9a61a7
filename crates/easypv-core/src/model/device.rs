// ── Device (inverter) domain type ──

use serde::Serialize;

use super::{Entity, Panel};

/// A micro-inverter attached to a station.
///
/// `entity_id` is `"{station_id}_{id}"`: device ids are only unique within
/// their station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub station_id: String,
    pub entity_id: String,
    pub entity_name: String,
    /// Current generation in W.
    pub power: Option<f64>,
    /// kWh generated today.
    pub energy_today: Option<f64>,
    /// kWh generated this month.
    pub energy_month: Option<f64>,
    pub product_code: String,
    pub device_serial: Option<String>,
    /// AC grid voltage in V.
    pub grid_voltage: Option<f64>,
    pub app_firmware_version: Option<String>,
    pub net_firmware_version: Option<String>,
    /// Ascending by `idx`.
    pub panels: Vec<Panel>,
}

impl Device {
    /// Look a panel up by its zero-based index.
    pub fn panel(&self, idx: usize) -> Option<&Panel> {
        self.panels.iter().find(|p| p.idx == idx)
    }
}

impl Entity for Device {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn entity_name(&self) -> &str {
        &self.entity_name
    }
}
