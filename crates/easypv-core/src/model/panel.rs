use serde::Serialize;

use super::Entity;

/// One PV input of an inverter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    /// Zero-based; the service reports a 1-based `sort`.
    pub idx: usize,
    pub station_id: String,
    pub device_id: String,
    pub entity_id: String,
    pub entity_name: String,
    /// W
    pub power: Option<f64>,
    /// A
    pub current: Option<f64>,
    /// V
    pub voltage: Option<f64>,
}

impl Panel {
    /// The 1-based number shown to users.
    pub fn number(&self) -> usize {
        self.idx + 1
    }
}

impl Entity for Panel {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn entity_name(&self) -> &str {
        &self.entity_name
    }
}
