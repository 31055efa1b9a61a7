//! Inverter listing.

use tabled::Tabled;

use easypv_core::Device;

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Today")]
    today: String,
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Grid")]
    grid_voltage: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
    #[tabled(rename = "Panels")]
    panels: usize,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            entity_id: d.entity_id.clone(),
            model: d.product_code.clone(),
            serial: d.device_serial.clone().unwrap_or_default(),
            power: output::reading(d.power, "W"),
            today: output::reading(d.energy_today, "kWh"),
            month: output::reading(d.energy_month, "kWh"),
            grid_voltage: output::reading(d.grid_voltage, "V"),
            firmware: d.app_firmware_version.clone().unwrap_or_default(),
            panels: d.panels.len(),
        }
    }
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = config::connect(global)?;
    let format = session.format;
    let snapshot = util::fetch_snapshot(session).await?;

    let devices: Vec<&Device> = util::select_stations(&snapshot, args.station.as_deref())?
        .into_iter()
        .flat_map(|s| s.devices.values())
        .collect();

    let out = output::render_list(
        format,
        &devices,
        |d| DeviceRow::from(*d),
        |d| d.entity_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
