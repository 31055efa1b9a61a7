//! Station listing.

use tabled::Tabled;

use easypv_core::Station;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct StationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Today")]
    today: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Devices")]
    devices: usize,
    #[tabled(rename = "Panels")]
    panels: usize,
}

impl From<&Station> for StationRow {
    fn from(s: &Station) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            address: s.address.clone().unwrap_or_default(),
            power: output::reading(s.power, "W"),
            today: output::reading(s.energy_today, "kWh"),
            total: output::reading(s.energy_total, "kWh"),
            devices: s.devices.len(),
            panels: s.panel_count(),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let session = config::connect(global)?;
    let format = session.format;
    let snapshot = util::fetch_snapshot(session).await?;

    let stations: Vec<&Station> = snapshot.stations().collect();
    let out = output::render_list(
        format,
        &stations,
        |s| StationRow::from(*s),
        |s| s.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
