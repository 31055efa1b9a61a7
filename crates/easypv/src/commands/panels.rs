//! PV panel listing.

use tabled::Tabled;

use easypv_core::{Device, Panel};

use crate::cli::{GlobalOpts, PanelsArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PanelRow {
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Voltage")]
    voltage: String,
    #[tabled(rename = "Current")]
    current: String,
}

impl From<&Panel> for PanelRow {
    fn from(p: &Panel) -> Self {
        Self {
            entity_id: p.entity_id.clone(),
            name: p.entity_name.clone(),
            power: output::reading(p.power, "W"),
            voltage: output::reading(p.voltage, "V"),
            current: output::reading(p.current, "A"),
        }
    }
}

pub async fn handle(args: PanelsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = config::connect(global)?;
    let format = session.format;
    let snapshot = util::fetch_snapshot(session).await?;

    let stations = util::select_stations(&snapshot, args.station.as_deref())?;
    let devices: Vec<&Device> = match args.device.as_deref() {
        Some(id) => {
            let found: Vec<&Device> = stations.iter().filter_map(|s| s.device(id)).collect();
            if found.is_empty() {
                return Err(CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: id.into(),
                    list_command: "devices".into(),
                });
            }
            found
        }
        None => stations.iter().flat_map(|s| s.devices.values()).collect(),
    };

    let panels: Vec<&Panel> = devices.iter().flat_map(|d| d.panels.iter()).collect();
    let out = output::render_list(
        format,
        &panels,
        |p| PanelRow::from(*p),
        |p| p.entity_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
