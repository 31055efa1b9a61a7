// ── API-to-domain type conversions ──
//
// Bridges raw `easypv_api` records into `easypv_core::model` types. This is
// where entity ids and names are formed, panels are ordered, and missing
// names fall back to ids. Measurements are passed through untouched.

use std::collections::BTreeMap;

use tracing::warn;

use easypv_api::{RawDeviceData, RawPanel, RawStation};

use crate::model::{Device, Panel, Station};

// ── Station ────────────────────────────────────────────────────────

/// Build a station from its list row and its already converted devices.
pub fn station(raw: RawStation, devices: Vec<Device>) -> Station {
    let name = raw
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| raw.id.clone());

    let devices: BTreeMap<String, Device> =
        devices.into_iter().map(|d| (d.id.clone(), d)).collect();

    Station {
        entity_id: raw.id.clone(),
        entity_name: name.clone(),
        id: raw.id,
        name,
        address: raw.address,
        location: raw.plant_location,
        latitude: raw.latitude,
        longitude: raw.longitude,
        power: raw.gen_power,
        energy_today: raw.today_power_totals,
        energy_total: raw.power_totals,
        devices,
    }
}

// ── Device ─────────────────────────────────────────────────────────

/// Build a device from its data record. Panels are sorted by index;
/// records without a usable `sort` or repeating one are dropped.
pub fn device(station_id: &str, device_id: &str, raw: RawDeviceData) -> Device {
    let product_code = raw
        .product_code
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| device_id.to_owned());

    let mut panels: Vec<Panel> = Vec::with_capacity(raw.device_photovoltaic_panel.len());
    for record in raw.device_photovoltaic_panel {
        let Some(panel) = panel(station_id, device_id, &product_code, record) else {
            continue;
        };
        if panels.iter().any(|p| p.idx == panel.idx) {
            warn!(
                station_id,
                device_id,
                panel = panel.number(),
                "duplicate panel number, keeping the first"
            );
            continue;
        }
        panels.push(panel);
    }
    panels.sort_by_key(|p| p.idx);

    Device {
        id: device_id.to_owned(),
        station_id: station_id.to_owned(),
        entity_id: format!("{station_id}_{device_id}"),
        entity_name: product_code.clone(),
        power: raw.gen_power,
        energy_today: raw.genpower_today_totals,
        energy_month: raw.genpower_month_totals,
        product_code,
        device_serial: raw.device_num,
        grid_voltage: raw.grid_voltage,
        app_firmware_version: raw.app_firm_ver,
        net_firmware_version: raw.net_firm_ver,
        panels,
    }
}

// ── Panel ──────────────────────────────────────────────────────────

fn panel(station_id: &str, device_id: &str, product_code: &str, raw: RawPanel) -> Option<Panel> {
    let Some(number) = raw
        .sort
        .as_deref()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n >= 1)
    else {
        warn!(
            station_id,
            device_id,
            sort = ?raw.sort,
            "dropping panel without a valid sort number"
        );
        return None;
    };

    Some(Panel {
        idx: number - 1,
        station_id: station_id.to_owned(),
        device_id: device_id.to_owned(),
        entity_id: format!("{station_id}_{device_id}_panel_{number}"),
        entity_name: format!("{product_code} Panel {number}"),
        power: raw.gen_power,
        current: raw.current,
        voltage: raw.voltage,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn device_data(value: serde_json::Value) -> RawDeviceData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn panel_ids_embed_station_and_device() {
        let device = device(
            "S1",
            "D1",
            device_data(json!({
                "productCode": "X1",
                "genPower": 50.0,
                "devicePhotovoltaicPanel": [{ "sort": "1", "genPower": 25.0 }]
            })),
        );

        assert_eq!(device.entity_id, "S1_D1");
        assert_eq!(device.entity_name, "X1");
        assert_eq!(device.power, Some(50.0));
        assert_eq!(device.panels.len(), 1);

        let panel = &device.panels[0];
        assert_eq!(panel.idx, 0);
        assert_eq!(panel.entity_id, "S1_D1_panel_1");
        assert_eq!(panel.entity_name, "X1 Panel 1");
        assert_eq!(panel.power, Some(25.0));
    }

    #[test]
    fn panels_are_sorted_and_invalid_ones_dropped() {
        let device = device(
            "S1",
            "D1",
            device_data(json!({
                "productCode": "X1",
                "devicePhotovoltaicPanel": [
                    { "sort": "3" },
                    { "sort": "x" },
                    { "sort": "1" },
                    { "sort": "0" },
                    { "sort": 2 },
                    { "sort": "1" }
                ]
            })),
        );

        let idx: Vec<usize> = device.panels.iter().map(|p| p.idx).collect();
        assert_eq!(idx, vec![0, 1, 2]);
        assert_eq!(device.panel(2).unwrap().entity_id, "S1_D1_panel_3");
        assert!(device.panel(3).is_none());
    }

    #[test]
    fn missing_names_fall_back_to_ids() {
        let device = device("S1", "D9", device_data(json!({})));
        assert_eq!(device.entity_name, "D9");
        assert!(device.panels.is_empty());

        let raw: RawStation = serde_json::from_value(json!({ "id": "S1" })).unwrap();
        let station = station(raw, vec![device]);
        assert_eq!(station.entity_name, "S1");
        assert_eq!(station.entity_id, "S1");
        assert!(station.device("D9").is_some());
    }

    #[test]
    fn station_maps_remote_field_names() {
        let raw: RawStation = serde_json::from_value(json!({
            "id": "S1",
            "name": "Roof",
            "address": "Main St 1",
            "plantLocation": "Berlin",
            "latitude": 52.5,
            "longitude": 13.4,
            "genPower": 100.0,
            "todayPowerTotals": 3.5,
            "powerTotals": 900.0
        }))
        .unwrap();

        let station = station(raw, Vec::new());

        assert_eq!(station.name, "Roof");
        assert_eq!(station.location.as_deref(), Some("Berlin"));
        assert_eq!(station.address.as_deref(), Some("Main St 1"));
        assert_eq!(station.power, Some(100.0));
        assert_eq!(station.energy_today, Some(3.5));
        assert_eq!(station.energy_total, Some(900.0));
        assert!(station.devices.is_empty());
    }
}
