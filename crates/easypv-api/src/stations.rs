// Easy PV station and device endpoints
//
// Three levels: the station list, the device ids per station, and the
// full data record per device (panels embedded). An empty list is treated
// as a failure, the same as a rejected envelope.

use chrono::Utc;
use tracing::debug;

use crate::client::{EasyPvClient, decode};
use crate::error::Error;
use crate::models::{RawDevice, RawDeviceData, RawStation, StationPage};

const STATION_PAGE_SIZE: &str = "1000";

impl EasyPvClient {
    /// List every station of the account.
    ///
    /// `GET /api/powerStation/v3/getStationList?pageNum=1&pageSize=1000`
    pub async fn get_stations(&self) -> Result<Vec<RawStation>, Error> {
        let reply = self
            .get(
                "api/powerStation/v3/getStationList",
                &[("pageNum", "1"), ("pageSize", STATION_PAGE_SIZE)],
            )
            .await?;

        let page: Option<StationPage> = reply.payload().map(decode).transpose()?;
        let rows = page
            .map(|page| page.rows)
            .filter(|rows| !rows.is_empty())
            .ok_or_else(|| Error::api("Failed to get stations", reply.code, reply.details()))?;

        debug!(count = rows.len(), "stations listed");
        Ok(rows)
    }

    /// List the inverters of one station.
    ///
    /// `GET /api/powerStation/v2/getPowerList?powerId={station_id}`
    pub async fn get_station_devices(&self, station_id: &str) -> Result<Vec<RawDevice>, Error> {
        let reply = self
            .get(
                "api/powerStation/v2/getPowerList",
                &[("powerId", station_id)],
            )
            .await?;

        let data = reply
            .payload()
            .ok_or_else(|| Error::api("Failed to get devices", reply.code, reply.details()))?;

        decode(data)
    }

    /// Fetch the full data record of one inverter, panels included.
    ///
    /// `GET /api/powerStation/v3/getDeviceDataInfo?deviceId=..&stationId=..&date=YYYY-MM`.
    /// `date` defaults to the current UTC year and month.
    pub async fn get_device_data(
        &self,
        station_id: &str,
        device_id: &str,
        date: Option<&str>,
    ) -> Result<RawDeviceData, Error> {
        let date = date.map_or_else(current_month, str::to_owned);

        let reply = self
            .get(
                "api/powerStation/v3/getDeviceDataInfo",
                &[
                    ("deviceId", device_id),
                    ("stationId", station_id),
                    ("date", date.as_str()),
                ],
            )
            .await?;

        let data = reply
            .payload()
            .ok_or_else(|| Error::api("Failed to get device data", reply.code, reply.details()))?;

        decode(data)
    }
}

fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}
