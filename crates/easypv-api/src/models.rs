// Easy PV response types
//
// Every endpoint wraps its payload in `{ code, msg, data }`. The service is
// loose about JSON types: ids arrive as numbers or strings and measurements
// as numbers, numeric strings or null. The lenient deserializers below
// accept all of those; anything unparseable becomes `None` rather than a
// hard failure. Unknown fields land in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Application-level success code inside the envelope.
pub const SUCCESS_CODE: i64 = 200;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Easy PV response envelope.
///
/// ```json
/// { "code": 200, "msg": "ok", "data": { ... } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// The service message, empty when absent.
    pub fn details(&self) -> String {
        self.msg.clone().unwrap_or_default()
    }

    /// The payload, but only for a successful envelope with non-empty data.
    pub fn payload(&self) -> Option<&Value> {
        if self.code != SUCCESS_CODE {
            return None;
        }
        self.data.as_ref().filter(|data| is_present(data))
    }
}

/// JSON truthiness: `null`, `""`, `[]`, `{}`, `false` and `0` are absent.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Payload of `POST /api/sys/v2/passLogin`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: Option<String>,
}

/// Account details from `GET /api/user/v2/selectUserInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Station ──────────────────────────────────────────────────────────

/// Paged wrapper around the station list.
#[derive(Debug, Clone, Deserialize)]
pub struct StationPage {
    #[serde(default, deserialize_with = "vec_or_null")]
    pub rows: Vec<RawStation>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// One row of `GET /api/powerStation/v3/getStationList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStation {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plant_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    /// Current generation in W.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gen_power: Option<f64>,
    /// Energy generated today in kWh.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub today_power_totals: Option<f64>,
    /// Lifetime energy in kWh.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub power_totals: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Device ───────────────────────────────────────────────────────────

/// One entry of `GET /api/powerStation/v2/getPowerList`.
///
/// Only the id matters: the measurements come from the per-device call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDevice {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Payload of `GET /api/powerStation/v3/getDeviceDataInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeviceData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_num: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gen_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub genpower_today_totals: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub genpower_month_totals: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub grid_voltage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub app_firm_ver: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub net_firm_ver: Option<String>,
    #[serde(default, deserialize_with = "vec_or_null")]
    pub device_photovoltaic_panel: Vec<RawPanel>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One PV string input reported inside the device data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPanel {
    /// 1-based position, usually sent as a string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub gen_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub voltage: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Lenient deserializers ────────────────────────────────────────────

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
