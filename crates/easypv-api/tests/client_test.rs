#![allow(clippy::unwrap_used)]
// Integration tests for `EasyPvClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use easypv_api::{EasyPvClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, EasyPvClient) {
    let server = MockServer::start().await;
    let client = EasyPvClient::new(&server.uri(), &TransportConfig::default()).unwrap();
    (server, client)
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 200, "msg": "ok", "data": data }))
}

fn rejected(code: i64, msg: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": code, "msg": msg, "data": null }))
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

async fn mount_user_info(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/user/v2/selectUserInfo"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ok(json!({ "userName": "alice", "email": "alice@example.com" })))
        .mount(server)
        .await;
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_password_login_stores_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sys/v2/passLogin"))
        .and(header("app", "EasyPV"))
        .and(header("app-type", "1"))
        .and(header("app-version", "2.4.0"))
        .and(header("content-language", "en_US"))
        .and(header("user-agent", "Easy PV/2.4.0"))
        .and(body_json(json!({ "num": "alice", "password": "hunter2" })))
        .respond_with(ok(json!({ "token": "T1" })))
        .mount(&server)
        .await;

    client
        .login_with_password("alice", &secret("hunter2"))
        .await
        .unwrap();

    assert!(client.is_logged_in());
    assert_eq!(client.token().unwrap().expose_secret(), "T1");
}

#[tokio::test]
async fn test_password_login_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sys/v2/passLogin"))
        .respond_with(rejected(500, "wrong password"))
        .mount(&server)
        .await;

    let result = client.login_with_password("alice", &secret("nope")).await;

    match result {
        Err(Error::Login { code, details }) => {
            assert_eq!(code, 500);
            assert_eq!(details, "wrong password");
        }
        other => panic!("expected Login error, got: {other:?}"),
    }
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_password_login_empty_token_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sys/v2/passLogin"))
        .respond_with(ok(json!({ "token": "" })))
        .mount(&server)
        .await;

    let result = client.login_with_password("alice", &secret("pw")).await;
    assert!(
        matches!(result, Err(Error::Login { code: 200, .. })),
        "expected Login error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_password_login_bad_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sys/v2/passLogin"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result = client.login_with_password("alice", &secret("pw")).await;
    assert!(
        matches!(result, Err(Error::InvalidResponse { status: 502 })),
        "expected InvalidResponse, got: {result:?}"
    );
}

#[tokio::test]
async fn test_token_login_validates_with_user_info() {
    let (server, client) = setup().await;
    mount_user_info(&server, "T1").await;

    let info = client.login_with_token(secret("T1")).await.unwrap();

    assert!(client.is_logged_in());
    assert_eq!(info.user_name.as_deref(), Some("alice"));
    assert_eq!(info.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_token_login_failure_clears_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user/v2/selectUserInfo"))
        .respond_with(rejected(401, "token expired"))
        .mount(&server)
        .await;

    let result = client.login_with_token(secret("stale")).await;

    assert!(
        matches!(result, Err(Error::Login { code: 401, .. })),
        "expected Login error, got: {result:?}"
    );
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_token_login_transport_failure_clears_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/user/v2/selectUserInfo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.login_with_token(secret("T1")).await;

    assert!(matches!(result, Err(Error::InvalidResponse { status: 500 })));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn test_logout_is_local() {
    let (server, client) = setup().await;
    mount_user_info(&server, "T1").await;

    client.login_with_token(secret("T1")).await.unwrap();
    client.logout();

    assert!(!client.is_logged_in());
    assert!(client.token().is_none());
}

// ── Station tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_get_stations() {
    let (server, client) = setup().await;
    mount_user_info(&server, "T1").await;
    client.login_with_token(secret("T1")).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getStationList"))
        .and(query_param("pageNum", "1"))
        .and(query_param("pageSize", "1000"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ok(json!({
            "total": 1,
            "rows": [{
                "id": "S1",
                "name": "Roof",
                "address": "Main St 1",
                "plantLocation": "Berlin",
                "latitude": 52.5,
                "longitude": 13.4,
                "genPower": 100.0,
                "todayPowerTotals": 3.2,
                "powerTotals": 1234.5
            }]
        })))
        .mount(&server)
        .await;

    let stations = client.get_stations().await.unwrap();

    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].id, "S1");
    assert_eq!(stations[0].name.as_deref(), Some("Roof"));
    assert_eq!(stations[0].plant_location.as_deref(), Some("Berlin"));
    assert_eq!(stations[0].gen_power, Some(100.0));
    assert_eq!(stations[0].power_totals, Some(1234.5));
}

#[tokio::test]
async fn test_get_stations_empty_rows_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getStationList"))
        .respond_with(ok(json!({ "total": 0, "rows": [] })))
        .mount(&server)
        .await;

    let err = client.get_stations().await.unwrap_err();

    assert!(err.is_api());
    assert!(!err.is_login());
    assert_eq!(err.to_string(), "Failed to get stations: [200] ok");
}

#[tokio::test]
async fn test_get_station_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v2/getPowerList"))
        .and(query_param("powerId", "S1"))
        .respond_with(ok(json!([{ "id": 42, "deviceNum": "SN42" }, { "id": "D2" }])))
        .mount(&server)
        .await;

    let devices = client.get_station_devices("S1").await.unwrap();
    let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();

    assert_eq!(ids, vec!["42", "D2"]);
}

#[tokio::test]
async fn test_get_station_devices_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v2/getPowerList"))
        .respond_with(rejected(500, "server busy"))
        .mount(&server)
        .await;

    let err = client.get_station_devices("S1").await.unwrap_err();

    assert!(matches!(err, Error::Api { code: 500, .. }));
    assert_eq!(err.to_string(), "Failed to get devices: [500] server busy");
}

#[tokio::test]
async fn test_get_device_data_with_panels() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getDeviceDataInfo"))
        .and(query_param("deviceId", "D1"))
        .and(query_param("stationId", "S1"))
        .and(query_param("date", "2024-06"))
        .respond_with(ok(json!({
            "productCode": "X1",
            "deviceNum": "SN1",
            "genPower": 50.0,
            "genpowerTodayTotals": "1.5",
            "genpowerMonthTotals": 40.25,
            "gridVoltage": 231.0,
            "appFirmVer": "1.0.3",
            "netFirmVer": "2.1.0",
            "devicePhotovoltaicPanel": [
                { "sort": "2", "genPower": 20.0, "current": 0.5, "voltage": 40.0 },
                { "sort": "1", "genPower": 30.0, "current": 0.7, "voltage": 42.0 }
            ]
        })))
        .mount(&server)
        .await;

    let data = client
        .get_device_data("S1", "D1", Some("2024-06"))
        .await
        .unwrap();

    assert_eq!(data.product_code.as_deref(), Some("X1"));
    assert_eq!(data.genpower_today_totals, Some(1.5));
    assert_eq!(data.genpower_month_totals, Some(40.25));
    assert_eq!(data.device_photovoltaic_panel.len(), 2);
    assert_eq!(data.device_photovoltaic_panel[0].sort.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_get_device_data_empty_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getDeviceDataInfo"))
        .respond_with(ok(json!({})))
        .mount(&server)
        .await;

    let err = client.get_device_data("S1", "D1", None).await.unwrap_err();

    assert!(matches!(err, Error::Api { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_non_envelope_body_is_a_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getStationList"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client.get_stations().await.unwrap_err();

    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("maintenance")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
