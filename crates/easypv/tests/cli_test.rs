//! Integration tests for the `easypv` CLI binary.
//!
//! Argument parsing, help output, completions and error exit codes run
//! without a service; data commands run against a wiremock Easy PV API.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `easypv` binary with env isolation.
///
/// Clears all `EASYPV_*` variables and points the config file at `config`
/// so tests never touch the user's real configuration.
fn easypv_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("easypv");
    cmd.env("EASYPV_CONFIG", config)
        .env("HOME", "/tmp/easypv-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/easypv-cli-test-nonexistent")
        .env_remove("RUST_LOG")
        .env_remove("EASYPV_PROFILE")
        .env_remove("EASYPV_TOKEN")
        .env_remove("EASYPV_BASE_URL")
        .env_remove("EASYPV_OUTPUT")
        .env_remove("EASYPV_TIMEOUT")
        .env_remove("EASYPV_USERNAME")
        .env_remove("EASYPV_PASSWORD");
    cmd
}

fn scratch_config() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(config: PathBuf, args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || easypv_cmd(&config).args(args).output().unwrap())
        .await
        .unwrap()
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": 200, "msg": "ok", "data": data }))
}

async fn mount_account(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/sys/v2/passLogin"))
        .respond_with(ok(json!({ "token": "T1" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/v2/selectUserInfo"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ok(json!({ "userName": "alice", "email": "alice@example.com" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getStationList"))
        .respond_with(ok(json!({
            "rows": [{ "id": "S1", "name": "Roof", "genPower": 100.0 }],
            "total": 1
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/powerStation/v2/getPowerList"))
        .respond_with(ok(json!([{ "id": "D1" }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/powerStation/v3/getDeviceDataInfo"))
        .respond_with(ok(json!({
            "productCode": "X1",
            "genPower": 50.0,
            "devicePhotovoltaicPanel": [{ "sort": "1", "genPower": 25.0 }]
        })))
        .mount(server)
        .await;
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = scratch_config();
    let output = easypv_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = scratch_config();
    easypv_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("Easy PV")
            .and(predicate::str::contains("stations"))
            .and(predicate::str::contains("panels"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = scratch_config();
    easypv_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("easypv"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let (_dir, config) = scratch_config();
    easypv_cmd(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = scratch_config();
    easypv_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_dir, config) = scratch_config();
    let output = easypv_cmd(&config).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let (_dir, config) = scratch_config();
    easypv_cmd(&config)
        .args(["stations", "-o", "xml"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_stations_without_token_is_auth_error() {
    let (_dir, config) = scratch_config();
    easypv_cmd(&config)
        .arg("stations")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("No session token"));
}

#[test]
fn test_watch_rejects_zero_refresh_interval() {
    let (_dir, config) = scratch_config();
    std::fs::write(
        &config,
        "[profiles.default]\ntoken = \"T1\"\nrefresh_interval = 0\n",
    )
    .unwrap();

    easypv_cmd(&config)
        .arg("watch")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("refresh_interval"));
}

// ── Against a mock service ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_stations_json() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let (_dir, config) = scratch_config();

    let output = run(
        config,
        args(&["--token", "T1", "--base-url", &server.uri(), "stations", "-o", "json"]),
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stations: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stations[0]["id"], "S1");
    assert_eq!(stations[0]["power"], 100.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panels_plain_lists_entity_ids() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let (_dir, config) = scratch_config();

    let output = run(
        config,
        args(&["--token", "T1", "--base-url", &server.uri(), "panels", "-o", "plain"]),
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "S1_D1_panel_1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_station_is_not_found() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let (_dir, config) = scratch_config();

    let output = run(
        config,
        args(&["--token", "T1", "--base-url", &server.uri(), "devices", "--station", "NOPE"]),
    )
    .await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/v2/selectUserInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 401, "msg": "token expired", "data": null })),
        )
        .mount(&server)
        .await;
    let (_dir, config) = scratch_config();

    let output = run(
        config,
        args(&["--token", "OLD", "--base-url", &server.uri(), "stations"]),
    )
    .await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_profile_without_password() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    let (_dir, config) = scratch_config();

    let output = run(
        config.clone(),
        args(&[
            "--base-url",
            &server.uri(),
            "login",
            "--username",
            "alice",
            "--password",
            "hunter2",
            "--no-keyring",
        ]),
    )
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("[profiles.default]"), "{saved}");
    assert!(saved.contains("title = \"alice\""), "{saved}");
    assert!(saved.contains("token = \"T1\""), "{saved}");
    assert!(!saved.contains("hunter2"), "{saved}");

    // The stored profile is enough for data commands.
    let output = run(config, args(&["stations", "-o", "plain"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "S1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_with_wrong_password_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sys/v2/passLogin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 500, "msg": "wrong password", "data": null })),
        )
        .mount(&server)
        .await;
    let (_dir, config) = scratch_config();

    let output = run(
        config.clone(),
        args(&[
            "--base-url",
            &server.uri(),
            "login",
            "-u",
            "alice",
            "--password",
            "nope",
            "--no-keyring",
        ]),
    )
    .await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(!config.exists());
}
