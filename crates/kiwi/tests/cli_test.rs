//! Integration tests for the `kiwi` CLI binary.
//!
//! Argument parsing, help output, completions and input errors run without
//! a backend; the session-bound flows run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Unreachable backend for commands that must fail before any request.
const DEAD_URL: &str = "http://127.0.0.1:9";

/// Build a [`Command`] for the `kiwi` binary with env isolation.
///
/// Clears all `KIWI_*` env vars and points config and data directories
/// into `home` so tests never touch the user's real configuration or
/// keychain.
fn kiwi_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("kiwi");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("KIWI_DEFAULTS__TOKEN_STORAGE", "memory")
        .env("NO_COLOR", "1")
        .env_remove("KIWI_PROFILE")
        .env_remove("KIWI_API_URL")
        .env_remove("KIWI_OUTPUT")
        .env_remove("KIWI_INSECURE")
        .env_remove("KIWI_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Same, with tokens kept as files under `home`.
fn kiwi_cmd_with_files(home: &Path) -> assert_cmd::Command {
    let mut cmd = kiwi_cmd(home);
    cmd.env("KIWI_DEFAULTS__TOKEN_STORAGE", "file");
    cmd
}

fn token_file(home: &Path) -> PathBuf {
    home.join("data").join("kiwi").join("default").join("auth_token")
}

fn store_token(home: &Path, token: &str) {
    let path = token_file(home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, token).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn device_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "mac": "00:11:22:33:44:55",
        "tx_power": -50,
        "type": "vehicle",
        "status": 1,
        "created_at": "2024-01-01T00:00:00"
    })
}

async fn mount_me(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "email": "a@b.com", "username": "Admin" })),
        )
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = kiwi_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("device registry")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("whoami")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kiwi"));
}

#[test]
fn test_devices_create_help_lists_fields() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["devices", "create", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--mac")
                .and(predicate::str::contains("--tx-power"))
                .and(predicate::str::contains("--type")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[cfg(target_os = "linux")]
#[test]
fn test_config_path_follows_xdg() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config/kiwi/config.toml"));
}

#[test]
fn test_config_show_as_json() {
    let home = tempfile::tempdir().unwrap();
    let output = kiwi_cmd(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["default_profile"], "default");
    assert_eq!(value["defaults"]["token_storage"], "memory");
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = kiwi_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    let output = kiwi_cmd(home.path())
        .args(["--profile", "ghost", "whoami"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("ghost"));
}

#[test]
fn test_create_rejects_bad_fields_before_any_request() {
    let home = tempfile::tempdir().unwrap();
    let output = kiwi_cmd(home.path())
        .args([
            "--api-url",
            DEAD_URL,
            "devices",
            "create",
            "--name",
            "truck",
            "--mac",
            "not-a-mac",
            "--tx-power",
            "21",
            "--type",
            "vehicle",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("mac"), "{text}");
    assert!(text.contains("tx_power"), "{text}");
}

#[test]
fn test_update_without_fields_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["--api-url", DEAD_URL, "devices", "update", "7"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to update"));
}

#[test]
fn test_delete_requires_confirmation_without_terminal() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["--api-url", DEAD_URL, "devices", "delete", "7"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

#[test]
fn test_whoami_without_session() {
    let home = tempfile::tempdir().unwrap();
    kiwi_cmd(home.path())
        .args(["--api-url", DEAD_URL, "whoami"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_login_stores_token_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("username=a%40b.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, "T").await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = kiwi_cmd_with_files(home.path());
    cmd.args([
        "--api-url",
        &server.uri(),
        "login",
        "--email",
        "a@b.com",
        "--password-stdin",
    ])
    .write_stdin("secret\n");

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Logged in as Admin"));
    assert_eq!(std::fs::read_to_string(token_file(home.path())).unwrap(), "T");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_with_stored_session() {
    let server = MockServer::start().await;
    mount_me(&server, "saved").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/devices"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([device_json(2, "beta"), device_json(1, "alpha")])),
        )
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    store_token(home.path(), "saved");
    let mut cmd = kiwi_cmd_with_files(home.path());
    cmd.args(["--api-url", &server.uri(), "-o", "plain", "devices", "list"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2\n1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_get_missing_exits_not_found() {
    let server = MockServer::start().await;
    mount_me(&server, "saved").await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/devices/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found" })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    store_token(home.path(), "saved");
    let mut cmd = kiwi_cmd_with_files(home.path());
    cmd.args(["--api-url", &server.uri(), "devices", "get", "99"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("device '99' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_stored_token_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    store_token(home.path(), "stale");
    let mut cmd = kiwi_cmd_with_files(home.path());
    cmd.args(["--api-url", &server.uri(), "whoami"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(!token_file(home.path()).exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_removes_token_file() {
    let home = tempfile::tempdir().unwrap();
    store_token(home.path(), "saved");
    let mut cmd = kiwi_cmd_with_files(home.path());
    cmd.args(["--api-url", DEAD_URL, "logout"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(!token_file(home.path()).exists());
}
