//! Integration tests for the `stackvault` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a platform; full runs go against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `stackvault` binary with env isolation.
///
/// Clears all `STACKVAULT_*` env vars and points config and data
/// directories at `home` so tests never touch the user's real setup.
fn stackvault_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("stackvault");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env("DBUS_SESSION_BUS_ADDRESS", "unix:path=/nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("STACKVAULT_PROFILE")
        .env_remove("STACKVAULT_URL")
        .env_remove("STACKVAULT_API_KEY")
        .env_remove("STACKVAULT_OUTPUT")
        .env_remove("STACKVAULT_OUTPUT_DIR")
        .env_remove("STACKVAULT_INSECURE")
        .env_remove("STACKVAULT_TIMEOUT")
        .env_remove("STACKVAULT_LOG_FORMAT")
        .env_remove("STACKVAULT_BACKUP_PASSWORD");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// The single dated run directory under `root`.
fn only_run_dir(root: &Path) -> PathBuf {
    let dirs: Vec<PathBuf> = std::fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1, "expected one run directory: {dirs:?}");
    dirs.into_iter().next().unwrap()
}

async fn mount_json(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_platform(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/backup"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x1f\x8barchive".to_vec()))
        .mount(server)
        .await;
    mount_json(
        server,
        "GET",
        "/api/endpoints",
        200,
        json!([{ "Id": 1, "Name": "local" }, { "Id": 2, "Name": "edge/site:a" }]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api/stacks",
        200,
        json!([
            { "Id": 3, "Name": "web app", "EndpointId": 1, "Type": 2 },
            {
                "Id": 4, "Name": "infra", "EndpointId": 2, "Type": 1,
                "GitConfig": { "URL": "https://git.example/infra.git" }
            }
        ]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api/stacks/3/file",
        200,
        json!({ "StackFileContent": "services:\n  web:\n    image: nginx\n" }),
    )
    .await;
    mount_json(server, "GET", "/api/stacks/4/file", 200, json!({})).await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = stackvault_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    stackvault_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("backup")
                .and(predicate::str::contains("stacks"))
                .and(predicate::str::contains("endpoints"))
                .and(predicate::str::contains("clean")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    stackvault_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackvault"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    stackvault_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    stackvault_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_backup_without_config_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = stackvault_cmd(home.path()).arg("backup").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No platform configured"), "{text}");
}

#[test]
fn test_backup_without_api_key_is_auth_error() {
    let home = tempfile::tempdir().unwrap();
    let output = stackvault_cmd(home.path())
        .args(["--url", "https://127.0.0.1:9", "backup"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No credentials"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let output = stackvault_cmd(home.path())
        .args(["--profile", "nope", "endpoints", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Profile 'nope' not found"));
}

#[test]
fn test_zero_retention_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let output = stackvault_cmd(home.path())
        .args(["clean", "--dry-run", "--retention-days", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("retention_days"));
}

// ── Full runs ───────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_backup_writes_tree_and_json_report() {
    let server = MockServer::start().await;
    mount_platform(&server).await;
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let output = stackvault_cmd(home.path())
        .args(["--url", &server.uri(), "--api-key", "ptr_test", "-o", "json"])
        .args(["backup", "--output-dir"])
        .arg(out.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["platform_backup"]["status"], "saved");
    assert_eq!(report["endpoint_count"], 2);
    assert_eq!(report["stacks"][0]["stack_id"], 3);
    assert_eq!(report["stacks"][1]["content"]["reason"], "no-inline-content");

    let run_dir = only_run_dir(out.path());
    let date = run_dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(run_dir.join(format!("portainer-backup_{date}.tar.gz")).exists());
    assert_eq!(
        std::fs::read_to_string(run_dir.join("local/stack_web_app-3.yaml")).unwrap(),
        "services:\n  web:\n    image: nginx\n"
    );
    let readme = std::fs::read_to_string(run_dir.join("edge_site_a/stack_infra-4.README.txt"))
        .unwrap();
    assert!(readme.contains("https://git.example/infra.git"));
    assert!(readme.contains("refs/heads/main"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backup_succeeds_when_platform_export_fails() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/api/backup", 500, json!({ "message": "boom" })).await;
    mount_json(&server, "GET", "/api/endpoints", 200, json!([])).await;
    mount_json(&server, "GET", "/api/stacks", 200, json!([])).await;
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    stackvault_cmd(home.path())
        .args(["--url", &server.uri(), "--api-key", "k", "--retries", "0"])
        .args(["backup", "--output-dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stack_enumeration_failure_is_fatal() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/api/backup", 200, json!({})).await;
    mount_json(&server, "GET", "/api/endpoints", 200, json!([])).await;
    mount_json(&server, "GET", "/api/stacks", 503, json!({ "message": "down" })).await;
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let output = stackvault_cmd(home.path())
        .args(["--url", &server.uri(), "--api-key", "k", "--retries", "0"])
        .args(["backup", "--output-dir"])
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("stack enumeration failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_api_key_exits_with_auth_code() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api/endpoints", 401, json!({ "message": "nope" })).await;
    let home = tempfile::tempdir().unwrap();

    let output = stackvault_cmd(home.path())
        .args(["--url", &server.uri(), "--api-key", "bad", "endpoints", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stacks_list_plain() {
    let server = MockServer::start().await;
    mount_platform(&server).await;
    let home = tempfile::tempdir().unwrap();

    stackvault_cmd(home.path())
        .args(["--url", &server.uri(), "--api-key", "k", "-o", "plain", "stacks", "list"])
        .assert()
        .success()
        .stdout("web app\ninfra\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_endpoints_list_table_shows_folders() {
    let server = MockServer::start().await;
    mount_platform(&server).await;
    let home = tempfile::tempdir().unwrap();

    stackvault_cmd(home.path())
        .args(["--url", &server.uri(), "--api-key", "k", "endpoints", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("edge/site:a").and(predicate::str::contains("edge_site_a")));
}

// ── Clean ───────────────────────────────────────────────────────────

fn age_dir(dir: &Path, days: u64) {
    let then = SystemTime::now() - Duration::from_secs(days * 86_400);
    std::fs::File::open(dir).unwrap().set_modified(then).unwrap();
}

#[test]
fn test_clean_dry_run_lists_without_deleting() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let old = out.path().join("2020-01-01");
    std::fs::create_dir(&old).unwrap();
    age_dir(&old, 90);
    std::fs::create_dir(out.path().join("fresh")).unwrap();

    stackvault_cmd(home.path())
        .args(["-o", "plain", "clean", "--dry-run", "--retention-days", "30", "--output-dir"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2020-01-01").and(predicate::str::contains("fresh").not()));
    assert!(old.exists());
}

#[test]
fn test_clean_requires_confirmation_without_tty() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let output = stackvault_cmd(home.path())
        .args(["clean", "--output-dir"])
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_clean_with_yes_removes_old_runs() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let old = out.path().join("2020-01-01");
    std::fs::create_dir_all(old.join("local")).unwrap();
    age_dir(&old, 90);

    stackvault_cmd(home.path())
        .args(["-y", "clean", "--retention-days", "7", "--output-dir"])
        .arg(out.path())
        .assert()
        .success();
    assert!(!old.exists());
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_use_and_show() {
    let home = tempfile::tempdir().unwrap();

    stackvault_cmd(home.path())
        .args(["-p", "lab", "config", "set", "url", "https://portainer.lab:9443"])
        .assert()
        .success();
    stackvault_cmd(home.path())
        .args(["-p", "lab", "config", "set", "api_key", "ptr_secret"])
        .assert()
        .success();
    stackvault_cmd(home.path())
        .args(["config", "use", "lab"])
        .assert()
        .success();

    stackvault_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *"));

    stackvault_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.lab]")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("ptr_secret").not()),
        );
}

#[test]
fn test_config_path_points_into_home() {
    let home = tempfile::tempdir().unwrap();
    stackvault_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    let output = stackvault_cmd(home.path())
        .args(["config", "use", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("ghost"));
}
