//! Basic CLI E2E tests.
//!
//! Each test runs the `focusroom` binary against its own data directory.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn command(dir: &TempDir, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_focusroom"));
    cmd.args(args)
        .env("FOCUSROOM_DATA_DIR", dir.path())
        .env_remove("RUST_LOG")
        .env_remove("FOCUSROOM_ENV");
    cmd
}

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = command(dir, args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_config_path_uses_data_dir() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(dir.path().to_str().unwrap()));
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "stats.streak_lookback_days", "30"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "stats.streak_lookback_days"]);
    assert_eq!(stdout.trim(), "30");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "set", "nope.nothing", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("store.backend"), "{stderr}");
}

#[test]
fn test_config_list_prints_flat_keys() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["config", "set", "logging.filter", "debug"]);
    let (stdout, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.lines().any(|l| l == "logging.filter = debug"), "{stdout}");
    assert!(stdout.lines().any(|l| l == "clock.tick_interval_ms = 1000"), "{stdout}");

    let listed = run_json(&dir, &["config", "list", "--json"]);
    assert_eq!(listed["logging"]["filter"], "debug");
}

#[test]
fn test_timer_status_is_idle_snapshot() {
    let dir = TempDir::new().unwrap();
    let status = run_json(&dir, &["timer", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["state"]["run_state"], "idle");
    assert_eq!(status["state"]["mode"], "work");
    assert_eq!(status["state"]["remaining_seconds"], 1500);
    assert_eq!(status["today_count"], 0);
}

#[test]
fn test_settings_set_then_show() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["settings", "set", "focus_minutes", "30"]);
    assert_eq!(code, 0, "{stderr}");

    let shown = run_json(&dir, &["settings", "show", "--json"]);
    assert_eq!(shown["settings"]["focus_minutes"], 30);
    assert_eq!(shown["settings"]["short_break_minutes"], 5);
    assert_eq!(shown["status"]["state"], "synced");

    let status = run_json(&dir, &["timer", "status"]);
    assert_eq!(status["state"]["remaining_seconds"], 1800);
}

#[test]
fn test_settings_out_of_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["settings", "set", "focus_minutes", "99"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let shown = run_json(&dir, &["settings", "show", "--json"]);
    assert_eq!(shown["settings"]["focus_minutes"], 25);
}

#[test]
fn test_sessions_add_updates_stats() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["sessions", "add", "25"]);
    assert_eq!(code, 0, "{stderr}");
    run_cli(&dir, &["sessions", "add", "5", "--kind", "break"]);

    let today = run_json(&dir, &["stats", "today", "--json"]);
    assert_eq!(today["today_count"], 1);
    assert_eq!(today["today_minutes"], 25);
    assert_eq!(today["streak_days"], 1);

    let listed = run_json(&dir, &["sessions", "list", "--json"]);
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let all = run_json(&dir, &["stats", "all", "--json"]);
    assert_eq!(all["total_minutes"], 25);
}

#[test]
fn test_sessions_add_zero_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["sessions", "add", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_stats_week_has_seven_days() {
    let dir = TempDir::new().unwrap();
    let week = run_json(&dir, &["stats", "week", "--json"]);
    assert_eq!(week.as_object().unwrap().len(), 7);
}

#[test]
fn test_timer_run_skip_records_session() {
    let dir = TempDir::new().unwrap();
    let mut child = command(&dir, &["timer", "run"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn timer");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"s\nk\nq\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let today = run_json(&dir, &["stats", "today", "--json"]);
    assert_eq!(today["today_count"], 1);
    assert_eq!(today["today_minutes"], 25);
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("focusroom"));
}
