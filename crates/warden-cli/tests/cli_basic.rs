//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use warden_core::storage::DEFAULT_RECORD_KEY;
use warden_core::{Database, KvStore, Phase, TimerRecord};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_warden"))
        .args(args)
        .env("WARDEN_DATA_DIR", data_dir)
        .env("WARDEN_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_docs(stdout: &str) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is a JSON stream")
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[test]
fn test_timer_status_first_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");

    let docs = json_docs(&stdout);
    assert_eq!(docs[0]["type"], "StateSnapshot");
    assert_eq!(docs[0]["phase"], "focus");
    let remaining = docs[0]["remaining_secs"].as_u64().unwrap();
    assert!((1490..=1500).contains(&remaining));
    assert!(dir.path().join("warden.db").exists());
}

#[test]
fn test_timer_status_resumes_break() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let db = Database::open_at(&dir.path().join("warden.db")).unwrap();
        let record = TimerRecord::new(Phase::Break, now_ms() + 120_000);
        db.set(DEFAULT_RECORD_KEY, &record.encode()).unwrap();
    }

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let docs = json_docs(&stdout);
    assert_eq!(docs[0]["phase"], "break");
    let remaining = docs[0]["remaining_secs"].as_u64().unwrap();
    assert!((110..=120).contains(&remaining));
}

#[test]
fn test_timer_status_transitions_expired_focus() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let db = Database::open_at(&dir.path().join("warden.db")).unwrap();
        let record = TimerRecord::new(Phase::Focus, now_ms() - 1_000);
        db.set(DEFAULT_RECORD_KEY, &record.encode()).unwrap();
    }

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    let docs = json_docs(&stdout);
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["phase"], "break");
    assert_eq!(docs[1]["type"], "PhaseChanged");
    assert_eq!(docs[1]["from"], "focus");
    assert_eq!(docs[1]["to"], "break");
}

#[test]
fn test_timer_skip_from_break() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let db = Database::open_at(&dir.path().join("warden.db")).unwrap();
        let record = TimerRecord::new(Phase::Break, now_ms() + 200_000);
        db.set(DEFAULT_RECORD_KEY, &record.encode()).unwrap();
    }

    let (stdout, _, code) = run_cli(dir.path(), &["timer", "skip"]);
    assert_eq!(code, 0);
    let docs = json_docs(&stdout);
    assert_eq!(docs[0]["type"], "PhaseChanged");
    assert_eq!(docs[0]["reason"], "skipped");
    assert_eq!(docs[0]["to"], "focus");

    let (stdout, _, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(json_docs(&stdout)[0]["phase"], "focus");
}

#[test]
fn test_config_set_get() {
    let dir = tempfile::TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "notifications.sound"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "true");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "notifications.sound", "false"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "notifications.sound"]);
    assert_eq!(stdout.trim(), "false");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "ui.theme", "dark"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown config key"));

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_storage_key_is_honoured() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "storage.key", "focusDeadline"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);

    let db = Database::open_at(&dir.path().join("warden.db")).unwrap();
    assert!(db.get("focusDeadline").unwrap().is_some());
    assert!(db.get(DEFAULT_RECORD_KEY).unwrap().is_none());
}
