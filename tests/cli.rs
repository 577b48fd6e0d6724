//! Smoke tests for the command-line binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const BATCH: &str = r#"{"D":"1", "T":"2"}
{"event_type":"befriend", "timestamp":"2017-06-13 11:33:01", "id1":"A", "id2":"B"}
{"event_type":"purchase", "timestamp":"2017-06-13 11:33:01", "id":"B", "amount":"10"}
{"event_type":"purchase", "timestamp":"2017-06-13 11:33:01", "id":"B", "amount":"20"}
"#;

const STREAM: &str = r#"{"event_type":"purchase", "timestamp":"2017-06-13 11:33:02", "id":"A", "amount":"100"}
"#;

fn write_logs(dir: &TempDir, stream: &str) {
    fs::write(dir.path().join("batch_log.json"), BATCH).unwrap();
    fs::write(dir.path().join("stream_log.json"), stream).unwrap();
}

fn detector(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("purchase-anomaly-detector").unwrap();
    cmd.current_dir(dir.path())
        .args(["batch_log.json", "stream_log.json", "flagged_purchases.json"]);
    cmd
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("purchase-anomaly-detector")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("social network"));
}

#[test]
fn test_cli_requires_paths() {
    Command::cargo_bin("purchase-anomaly-detector")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn test_cli_writes_flagged_purchases() {
    let dir = TempDir::new().unwrap();
    write_logs(&dir, STREAM);

    detector(&dir).assert().success();

    let output = fs::read_to_string(dir.path().join("flagged_purchases.json")).unwrap();
    assert_eq!(
        output,
        "{\"event_type\":\"purchase\",\"timestamp\":\"2017-06-13 11:33:02\",\"id\":\"A\",\"amount\":\"100\",\"mean\":\"15.00\",\"sd\":\"5.00\"}\n"
    );
}

#[test]
fn test_cli_strict_by_default() {
    let dir = TempDir::new().unwrap();
    write_logs(
        &dir,
        r#"{"event_type":"unfriend", "timestamp":"2017-06-13 11:33:02", "id1":"A", "id2":"C"}"#,
    );

    detector(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No friendship between A and C"));

    detector(&dir).arg("--skip-invalid").assert().success();
}

#[cfg(feature = "ranking")]
#[test]
fn test_cli_ranking() {
    let dir = TempDir::new().unwrap();
    write_logs(&dir, STREAM);

    detector(&dir)
        .args(["--rank-at", "2017-06-13 11:33:02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. A 100.00"))
        .stdout(predicate::str::contains("2. B 30.00"));
}
