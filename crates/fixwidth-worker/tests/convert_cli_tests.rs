//! End-to-end tests for the command line
//!
//! Runs the binary against local files. No backend is running; commands that
//! need one are only checked up to their first request.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn write_schema(dir: &TempDir, config: serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("schema.json");
    fs::write(&path, serde_json::to_vec(&config).unwrap()).unwrap();
    path
}

fn people_schema() -> serde_json::Value {
    json!({
        "format": "fixed-width",
        "lineLength": 12,
        "fields": [
            { "name": "id", "type": "int", "length": 4 },
            { "name": "name", "type": "str", "length": 5 },
            { "type": "float", "length": 3 }
        ]
    })
}

#[test]
fn test_convert_writes_csv_and_summary() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, people_schema());
    let input = dir.path().join("people.txt");
    let output = dir.path().join("people.csv");
    fs::write(&input, "0001Alice1.5\n00x2Bob  2.0\n0003Cy,d 2,5\n").unwrap();

    let mut cmd = Command::cargo_bin("fixwidth-worker").unwrap();
    cmd.arg("convert")
        .arg("--schema")
        .arg(&schema)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"recordCount\": 2"))
        .stdout(predicate::str::contains("Invalid int"));

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "id,name,f3\n1,Alice,1.5\n3,\"Cy,d \",2.5\n"
    );
}

#[test]
fn test_convert_rejects_invalid_schema() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(
        &dir,
        json!({
            "format": "fixed-width",
            "lineLength": 10,
            "fields": [{ "name": "id", "type": "int", "length": 4 }]
        }),
    );
    let input = dir.path().join("in.txt");
    fs::write(&input, "0001\n").unwrap();

    let mut cmd = Command::cargo_bin("fixwidth-worker").unwrap();
    cmd.arg("convert")
        .arg("--schema")
        .arg(&schema)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("out.csv"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not match lineLength"));
}

#[test]
fn test_convert_missing_input() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, people_schema());

    let mut cmd = Command::cargo_bin("fixwidth-worker").unwrap();
    cmd.arg("convert")
        .arg("--schema")
        .arg(&schema)
        .arg("--input")
        .arg(dir.path().join("absent.txt"))
        .arg("--output")
        .arg(dir.path().join("out.csv"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_convert_rejects_non_fixed_width_format() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(
        &dir,
        json!({
            "format": "csv",
            "fields": [{ "name": "id", "type": "int", "length": 4 }]
        }),
    );
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.csv");
    fs::write(&input, "0001\n").unwrap();

    let mut cmd = Command::cargo_bin("fixwidth-worker").unwrap();
    cmd.arg("convert")
        .arg("--schema")
        .arg(&schema)
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format: csv"));
    assert!(!output.exists());
}

#[test]
fn test_flag_overrides_invalid_environment() {
    let mut cmd = Command::cargo_bin("fixwidth-worker").unwrap();
    cmd.env("BACKEND_URL", "not-a-url")
        .arg("--backend-url")
        .arg("http://127.0.0.1:9")
        .arg("run")
        .arg("42");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Backend URL must be").not())
        .stderr(predicate::str::contains("Failed to fetch job metadata"));
}
