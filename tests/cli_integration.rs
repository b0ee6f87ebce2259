//! Purpose: End-to-end tests for the `celerite` binary.
//! Exports: None (integration test module).
//! Role: Validate stdout/stderr JSON contracts and exit codes.
//! Invariants: Storage commands run against a temp data directory.

use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn celerite() -> Command {
    Command::new(env!("CARGO_BIN_EXE_celerite"))
}

fn run_in(dir: &TempDir, args: &[&str]) -> Output {
    celerite()
        .arg("--dir")
        .arg(dir.path())
        .args(args)
        .output()
        .expect("run binary")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout json")
}

#[test]
fn token_prints_requested_length() {
    let output = celerite()
        .args(["token", "--length", "12"])
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let token = String::from_utf8(output.stdout).expect("utf8");
    let token = token.trim();
    assert_eq!(token.len(), 12);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn put_then_get_round_trips_through_binary() {
    let dir = TempDir::new().expect("tempdir");

    let put = run_in(&dir, &["put", "app", "settings", "theme", "\"dark\""]);
    let put_json = stdout_json(&put);
    assert_eq!(put_json["put"]["key"], Value::String("theme".into()));

    let get = run_in(&dir, &["get", "app", "settings", "theme"]);
    let get_json = stdout_json(&get);
    assert_eq!(get_json["found"], Value::Bool(true));
    assert_eq!(get_json["value"], Value::String("dark".into()));
}

#[test]
fn non_json_values_are_stored_as_strings() {
    let dir = TempDir::new().expect("tempdir");

    run_in(&dir, &["put", "app", "settings", "motd", "hello world"]);
    let get = run_in(&dir, &["get", "app", "settings", "motd"]);
    let get_json = stdout_json(&get);
    assert_eq!(get_json["value"], Value::String("hello world".into()));
}

#[test]
fn get_missing_key_reports_not_found() {
    let dir = TempDir::new().expect("tempdir");

    let get = run_in(&dir, &["get", "app", "settings", "absent"]);
    let get_json = stdout_json(&get);
    assert_eq!(get_json["found"], Value::Bool(false));
    assert_eq!(get_json["value"], Value::Null);
}

#[test]
fn query_lists_all_parameters() {
    let dir = TempDir::new().expect("tempdir");

    let output = run_in(&dir, &["query", "https://a.example/page?x=1&y=two"]);
    let json = stdout_json(&output);
    assert_eq!(json["params"]["x"], Value::String("1".into()));
    assert_eq!(json["params"]["y"], Value::String("two".into()));
}

#[test]
fn query_extracts_named_parameter() {
    let dir = TempDir::new().expect("tempdir");

    let output = run_in(&dir, &["query", "https://a.example/page?x=1&y=two", "y"]);
    let json = stdout_json(&output);
    assert_eq!(json["value"], Value::String("two".into()));
}

#[test]
fn query_missing_parameter_is_null() {
    let dir = TempDir::new().expect("tempdir");

    let output = run_in(&dir, &["query", "https://a.example/page?x=1", "z"]);
    let json = stdout_json(&output);
    assert_eq!(json["value"], Value::Null);
}

#[test]
fn invalid_database_name_is_a_usage_error() {
    let dir = TempDir::new().expect("tempdir");

    let output = run_in(&dir, &["get", "foo/bar", "settings", "k"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));

    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(err["error"]["kind"], Value::String("Usage".into()));
}

#[test]
fn invalid_url_is_a_usage_error() {
    let dir = TempDir::new().expect("tempdir");

    let output = run_in(&dir, &["query", "not a url"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));

    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr json");
    assert_eq!(err["error"]["kind"], Value::String("Usage".into()));
}
