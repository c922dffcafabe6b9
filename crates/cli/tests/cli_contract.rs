use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures").join(name)
}

fn stdout_json(args: &[&str], file: PathBuf) -> Value {
    let output = cargo_bin_cmd!("inkpage-cli")
        .args(args)
        .arg(file)
        .env_remove("INKPAGE_USER_ID")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

#[test]
fn validate_emits_stable_json_contract() {
    let mut value = stdout_json(&["validate"], fixture("sample-annotations.json"));
    value["path"] = Value::String("<FIXTURE>".to_owned());

    assert_eq!(
        value,
        serde_json::json!({ "path": "<FIXTURE>", "annotations": 3, "pages": 2 })
    );
}

#[test]
fn stats_counts_pages_and_types() {
    let value = stdout_json(&["stats"], fixture("sample-annotations.json"));

    assert_eq!(value["total"], 3);
    assert_eq!(value["pages"], serde_json::json!({ "1": 2, "2": 1 }));
    assert_eq!(
        value["types"],
        serde_json::json!({ "freehand": 1, "rectangle": 1, "stickyNote": 1 })
    );
}

#[test]
fn normalize_to_stdout_round_trips() {
    let value = stdout_json(&["normalize"], fixture("sample-annotations.json"));

    let original: Value = serde_json::from_str(
        &std::fs::read_to_string(fixture("sample-annotations.json")).unwrap(),
    )
    .unwrap();
    let entries = value.as_array().expect("normalized output should be an array");
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2]["text"], original[2]["text"]);
    assert_eq!(entries[1]["points"][0]["x"], 10.5);
    assert_eq!(entries[0]["timestamp"], 1_700_000_000_000u64);
    assert!(entries.iter().all(|entry| entry.get("selected").is_none()));
}

#[test]
fn normalize_writes_output_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let output_path = temp.path().join("out").join("normalized.json");

    cargo_bin_cmd!("inkpage-cli")
        .arg("normalize")
        .arg(fixture("sample-annotations.json"))
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("normalized.json"));

    assert!(output_path.exists(), "normalized file should exist");

    // Canonical form is a fixed point
    let first = std::fs::read_to_string(&output_path).unwrap();
    let again = temp.path().join("again.json");
    cargo_bin_cmd!("inkpage-cli")
        .arg("normalize")
        .arg(&output_path)
        .arg("--output")
        .arg(&again)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&again).unwrap(), first);
}

#[test]
fn explicit_config_file_is_used() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let config_path = temp.path().join("config.json");
    std::fs::write(&config_path, r#"{ "user_id": "ci", "history_limit": 5 }"#).unwrap();

    cargo_bin_cmd!("inkpage-cli")
        .arg("--config")
        .arg(&config_path)
        .arg("validate")
        .arg(fixture("sample-annotations.json"))
        .assert()
        .success();
}

#[test]
fn broken_config_file_fails() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let config_path = temp.path().join("config.json");
    std::fs::write(&config_path, r#"{ "paste_offset": 0 }"#).unwrap();

    cargo_bin_cmd!("inkpage-cli")
        .arg("validate")
        .arg(fixture("sample-annotations.json"))
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn validate_fails_for_missing_file() {
    cargo_bin_cmd!("inkpage-cli")
        .arg("validate")
        .arg(fixture("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn validate_fails_for_unknown_type() {
    cargo_bin_cmd!("inkpage-cli")
        .arg("validate")
        .arg(fixture("unknown-type.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid annotation file"))
        .stderr(predicate::str::contains("entry 0"));
}

#[test]
fn validate_fails_for_non_json() {
    cargo_bin_cmd!("inkpage-cli")
        .arg("validate")
        .arg(fixture("not-json.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("inkpage-cli")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
