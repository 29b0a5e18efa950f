//! CLI exit codes and output formats.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn tvilling() -> Command {
    Command::cargo_bin("tvilling").expect("binary builds")
}

fn write_file(directory: &Path, name: &str, contents: &str) {
    fs::write(directory.join(name), contents).expect("write source file");
}

fn clone_pair(directory: &TempDir) {
    let source = "func load() {\n    let path = locate()\n    let data = read(path)\n    store(data)\n}\n";
    write_file(directory.path(), "a.swift", source);
    write_file(directory.path(), "b.swift", source);
}

fn base_args(directory: &TempDir) -> Vec<String> {
    vec![
        directory.path().to_string_lossy().into_owned(),
        "--min-tokens".into(),
        "10".into(),
        "--min-lines".into(),
        "2".into(),
        "--cache-dir".into(),
        directory.path().join("cache").to_string_lossy().into_owned(),
    ]
}

#[test]
fn version_flag_prints_and_succeeds() {
    tvilling()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tvilling"));
}

#[test]
fn no_paths_is_a_configuration_error() {
    let directory = TempDir::new().expect("tempdir");

    tvilling()
        .current_dir(directory.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no paths"));
}

#[test]
fn missing_path_is_an_analysis_error() {
    let directory = TempDir::new().expect("tempdir");

    tvilling()
        .current_dir(directory.path())
        .arg("definitely-not-here/")
        .assert()
        .code(3);
}

#[test]
fn clean_sources_exit_zero() {
    let directory = TempDir::new().expect("tempdir");
    write_file(directory.path(), "only.swift", "func solo() {\n    run()\n}\n");

    tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No clones detected"));
}

#[test]
fn detected_clones_exit_one_with_text_report() {
    let directory = TempDir::new().expect("tempdir");
    clone_pair(&directory);

    tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("clone(s)"))
        .stdout(predicate::str::contains("a.swift"));
}

#[test]
fn json_format_emits_parsable_output() {
    let directory = TempDir::new().expect("tempdir");
    clone_pair(&directory);

    let output = tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .args(["--format", "json"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert!(value["summary"]["totalClones"].as_u64().unwrap_or(0) >= 1);
    assert_eq!(value["clones"][0]["id"], "clone-001");
}

#[test]
fn init_writes_a_starter_config_once() {
    let directory = TempDir::new().expect("tempdir");

    tvilling()
        .current_dir(directory.path())
        .arg("--init")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Created .tvilling.yml"));

    assert!(directory.path().join(".tvilling.yml").exists());

    tvilling()
        .current_dir(directory.path())
        .arg("--init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn baseline_generate_then_compare_suppresses_known_clones() {
    let directory = TempDir::new().expect("tempdir");
    clone_pair(&directory);

    let baseline = directory.path().join("baseline.json");
    let baseline_arg = baseline.to_string_lossy().into_owned();

    tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .args(["--baseline-generate", "--baseline", &baseline_arg])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Baseline generated"));

    assert!(baseline.exists());

    tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .args(["--baseline", &baseline_arg])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No clones detected"));
}

#[test]
fn out_of_range_thresholds_are_rejected() {
    let directory = TempDir::new().expect("tempdir");
    clone_pair(&directory);

    tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .args(["--type4-similarity", "10"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("type4_similarity"));
}

#[test]
fn ignore_structural_drops_type3_and_type4_groups() {
    let directory = TempDir::new().expect("tempdir");
    clone_pair(&directory);

    let output = tvilling()
        .current_dir(directory.path())
        .args(base_args(&directory))
        .args(["--format", "json", "--ignore-structural"])
        .output()
        .expect("run");

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");

    assert_eq!(value["summary"]["byType"]["type3"], 0);
    assert_eq!(value["summary"]["byType"]["type4"], 0);
}
