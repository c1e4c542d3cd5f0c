//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use circuitbuilder::load_circuit;
use circuitbuilder::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

/// Build command for the circuitbuilder-cli binary (finds it in target/debug when run via cargo test).
fn circuitbuilder_cli() -> Command {
    cargo_bin_cmd!("circuitbuilder-cli")
}

/// Save a capacitor whose right terminal is grounded.
fn write_fixture(dir: &Path, name: &str, at: Point) -> PathBuf {
    let mut editor = CircuitEditor::new();
    editor.place(Placement::Element(ElementKind::Capacitor), at);
    editor.place(Placement::Ground, at + Point::new(100, 200));
    let right = editor.circuit().node_by_index(1).unwrap();
    editor.drag_and_drop(Entity::Node(right), at + Point::new(100, 200));
    editor.save(&dir.join(name)).unwrap()
}

#[test]
fn test_cli_help() {
    let mut cmd = circuitbuilder_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("circuit"));
}

#[test]
fn test_cli_version() {
    let mut cmd = circuitbuilder_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_inspect_human() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single", Point::ORIGIN);

    let mut cmd = circuitbuilder_cli();
    cmd.arg("inspect").arg(path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Elements:     1"))
        .stdout(predicate::str::contains("Grounds:      1"))
        .stdout(predicate::str::contains("Node indices: 1"));
}

#[test]
fn test_cli_inspect_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single", Point::ORIGIN);

    let mut cmd = circuitbuilder_cli();
    cmd.arg("inspect").arg(path).arg("--format").arg("json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["summary"]["total_files"], 1);
    assert_eq!(json["results"][0]["stats"]["element_count"], 1);
    assert_eq!(json["results"][0]["stats"]["node_count"], 1);
    assert_eq!(json["results"][0]["subcircuits"], 1);
}

#[test]
fn test_cli_inspect_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "a", Point::ORIGIN);
    write_fixture(dir.path(), "b", Point::new(0, 1000));

    let mut cmd = circuitbuilder_cli();
    cmd.arg("inspect").arg(dir.path()).arg("--format").arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"total_files\": 2"));
}

#[test]
fn test_cli_inspect_empty_directory_fails() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = circuitbuilder_cli();
    cmd.arg("inspect").arg(dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No .circuit files"));
}

#[test]
fn test_cli_export_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single", Point::ORIGIN);

    let mut cmd = circuitbuilder_cli();
    cmd.arg("export").arg(path);

    cmd.assert()
        .success()
        .stdout("branches:\n- [C, 0, 1, 0.02]\n");
}

#[test]
fn test_cli_export_to_file_appends_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single", Point::ORIGIN);

    let mut cmd = circuitbuilder_cli();
    cmd.arg("export").arg(path).arg("-o").arg(dir.path().join("listing"));

    cmd.assert().success();
    let text = std::fs::read_to_string(dir.path().join("listing.yml")).unwrap();
    assert!(text.starts_with("branches:\n"));
}

#[test]
fn test_cli_import() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_fixture(dir.path(), "base", Point::ORIGIN);
    let other = write_fixture(dir.path(), "other", Point::new(0, 1000));
    let out = dir.path().join("combined");

    let mut cmd = circuitbuilder_cli();
    cmd.arg("import").arg(&base).arg(&other).arg("-o").arg(&out);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 entities"));

    let combined = load_circuit(&dir.path().join("combined.circuit")).unwrap();
    assert_eq!(combined.stats().element_count, 2);
    assert_eq!(combined.stats().ground_count, 2);
}

#[test]
fn test_cli_corrupt_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.circuit");
    std::fs::write(&path, b"not a circuit").unwrap();

    let mut cmd = circuitbuilder_cli();
    cmd.arg("inspect").arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}

#[test]
fn test_cli_out_of_range_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single", Point::ORIGIN);
    let mut memento = load_circuit(&path).unwrap().memento();
    memento.connections[0].direction = Point::new(i32::MAX, 0);
    std::fs::write(&path, memento.to_bytes().unwrap()).unwrap();

    let mut cmd = circuitbuilder_cli();
    cmd.arg("export").arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("out of bounds"));
}

#[test]
fn test_cli_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single", Point::ORIGIN);
    let config = dir.path().join("options.json");
    std::fs::write(&config, "{ nope").unwrap();

    let mut cmd = circuitbuilder_cli();
    cmd.arg("--config").arg(&config).arg("inspect").arg(path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Config error"));
}

#[test]
fn test_cli_missing_file() {
    let mut cmd = circuitbuilder_cli();
    cmd.arg("export").arg("does-not-exist.circuit");

    cmd.assert().failure();
}
