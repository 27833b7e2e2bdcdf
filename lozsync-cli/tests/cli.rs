//! CLI surface tests — argument parsing and fail-fast configuration
//! errors. No network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("lozsync")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn run_without_settings_file_fails_with_context() {
    let dir = TempDir::new().expect("tempdir");
    Command::cargo_bin("lozsync")
        .expect("binary")
        .current_dir(dir.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("settings file not found"));
}

#[test]
fn scan_with_malformed_settings_fails_with_parse_context() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("lozsync.json"), "{not json").expect("write");
    Command::cargo_bin("lozsync")
        .expect("binary")
        .current_dir(dir.path())
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse settings"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    Command::cargo_bin("lozsync")
        .expect("binary")
        .arg("frobnicate")
        .assert()
        .failure();
}
