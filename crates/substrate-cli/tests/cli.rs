//! End-to-end tests driving the compiled `substrate` binary, as opposed to
//! the unit tests colocated with each command module.

use assert_cmd::Command;
use predicates::prelude::*;

fn substrate() -> Command {
    Command::cargo_bin("substrate").unwrap()
}

#[test]
fn run_with_no_regions_completes_and_reports_zero_updates() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    substrate()
        .args(["--config", config_path.to_str().unwrap(), "run", "--steps", "5"])
        .assert()
        .success();
}

#[test]
fn run_connects_regions_and_saves_a_checkpoint_inspect_can_read() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let checkpoint_path = dir.path().join("run.bin");

    substrate()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "run",
            "--steps",
            "20",
            "--region",
            "a:4:0.5",
            "--region",
            "b:4:0.5",
            "--connect",
            "a:b:1.0:0.3:true",
            "--save-state",
            checkpoint_path.to_str().unwrap(),
            "--diagnostics",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("step=0"));

    substrate()
        .arg("inspect")
        .arg(&checkpoint_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("regions: 2"))
        .stdout(predicate::str::contains("neurons: 8"))
        .stdout(predicate::str::contains("region `a`: 4 neurons"))
        .stdout(predicate::str::contains("region `b`: 4 neurons"));
}

#[test]
fn run_rejects_connect_referencing_unknown_region() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    substrate()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "run",
            "--steps",
            "1",
            "--region",
            "a:2:0.5",
            "--connect",
            "a:ghost:1.0:0.3:true",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unknown region"));
}

#[test]
fn run_can_resume_from_a_saved_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let checkpoint_path = dir.path().join("resume.bin");

    substrate()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "run",
            "--steps",
            "10",
            "--region",
            "a:4:0.5",
            "--save-state",
            checkpoint_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    substrate()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "run",
            "--steps",
            "10",
            "--load-state",
            checkpoint_path.to_str().unwrap(),
            "--save-state",
            checkpoint_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    substrate()
        .arg("inspect")
        .arg(&checkpoint_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("step: 20"));
}

#[test]
fn config_init_then_show_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    substrate()
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success();

    substrate()
        .args(["config", "show"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[reward]"));
}

#[test]
fn inspect_rejects_a_nonexistent_checkpoint() {
    substrate()
        .arg("inspect")
        .arg("/nonexistent/path/does-not-exist.bin")
        .assert()
        .failure();
}
