//! Error rendering and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_commands_outside_store_suggest_init() {
    let t = Test::new();

    for args in [&["create"][..], &["sync"], &["encrypt"], &["status"]] {
        t.cmd()
            .args(args)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("not initialized"))
            .stderr(predicate::str::contains("run: cellar init"));
    }
}

#[test]
fn test_missing_file_is_reported() {
    let (t, _alice) = Test::bootstrapped();

    t.cmd()
        .args(["encrypt", "missing.env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn test_wrong_file_type_is_reported() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");
    t.write("stray.enc", "not really");

    t.cmd()
        .args(["encrypt", "stray.enc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a plaintext file"));

    t.cmd()
        .args(["decrypt", ".env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a ciphertext file"));
}

#[test]
fn test_pattern_escaping_the_project_is_rejected() {
    let (t, _alice) = Test::bootstrapped();

    t.cmd()
        .args(["encrypt", "../outside.env"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pattern"));
}

#[test]
fn test_register_without_target_conflicts() {
    let (t, _alice) = Test::bootstrapped();

    t.cmd()
        .arg("register")
        .assert()
        .failure()
        .stderr(predicate::str::contains("conflicting options"));
}

#[test]
fn test_invalid_registry_reports_location() {
    let t = Test::init();
    std::fs::write(t.path(".cellar/project.toml"), "[project\nname = 1\n").unwrap();

    t.cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"))
        .stderr(predicate::str::contains("project.toml:"));
}

#[test]
fn test_log_level_from_env() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");

    t.cmd()
        .env("CELLAR_LOG", "cellar=debug")
        .args(["encrypt", ".env"])
        .assert()
        .success()
        .stderr(predicate::str::contains("encrypting"));
}

#[test]
fn test_unknown_command_is_a_usage_error() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cellar").unwrap();
    cmd.arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
