//! Tests for `cellar init` and `cellar create`.

use std::fs;

use crate::support::*;

fn project_id(t: &Test) -> String {
    let registry = fs::read_to_string(t.path(".cellar/project.toml")).unwrap();
    let value: toml::Value = toml::from_str(&registry).unwrap();
    value["project"]["id"].as_str().unwrap().to_string()
}

#[test]
fn test_init_creates_registry_and_gitignore() {
    let t = Test::new();

    let output = t.init_cmd("demo");
    assert_success(&output);
    assert_stdout_contains(&output, "initialized");

    let registry = fs::read_to_string(t.path(".cellar/project.toml")).unwrap();
    assert!(registry.contains("name = \"demo\""));

    let gitignore = fs::read_to_string(t.path(".gitignore")).unwrap();
    assert!(gitignore.contains(".cellar-tmp.*"));
}

#[test]
fn test_init_keeps_existing_gitignore_lines() {
    let t = Test::new();
    t.write(".gitignore", "target/\n");

    assert_success(&t.init_cmd("demo"));

    let gitignore = fs::read_to_string(t.path(".gitignore")).unwrap();
    assert!(gitignore.starts_with("target/\n"));
    assert!(gitignore.contains(".cellar-tmp.*"));
}

#[test]
fn test_init_twice_fails() {
    let t = Test::init();

    let output = t.init_cmd("demo");
    assert_failure(&output);
    assert_stderr_contains(&output, "already initialized");
}

#[test]
fn test_create_commits_pending_public_key() {
    let t = Test::init();
    let device = t.create(t.home.path());

    assert_eq!(t.public_keys(), vec![device.clone()]);
    assert!(t.wrapped_keys().is_empty());

    let key_path = t
        .home
        .path()
        .join(".cellar/keys")
        .join(project_id(&t))
        .join("identity.key");
    assert!(key_path.exists(), "private key should be stored locally");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&key_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    let status = t.status_json();
    let devices = status["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["status"], "pending");
    assert_eq!(devices[0]["email"], ALICE.email);
}

#[test]
fn test_create_twice_requires_force() {
    let t = Test::init();
    let device = t.create(t.home.path());

    let output = t.cmd().arg("create").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");

    let output = t.cmd().args(["create", "--force"]).output().unwrap();
    assert_success(&output);
    assert_eq!(t.public_keys(), vec![device], "forced create reuses the device id");
}

#[test]
fn test_self_bootstrap_is_active_immediately() {
    let (t, alice) = Test::bootstrapped();

    assert_eq!(t.wrapped_keys(), vec![alice]);
    let status = t.status_json();
    assert_eq!(status["access"], true);
    assert_eq!(status["devices"][0]["status"], "active");
}

#[test]
fn test_init_then_dry_run_create_writes_nothing() {
    let t = Test::init();

    let output = t.cmd().args(["--dry-run", "create"]).output().unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "dry run");
    assert!(t.public_keys().is_empty());
    assert!(!t.home.path().join(".cellar/keys").join(project_id(&t)).exists());
}
