//! Tests for `cellar status`, `doctor`, `clean` and `whoami`.

use std::fs;

use crate::support::*;

#[test]
fn test_status_reports_each_device() {
    let (t, alice) = Test::bootstrapped();
    let bob = t.create(t.peer.path());

    let status = t.status_json();
    assert_eq!(status["project"], "demo");
    assert_eq!(status["device"], alice.as_str());

    let devices = status["devices"].as_array().unwrap();
    let find = |id: &str| {
        devices
            .iter()
            .find(|d| d["id"] == id)
            .unwrap_or_else(|| panic!("device {id} missing"))
    };
    assert_eq!(find(&alice)["status"], "active");
    assert_eq!(find(&bob)["status"], "pending");
    assert_eq!(find(&bob)["email"], BOB.email);
}

#[test]
fn test_status_lists_secret_files() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");
    assert_success(&t.encrypt(&[".env"]));
    fs::remove_file(t.path(".env")).unwrap();

    let status = t.status_json();
    let files = status["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], ".env");
    assert_eq!(files[0]["plaintext"], false);
    assert_eq!(files[0]["ciphertext"], true);
}

#[test]
fn test_status_text_output() {
    let (t, _alice) = Test::bootstrapped();

    let output = t.cmd().arg("status").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "demo");
    assert_stdout_contains(&output, "Devices");
    assert_stdout_contains(&output, "active");
}

#[test]
fn test_doctor_healthy_project_exits_zero() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");
    assert_success(&t.encrypt(&[".env"]));

    let output = t.doctor();
    assert_success(&output);
    assert_stdout_contains(&output, "0 error(s)");
}

#[test]
fn test_doctor_without_store_exits_one() {
    let t = Test::new();

    let output = t.doctor();
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert_stdout_contains(&output, "not initialized");
}

#[test]
fn test_doctor_json() {
    let (t, _alice) = Test::bootstrapped();

    let output = t.cmd().args(["doctor", "--json"]).output().unwrap();
    assert_success(&output);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let checks = report["checks"].as_array().unwrap();
    assert!(!checks.is_empty());
    assert!(checks.iter().all(|c| c["severity"] != "error"));
}

#[cfg(unix)]
#[test]
fn test_doctor_flags_loose_key_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let (t, _alice) = Test::bootstrapped();
    let keys = t.home.path().join(".cellar/keys");
    let project = fs::read_dir(&keys).unwrap().next().unwrap().unwrap().path();
    let key = project.join("identity.key");
    fs::set_permissions(&key, fs::Permissions::from_mode(0o644)).unwrap();

    let output = t.doctor();
    assert_failure(&output);
    assert_stdout_contains(&output, "permissions");
}

#[test]
fn test_clean_removes_only_orphans() {
    let (t, alice) = Test::bootstrapped();
    let bob = t.create(t.peer.path());
    let wrapped = t.read(&format!(".cellar/secrets/{alice}"));
    fs::write(t.path(".cellar/secrets/ghost"), &wrapped).unwrap();

    let output = t.cmd().args(["clean", "--force"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "removed 1 orphaned");

    assert_eq!(t.wrapped_keys(), vec![alice.clone()]);
    let mut public = vec![alice, bob];
    public.sort();
    assert_eq!(t.public_keys(), public, "pending devices are untouched");
}

#[test]
fn test_clean_with_nothing_to_do() {
    let (t, _alice) = Test::bootstrapped();

    let output = t.cmd().arg("clean").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "no orphaned wrapped keys");
}

#[test]
fn test_whoami_shows_user_and_device() {
    let (t, alice) = Test::bootstrapped();

    let output = t.cmd().arg("whoami").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, ALICE.email);
    assert_stdout_contains(&output, &alice);
    assert_stdout_contains(&output, "age1");
}

#[test]
fn test_whoami_outside_project() {
    let t = Test::new();

    let output = t.cmd().arg("whoami").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, ALICE.name);
}

#[test]
fn test_completions() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "cellar");
}
