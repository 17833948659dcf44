//! Tests for `cellar revoke` and `cellar sync`.

use std::fs;

use crate::support::*;

/// Alice active, Bob registered, one secret encrypted.
fn team() -> (Test, String, String) {
    let (t, alice) = Test::bootstrapped();
    let bob = t.create(t.peer.path());
    assert_success(&t.register(&bob));
    t.write(".env", "KEY=value\n");
    assert_success(&t.encrypt(&[".env"]));
    (t, alice, bob)
}

#[test]
fn test_revoke_removes_artifacts_and_rekeys() {
    let (t, alice, bob) = team();
    let before = t.read(".env.enc");
    let alice_wrapped = t.read(&format!(".cellar/secrets/{alice}"));

    let output = t.revoke(&bob);
    assert_success(&output);
    assert_stdout_contains(&output, "revoked");
    assert_stderr_contains(&output, "rotate the secret values");

    assert_eq!(t.public_keys(), vec![alice.clone()]);
    assert_eq!(t.wrapped_keys(), vec![alice.clone()]);
    assert_ne!(t.read(".env.enc"), before, "secrets are re-encrypted");
    assert_ne!(
        t.read(&format!(".cellar/secrets/{alice}")),
        alice_wrapped,
        "remaining devices get a new wrapped key"
    );

    let registry = fs::read_to_string(t.path(".cellar/project.toml")).unwrap();
    assert!(!registry.contains(&bob));
}

#[test]
fn test_revoked_device_cannot_decrypt_new_secrets() {
    let (t, _alice, bob) = team();
    assert_success(&t.revoke(&bob));

    t.write("new.env", "NEW=secret\n");
    assert_success(&t.encrypt(&["new.env"]));
    fs::remove_file(t.path("new.env")).unwrap();

    let output = t.peer_decrypt(&["new.env.enc"]);
    assert_failure(&output);
    assert!(!t.path("new.env").exists());
}

#[test]
fn test_revoke_by_user() {
    let (t, alice, _bob) = team();

    let output = t
        .cmd()
        .args(["revoke", "--user", BOB.email, "--force"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(t.public_keys(), vec![alice]);
}

#[test]
fn test_revoke_unknown_user_fails() {
    let (t, _alice, _bob) = team();

    let output = t
        .cmd()
        .args(["revoke", "--user", "nobody@example.com", "--force"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "user not found");
}

#[test]
fn test_revoke_last_device_is_refused() {
    let (t, alice) = Test::bootstrapped();
    t.write(".env", "KEY=value\n");
    assert_success(&t.encrypt(&[".env"]));

    let output = t.revoke(&alice);
    assert_failure(&output);
    assert_stderr_contains(&output, "last active device");
    assert_stderr_contains(&output, "--allow-lockout");
    assert_eq!(t.wrapped_keys(), vec![alice]);
}

#[test]
fn test_revoke_last_device_with_allow_lockout() {
    let (t, alice) = Test::bootstrapped();

    let output = t
        .cmd()
        .args(["revoke", &alice, "--force", "--allow-lockout"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "no device holds the project key");
    assert!(t.public_keys().is_empty());
    assert!(t.wrapped_keys().is_empty());
}

#[test]
fn test_revoke_without_terminal_is_declined() {
    let (t, _alice, bob) = team();
    let before = t.read(".env.enc");

    let output = t.cmd().args(["revoke", &bob]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "cancelled");
    assert!(t.public_keys().contains(&bob));
    assert_eq!(t.read(".env.enc"), before);
}

#[test]
fn test_revoke_needs_exactly_one_target() {
    let (t, _alice, bob) = team();

    let output = t
        .cmd()
        .args(["revoke", &bob, "--user", BOB.email, "--force"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "conflicting options");
}

#[test]
fn test_sync_rekeys_and_keeps_everyone() {
    let (t, alice, bob) = team();
    let before = t.read(".env.enc");

    let output = t.cmd().arg("sync").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "re-keyed");
    assert_ne!(t.read(".env.enc"), before);
    assert_eq!(t.wrapped_keys(), {
        let mut ids = vec![alice, bob];
        ids.sort();
        ids
    });

    fs::remove_file(t.path(".env")).unwrap();
    assert_success(&t.peer_decrypt(&[]));
    assert_eq!(t.read(".env"), b"KEY=value\n");
}
