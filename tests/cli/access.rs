//! Tests for `cellar register` and `cellar rotate`.

use std::fs;

use crate::support::*;

#[test]
fn test_register_second_device_can_decrypt() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "KEY=value\n");
    assert_success(&t.encrypt(&[".env"]));

    let bob = t.create(t.peer.path());
    assert_success(&t.register(&bob));

    fs::remove_file(t.path(".env")).unwrap();
    assert_success(&t.peer_decrypt(&[]));
    assert_eq!(t.read(".env"), b"KEY=value\n");
}

#[test]
fn test_pending_device_cannot_register_itself() {
    let (t, _alice) = Test::bootstrapped();
    let bob = t.create(t.peer.path());

    let output = t.peer_cmd().args(["register", &bob]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "no access");
    assert!(!t.wrapped_keys().contains(&bob));
}

#[test]
fn test_register_by_user_email() {
    let (t, _alice) = Test::bootstrapped();
    let bob = t.create(t.peer.path());

    let output = t
        .cmd()
        .args(["register", "--user", BOB.email])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, &bob);
    assert!(t.wrapped_keys().contains(&bob));
}

#[test]
fn test_register_active_device_needs_force() {
    let (t, alice) = Test::bootstrapped();

    let output = t.register(&alice);
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");

    let output = t.cmd().args(["register", &alice, "--force"]).output().unwrap();
    assert_success(&output);
}

#[test]
fn test_register_key_file_adds_device() {
    let (t, alice) = Test::bootstrapped();
    t.write("carol.pub", &format!("{OUTSIDER_PUBLIC_KEY}\n"));

    let output = t
        .cmd()
        .args([
            "register",
            "--key-file",
            "carol.pub",
            "--email",
            "carol@example.com",
            "--name",
            "carol-laptop",
        ])
        .output()
        .unwrap();
    assert_success(&output);

    let public = t.public_keys();
    assert_eq!(public.len(), 2);
    let carol = public.iter().find(|id| **id != alice).unwrap();
    assert!(t.wrapped_keys().contains(carol));

    let registry = fs::read_to_string(t.path(".cellar/project.toml")).unwrap();
    assert!(registry.contains("carol@example.com"));
}

#[test]
fn test_register_key_file_rejects_invalid_key() {
    let (t, _alice) = Test::bootstrapped();
    t.write("bad.pub", INVALID_PUBLIC_KEY);

    let output = t
        .cmd()
        .args(["register", "--key-file", "bad.pub", "--email", "x@example.com"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid public key");
    assert_eq!(t.public_keys().len(), 1);
}

#[test]
fn test_rotate_keeps_access() {
    let (t, alice) = Test::bootstrapped();
    t.write(".env", "KEY=value\n");
    assert_success(&t.encrypt(&[".env"]));
    let old_public = fs::read(t.path(&format!(".cellar/public_keys/{alice}"))).unwrap();

    let output = t.cmd().args(["rotate", "--force"]).output().unwrap();
    assert_success(&output);

    let new_public = fs::read(t.path(&format!(".cellar/public_keys/{alice}"))).unwrap();
    assert_ne!(old_public, new_public);

    fs::remove_file(t.path(".env")).unwrap();
    assert_success(&t.decrypt(&[]));
    assert_eq!(t.read(".env"), b"KEY=value\n");
}

#[test]
fn test_rotate_without_terminal_is_declined() {
    let (t, _alice) = Test::bootstrapped();

    let output = t.cmd().arg("rotate").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "cancelled");
}
