//! Tests for `cellar encrypt` and `cellar decrypt`.

use std::fs;

use crate::support::*;

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "KEY=value\n");

    assert_file_roundtrip(&t, ".env");
}

#[test]
fn test_roundtrip_binary_and_empty_files() {
    let (t, _alice) = Test::bootstrapped();
    fs::write(t.path("blob.bin"), [0u8, 159, 146, 150, 255, 0, 1]).unwrap();
    fs::write(t.path("empty.env"), b"").unwrap();
    t.write("unicode.env", "GREETING=héllo wörld ✓\n");

    assert_file_roundtrip(&t, "blob.bin");
    assert_file_roundtrip(&t, "empty.env");
    assert_file_roundtrip(&t, "unicode.env");
}

#[test]
fn test_ciphertext_does_not_contain_plaintext() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "API_KEY=sk-test-12345\n");
    assert_success(&t.encrypt(&[".env"]));

    let sealed = t.read(".env.enc");
    let needle = b"sk-test-12345";
    assert!(!sealed.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn test_glob_touches_only_matching_files() {
    let (t, _alice) = Test::bootstrapped();
    for (rel, contents) in STANDARD_SECRETS {
        t.write(rel, contents);
    }

    let output = t.encrypt(&["config/*.env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "encrypted 2 file(s)");

    assert!(t.path("config/prod.env.enc").exists());
    assert!(t.path("config/staging.env.enc").exists());
    assert!(!t.path(".env.enc").exists());
    assert_eq!(t.read(".env"), STANDARD_SECRETS[0].1.as_bytes());
}

#[test]
fn test_encrypt_tracks_and_ignores_plaintext() {
    let (t, _alice) = Test::bootstrapped();
    t.write("config/prod.env", "JWT_SECRET=x\n");
    assert_success(&t.encrypt(&["config/prod.env"]));

    let gitignore = fs::read_to_string(t.path(".gitignore")).unwrap();
    assert!(gitignore.contains("/config/prod.env"));
    assert!(!gitignore.contains("/config/prod.env.enc"));

    let registry = fs::read_to_string(t.path(".cellar/project.toml")).unwrap();
    assert!(registry.contains("config/prod.env"));
}

#[test]
fn test_encrypt_without_patterns_uses_tracked_files() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");
    t.write("notes.txt", "not a secret\n");
    assert_success(&t.encrypt(&[".env"]));

    t.write(".env", "A=2\n");
    let output = t.encrypt(&[]);
    assert_success(&output);
    assert_stdout_contains(&output, "encrypted 1 file(s)");
    assert!(!t.path("notes.txt.enc").exists());
}

#[test]
fn test_unchanged_file_is_not_rewritten() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");
    assert_success(&t.encrypt(&[".env"]));
    let first = t.read(".env.enc");

    let output = t.encrypt(&[".env"]);
    assert_success(&output);
    assert_stdout_contains(&output, "1 unchanged");
    assert_eq!(t.read(".env.enc"), first);
}

#[test]
fn test_decrypt_without_patterns_restores_everything() {
    let (t, _alice) = Test::bootstrapped();
    for (rel, contents) in STANDARD_SECRETS {
        t.write(rel, contents);
    }
    assert_success(&t.encrypt(&[".env", "config"]));
    for (rel, _) in STANDARD_SECRETS {
        fs::remove_file(t.path(rel)).unwrap();
    }

    assert_success(&t.decrypt(&[]));
    for (rel, contents) in STANDARD_SECRETS {
        assert_eq!(t.read(rel), contents.as_bytes());
    }
}

#[cfg(unix)]
#[test]
fn test_decrypted_files_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");
    assert_success(&t.encrypt(&[".env"]));
    fs::remove_file(t.path(".env")).unwrap();
    assert_success(&t.decrypt(&[".env.enc"]));

    let mode = fs::metadata(t.path(".env")).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn test_tampered_ciphertext_reports_failure() {
    let (t, _alice) = Test::bootstrapped();
    t.write("a.env", "A=1\n");
    t.write("b.env", "B=2\n");
    assert_success(&t.encrypt(&["a.env", "b.env"]));

    let mut sealed = t.read("a.env.enc");
    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;
    fs::write(t.path("a.env.enc"), sealed).unwrap();
    fs::remove_file(t.path("b.env")).unwrap();

    let output = t.decrypt(&[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "authentication failed");
    assert_eq!(t.read("b.env"), b"B=2\n", "other files are still decrypted");
}

#[test]
fn test_dry_run_encrypt_writes_nothing() {
    let (t, _alice) = Test::bootstrapped();
    t.write(".env", "A=1\n");

    let output = t.cmd().args(["--dry-run", "encrypt", ".env"]).output().unwrap();
    assert_success(&output);
    assert!(!t.path(".env.enc").exists());

    let gitignore = fs::read_to_string(t.path(".gitignore")).unwrap();
    assert!(!gitignore.contains("/.env"));
}

#[test]
fn test_encrypt_without_access_fails() {
    let (t, _alice) = Test::bootstrapped();
    t.create(t.peer.path());
    t.write(".env", "A=1\n");

    let output = t
        .peer_cmd()
        .args(["encrypt", ".env"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "no access");
    assert_stderr_contains(&output, "cellar register");
    assert!(!t.path(".env.enc").exists());
}
