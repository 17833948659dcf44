//! Test support utilities for cellar integration tests.
//!
//! Provides isolated project and home directories and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test environment: one project directory shared by two machines.
///
/// `home` belongs to Alice, `peer` to Bob. No process-global state is
/// mutated; child processes get their own HOME and `.current_dir()`, so
/// tests can run in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
    /// Alice's home directory
    pub home: TempDir,
    /// Bob's home directory
    pub peer: TempDir,
}

impl Test {
    /// Create a new empty test environment with both user configs written.
    pub fn new() -> Self {
        let t = Self {
            dir: TempDir::new().expect("failed to create temp dir"),
            home: TempDir::new().expect("failed to create temp home"),
            peer: TempDir::new().expect("failed to create peer home"),
        };
        write_user(t.home.path(), &ALICE);
        write_user(t.peer.path(), &BOB);
        t
    }

    /// Create a test environment with the store initialized.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t.init_cmd("demo");
        assert_success(&output);
        t
    }

    /// Initialized store where Alice has bootstrapped access.
    ///
    /// Returns the environment and Alice's device id.
    pub fn bootstrapped() -> (Self, String) {
        let t = Self::init();
        let alice = t.create(t.home.path());
        assert_success(&t.register(&alice));
        (t, alice)
    }

    /// Path inside the project.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a project file, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent");
        }
        fs::write(path, contents).expect("failed to write file");
    }

    /// Read a project file.
    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).expect("failed to read file")
    }

    /// Device ids with a committed public key.
    pub fn public_keys(&self) -> Vec<String> {
        list(&self.path(".cellar/public_keys"))
    }

    /// Device ids with a committed wrapped key.
    pub fn wrapped_keys(&self) -> Vec<String> {
        list(&self.path(".cellar/secrets"))
    }
}

/// A user as recorded in `~/.cellar/config.toml`.
pub struct Person {
    pub id: &'static str,
    pub name: &'static str,
    pub email: &'static str,
}

fn write_user(home: &Path, person: &Person) {
    let dir = home.join(".cellar");
    fs::create_dir_all(&dir).expect("failed to create cellar home");
    let config = format!(
        "[user]\nid = \"{}\"\nname = \"{}\"\nemail = \"{}\"\n",
        person.id, person.name, person.email
    );
    fs::write(dir.join("config.toml"), config).expect("failed to write user config");
}

fn list(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.expect("failed to read entry").file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}
