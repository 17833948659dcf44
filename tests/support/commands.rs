//! Command helper methods for Test.

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

use super::Test;

impl Test {
    /// A cellar command run as Alice.
    pub fn cmd(&self) -> Command {
        self.cmd_as(self.home.path())
    }

    /// A cellar command run as Bob.
    pub fn peer_cmd(&self) -> Command {
        self.cmd_as(self.peer.path())
    }

    /// A cellar command with HOME pointing at `home`.
    ///
    /// USERPROFILE is set too for Windows. Colors are off so output can be
    /// matched as plain text.
    pub fn cmd_as(&self, home: &Path) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("cellar").expect("failed to find cellar binary");
        cmd.env("HOME", home);
        cmd.env("USERPROFILE", home);
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("CELLAR_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `cellar init --name`.
    pub fn init_cmd(&self, name: &str) -> Output {
        self.cmd()
            .args(["init", "--name", name])
            .output()
            .expect("failed to run cellar init")
    }

    /// Run `cellar create` with the given home and return the new device id.
    pub fn create(&self, home: &Path) -> String {
        let before = self.public_keys();
        let output = self
            .cmd_as(home)
            .args(["create", "--name", "laptop"])
            .output()
            .expect("failed to run cellar create");
        super::assert_success(&output);
        self.public_keys()
            .into_iter()
            .find(|id| !before.contains(id))
            .expect("create should commit a new public key")
    }

    /// Shortcut for `cellar register <device>` as Alice.
    pub fn register(&self, device: &str) -> Output {
        self.cmd()
            .args(["register", device])
            .output()
            .expect("failed to run cellar register")
    }

    /// Shortcut for `cellar encrypt [patterns]` as Alice.
    pub fn encrypt(&self, patterns: &[&str]) -> Output {
        self.cmd()
            .arg("encrypt")
            .args(patterns)
            .output()
            .expect("failed to run cellar encrypt")
    }

    /// Shortcut for `cellar decrypt [patterns]` as Alice.
    pub fn decrypt(&self, patterns: &[&str]) -> Output {
        self.cmd()
            .arg("decrypt")
            .args(patterns)
            .output()
            .expect("failed to run cellar decrypt")
    }

    /// Shortcut for `cellar decrypt [patterns]` as Bob.
    pub fn peer_decrypt(&self, patterns: &[&str]) -> Output {
        self.peer_cmd()
            .arg("decrypt")
            .args(patterns)
            .output()
            .expect("failed to run cellar decrypt")
    }

    /// Shortcut for `cellar revoke <device> --force` as Alice.
    pub fn revoke(&self, device: &str) -> Output {
        self.cmd()
            .args(["revoke", device, "--force"])
            .output()
            .expect("failed to run cellar revoke")
    }

    /// Shortcut for `cellar status --json` as Alice, parsed.
    pub fn status_json(&self) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["status", "--json"])
            .output()
            .expect("failed to run cellar status");
        super::assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("status --json should be valid JSON")
    }

    /// Shortcut for `cellar doctor`.
    pub fn doctor(&self) -> Output {
        self.cmd()
            .arg("doctor")
            .output()
            .expect("failed to run cellar doctor")
    }
}
