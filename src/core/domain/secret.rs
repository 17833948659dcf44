//! Secret file type.
//!
//! A plaintext path and its `.enc` ciphertext sibling.

use std::path::{Path, PathBuf};

/// A secret file pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretFile {
    plaintext: PathBuf,
    ciphertext: PathBuf,
}

impl SecretFile {
    pub fn new(plaintext: PathBuf, ciphertext: PathBuf) -> Self {
        Self {
            plaintext,
            ciphertext,
        }
    }

    pub fn plaintext(&self) -> &Path {
        &self.plaintext
    }

    pub fn ciphertext(&self) -> &Path {
        &self.ciphertext
    }

    pub fn has_plaintext(&self) -> bool {
        self.plaintext.is_file()
    }

    pub fn has_ciphertext(&self) -> bool {
        self.ciphertext.is_file()
    }
}

impl std::fmt::Display for SecretFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.plaintext.display())
    }
}
