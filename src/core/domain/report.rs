//! Per-file outcome of a batch encrypt or decrypt.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// One file that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    #[serde(serialize_with = "kind_name")]
    pub kind: ErrorKind,
    pub reason: String,
}

fn kind_name<S: serde::Serializer>(kind: &ErrorKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{kind:?}"))
}

/// Outcome of processing a set of files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Files written
    pub succeeded: Vec<PathBuf>,
    /// Files already up to date
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    pub fn record_failure(&mut self, path: PathBuf, error: &Error) {
        self.failed.push(FileFailure {
            path,
            kind: error.kind(),
            reason: error.to_string(),
        });
    }

    /// Whether every file succeeded or was already current.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.unchanged.len() + self.failed.len()
    }
}
