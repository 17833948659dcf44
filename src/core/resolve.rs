//! File resolution.
//!
//! Turns user-supplied paths, directories and globs into a concrete,
//! de-duplicated set of files of one kind (plaintext or ciphertext).
//! A literal path or a narrow glob only ever yields what it names; nothing
//! here widens scope to the whole project.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::core::{atomic, constants};
use crate::core::pattern::Pattern;
use crate::error::{ResolveError, Result};

/// Which side of a secret file pair to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Plaintext,
    Ciphertext,
}

impl FileKind {
    /// Whether `path` is of this kind (by suffix).
    pub fn matches(&self, path: &Path) -> bool {
        let is_cipher = path
            .file_name()
            .map(|n| {
                let n = n.to_string_lossy();
                n.ends_with(constants::CIPHER_SUFFIX) && n.len() > constants::CIPHER_SUFFIX.len()
            })
            .unwrap_or(false);
        match self {
            FileKind::Ciphertext => is_cipher,
            FileKind::Plaintext => !is_cipher,
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Plaintext => "plaintext",
            FileKind::Ciphertext => "ciphertext",
        }
    }
}

/// Resolve patterns under `root` to files of `kind`.
///
/// Returned paths are `root` joined with a normalized relative path, sorted
/// and unique.
///
/// - No patterns: every file of `kind` under `root`.
/// - Existing directory: every file of `kind` below it.
/// - Glob: matching files of `kind`; no matches is an empty result.
/// - Literal: must exist and be of `kind`.
///
/// The store directory and `.git` are never walked.
///
/// # Errors
///
/// Returns `ResolveError::InvalidPattern`, `FileNotFound` or `WrongFileType`.
pub fn resolve(patterns: &[String], root: &Path, kind: FileKind) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    if patterns.is_empty() {
        debug!(kind = kind.label(), "discovering all files");
        walk(root, Path::new(""), kind, &mut found)?;
    }

    for pattern in patterns {
        let rel = relative_to_root(pattern, root)?;
        let before = found.len();

        if Pattern::is_glob(pattern) {
            let compiled = Pattern::new(&rel.to_string_lossy())?;
            let start = compiled.literal_prefix();
            let mut candidates = BTreeSet::new();
            if root.join(&start).is_dir() {
                walk(root, &start, kind, &mut candidates)?;
            }
            found.extend(candidates.into_iter().filter(|p| compiled.matches(p)));
        } else if root.join(&rel).is_dir() {
            walk(root, &rel, kind, &mut found)?;
        } else {
            let full = root.join(&rel);
            if !full.is_file() {
                return Err(ResolveError::FileNotFound(full).into());
            }
            if !kind.matches(&rel) {
                return Err(ResolveError::WrongFileType {
                    path: full,
                    expected: kind.label(),
                }
                .into());
            }
            found.insert(rel);
        }

        trace!(pattern = %pattern, matched = found.len() - before, "resolved pattern");
    }

    Ok(found.into_iter().map(|rel| root.join(rel)).collect())
}

/// Normalize a user pattern to a path relative to `root`.
fn relative_to_root(pattern: &str, root: &Path) -> Result<PathBuf> {
    let invalid = |reason: &str| ResolveError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if pattern.trim().is_empty() {
        return Err(invalid("pattern is empty").into());
    }

    let path = Path::new(pattern);
    let path = if path.is_absolute() {
        path.strip_prefix(root)
            .map_err(|_| invalid("path is outside the project root"))?
    } else {
        path
    };

    let mut rel = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !rel.pop() {
                    return Err(invalid("path is outside the project root").into());
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path is outside the project root").into());
            }
        }
    }

    if rel.starts_with(constants::STORE_DIR) {
        return Err(invalid("paths inside the store directory are managed by cellar").into());
    }

    Ok(rel)
}

/// Recursively collect root-relative files of `kind` below `root/dir`.
fn walk(root: &Path, dir: &Path, kind: FileKind, out: &mut BTreeSet<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(root.join(dir))? {
        let entry = entry?;
        let name = entry.file_name();
        let rel = dir.join(&name);
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if name == constants::STORE_DIR || name == constants::VCS_DIR {
                continue;
            }
            walk(root, &rel, kind, out)?;
        } else if atomic::is_temp_name(&name.to_string_lossy()) {
            continue;
        } else if (file_type.is_file() || entry.path().is_file()) && kind.matches(&rel) {
            out.insert(rel);
        }
    }
    Ok(())
}
