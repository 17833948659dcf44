//! `.gitignore` maintenance.
//!
//! Plaintext secret files must never be committed. Encrypt appends anchored
//! entries for new plaintexts; doctor checks coverage with a small matcher
//! that follows git's rules for the common cases (negation, anchoring,
//! directory-only entries, last match wins).

use std::fs;
use std::io;
use std::path::Path;

use crate::core::pattern::Pattern;
use crate::error::Result;

/// Comment line introducing entries written by cellar.
pub const HEADER: &str = "# cellar: plaintext secrets";

/// Entries written at init.
pub const INIT_ENTRIES: &[&str] = &[".cellar-tmp.*"];

/// Read a `.gitignore`, treating a missing file as empty.
pub fn read(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Anchored entry for a root-relative path.
pub fn entry_for(relative: &str) -> String {
    format!("/{}", relative.trim_start_matches('/'))
}

/// Append missing entries; `None` when nothing changes.
pub fn with_entries<S: AsRef<str>>(existing: &str, entries: &[S]) -> Option<String> {
    let missing: Vec<&str> = entries
        .iter()
        .map(AsRef::as_ref)
        .filter(|e| !existing.lines().any(|l| l.trim() == *e))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let mut updated = existing.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    if !existing.lines().any(|l| l.trim() == HEADER) {
        if !updated.is_empty() {
            updated.push('\n');
        }
        updated.push_str(HEADER);
        updated.push('\n');
    }
    for entry in missing {
        updated.push_str(entry);
        updated.push('\n');
    }
    Some(updated)
}

struct Rule {
    pattern: Pattern,
    negate: bool,
    dir_only: bool,
}

fn parse_rules(contents: &str) -> Vec<Rule> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (negate, line) = match line.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let dir_only = line.ends_with('/');
            let line = line.trim_end_matches('/');
            let anchored = line.starts_with('/') || line.contains('/');
            let glob = if anchored {
                line.trim_start_matches('/').to_string()
            } else {
                format!("**/{line}")
            };
            Pattern::new(&glob).ok().map(|pattern| Rule {
                pattern,
                negate,
                dir_only,
            })
        })
        .collect()
}

/// Whether a root-relative file path is ignored by `contents`.
pub fn is_ignored(contents: &str, relative: &Path) -> bool {
    let rules = parse_rules(contents);

    // A file under an ignored directory stays ignored regardless of later rules.
    let mut ancestor = relative.parent();
    let mut dirs = Vec::new();
    while let Some(dir) = ancestor.filter(|d| !d.as_os_str().is_empty()) {
        dirs.push(dir);
        ancestor = dir.parent();
    }
    for dir in dirs.into_iter().rev() {
        if matches_last(&rules, dir, true) == Some(true) {
            return true;
        }
    }

    matches_last(&rules, relative, false).unwrap_or(false)
}

/// Outcome of the last matching rule: `Some(true)` ignored, `Some(false)` re-included.
fn matches_last(rules: &[Rule], path: &Path, is_dir: bool) -> Option<bool> {
    rules
        .iter()
        .rev()
        .find(|r| (is_dir || !r.dir_only) && r.pattern.matches(path))
        .map(|r| !r.negate)
}
