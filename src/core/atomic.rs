//! Atomic file replacement.
//!
//! Writers never expose a half-written file: content goes to a hidden
//! temporary sibling, is flushed to disk, then renamed over the target.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Prefix of temporary files created by [`write`].
const TEMP_PREFIX: &str = ".cellar-tmp.";

/// Whether a file name belongs to an in-flight atomic write.
pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let tmp = format!(
        "{}{}.{}.{:08x}",
        TEMP_PREFIX,
        name.to_string_lossy(),
        std::process::id(),
        rand::random::<u32>()
    );
    Ok(path.with_file_name(tmp))
}

/// Atomically replace `path` with `contents`.
///
/// Parent directories are created. On Unix, `mode` sets the permissions of
/// the new file before any content is written.
pub fn write(path: &Path, contents: &[u8], mode: Option<u32>) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path)?;

    let result = (|| {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Remove a file, treating "already gone" as success.
pub fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
