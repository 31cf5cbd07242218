//! File I/O utilities with atomic writes
//!
//! Provides the existence check and safe single-file operations that won't
//! leave half-written files behind on failure.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{UserDataError, UserDataResult};
use crate::models::FileSystemType;

/// Inspect what a path is
///
/// Never fails: permission errors, malformed paths and missing files all
/// come back as `Unknown`.
pub fn inspect(path: &Path) -> FileSystemType {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => FileSystemType::Directory,
        Ok(meta) if meta.is_file() => FileSystemType::File,
        Ok(_) => FileSystemType::Unknown,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "path check degraded to absent");
            }
            FileSystemType::Unknown
        }
    }
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_atomic(path: &Path, data: &[u8]) -> UserDataResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            UserDataError::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }

    let temp_path = temp_path_for(path);

    let file = File::create(&temp_path)
        .map_err(|e| UserDataError::io(format!("Failed to create {}", temp_path.display()), e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(data)
        .map_err(|e| UserDataError::io("Failed to write data", e))?;

    writer
        .flush()
        .map_err(|e| UserDataError::io("Failed to flush data", e))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| UserDataError::io("Failed to sync data", e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        UserDataError::io(format!("Failed to replace {}", path.display()), e)
    })?;

    Ok(())
}

/// Remove a file, treating "already gone" as success
pub fn remove_file_if_exists(path: &Path) -> UserDataResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(UserDataError::io(
            format!("Failed to delete {}", path.display()),
            e,
        )),
    }
}

/// Create a directory and its parents
pub fn ensure_dir(path: &Path) -> UserDataResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| UserDataError::io(format!("Failed to create directory {}", path.display()), e))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
