//! Copy engine
//!
//! Directory and single-file copies used by every backup and restore branch.
//! Destination files are always overwritten; there is no conflict detection.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{UserDataError, UserDataResult};

/// Browser per-profile storage caches; never copied
const CACHE_STORAGE_PATTERN: &str = r"(?i)Firefox[\\/]Profiles[\\/].*[\\/]storage[\\/]default";

fn cache_storage_regex() -> &'static Regex {
    static CACHE: OnceLock<Regex> = OnceLock::new();
    CACHE.get_or_init(|| Regex::new(CACHE_STORAGE_PATTERN).expect("cache pattern is valid"))
}

/// Whether a path is inside a browser cache-storage directory
pub fn is_cache_storage(path: &Path) -> bool {
    cache_storage_regex().is_match(&path.to_string_lossy())
}

/// File-name filter applied at every directory level
#[derive(Debug, Clone, Default)]
pub struct CopyFilter {
    include: Option<GlobMatcher>,
    exclude: Option<Regex>,
}

impl CopyFilter {
    /// Accept every file
    pub fn all() -> Self {
        Self::default()
    }

    /// Only copy files whose name matches a glob such as `*.spelling`
    pub fn include(glob: &str) -> UserDataResult<Self> {
        Self::all().with_include(glob)
    }

    /// Skip files whose name matches a regex such as `\.com$`
    pub fn exclude(pattern: &str) -> UserDataResult<Self> {
        Self::all().with_exclude(pattern)
    }

    pub fn with_include(mut self, glob: &str) -> UserDataResult<Self> {
        let matcher = GlobBuilder::new(glob)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| UserDataError::Config(format!("Invalid include glob '{}': {}", glob, e)))?
            .compile_matcher();
        self.include = Some(matcher);
        Ok(self)
    }

    pub fn with_exclude(mut self, pattern: &str) -> UserDataResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            UserDataError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
        })?;
        self.exclude = Some(regex);
        Ok(self)
    }

    /// Whether a file with this name should be copied
    pub fn accepts(&self, file_name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(file_name) {
                return false;
            }
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(file_name),
            None => true,
        }
    }
}

/// Copy the files of `source` into `destination`
///
/// Only the top level is copied unless `recursive`; subdirectories are created
/// on demand. Cache-storage directories are skipped at every level, and a
/// `source` that is itself cache storage copies nothing.
///
/// Returns the number of files copied.
pub fn copy_directory(
    source: &Path,
    destination: &Path,
    filter: &CopyFilter,
    recursive: bool,
) -> UserDataResult<usize> {
    if is_cache_storage(source) {
        debug!(source = %source.display(), "skipping cache storage");
        return Ok(0);
    }
    if !source.is_dir() {
        return Err(UserDataError::source_not_found(source));
    }

    fs::create_dir_all(destination).map_err(|e| {
        UserDataError::io(format!("Failed to create {}", destination.display()), e)
    })?;

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(source)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_cache_storage(e.path())));

    let mut copied = 0;
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(source, e))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| UserDataError::Io(format!("Unexpected path outside source: {}", e)))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                UserDataError::io(format!("Failed to create {}", target.display()), e)
            })?;
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        if !filter.accepts(&entry.file_name().to_string_lossy()) {
            continue;
        }

        fs::copy(entry.path(), &target).map_err(|e| {
            UserDataError::io(format!("Failed to copy {}", entry.path().display()), e)
        })?;
        copied += 1;
    }

    debug!(
        source = %source.display(),
        destination = %destination.display(),
        copied,
        "copied directory"
    );
    Ok(copied)
}

/// Copy one file into a folder, creating the folder if absent
///
/// Returns the path of the copy.
pub fn copy_file(source: &Path, destination_folder: &Path) -> UserDataResult<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| UserDataError::source_not_found(source))?;
    let target = destination_folder.join(file_name);
    copy_file_to(source, &target)?;
    Ok(target)
}

/// Copy one file to an exact destination path, creating its parent
pub fn copy_file_to(source: &Path, destination: &Path) -> UserDataResult<()> {
    if !source.is_file() {
        return Err(UserDataError::source_not_found(source));
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            UserDataError::io(format!("Failed to create {}", parent.display()), e)
        })?;
    }
    fs::copy(source, destination)
        .map_err(|e| UserDataError::io(format!("Failed to copy {}", source.display()), e))?;
    Ok(())
}

fn walk_error(source: &Path, err: walkdir::Error) -> UserDataError {
    let context = format!(
        "Failed to read {}",
        err.path().unwrap_or(source).display()
    );
    match err.into_io_error() {
        Some(io_err) => UserDataError::io(context, io_err),
        None => UserDataError::Io(format!("{}: filesystem loop", context)),
    }
}
