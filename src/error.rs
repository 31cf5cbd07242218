//! Custom error types for userdata-backup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.
//!
//! Only hard failures live here. Per-target restore outcomes are modelled by
//! [`crate::models::RestoreResult`], and path-check/termination failures degrade to
//! values instead of errors.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Windows `ERROR_SHARING_VIOLATION`
const WIN_SHARING_VIOLATION: i32 = 32;
/// Windows `ERROR_LOCK_VIOLATION`
const WIN_LOCK_VIOLATION: i32 = 33;
/// POSIX `EBUSY`
const POSIX_EBUSY: i32 = 16;
/// POSIX `ETXTBSY`
const POSIX_ETXTBSY: i32 = 26;

/// The main error type for userdata-backup operations
#[derive(Error, Debug)]
pub enum UserDataError {
    /// Configuration-related errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A file is held open by another process
    #[error("File in use: {0}")]
    Contention(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for target definitions
    #[error("Validation error: {0}")]
    Validation(String),

    /// Copy source does not exist
    #[error("Source not found: {0}")]
    SourceNotFound(String),

    /// Bookmark parse or merge failure
    #[error("Merge error: {0}")]
    Merge(String),

    /// Restore was requested but there is nothing under the backup root
    #[error("Backup root does not exist: {0}")]
    BackupRootMissing(String),

    /// Two targets share the same application kind
    #[error("Duplicate target: {0}")]
    DuplicateTarget(String),
}

impl UserDataError {
    /// Wrap an I/O error with context, keeping contention distinguishable
    pub fn io(context: impl std::fmt::Display, err: io::Error) -> Self {
        let message = format!("{}: {}", context, err);
        if is_contention_error(&err) {
            Self::Contention(message)
        } else if err.kind() == io::ErrorKind::NotFound {
            Self::SourceNotFound(message)
        } else {
            Self::Io(message)
        }
    }

    /// Create a "source not found" error for a path
    pub fn source_not_found(path: &Path) -> Self {
        Self::SourceNotFound(path.display().to_string())
    }

    /// Check if this is a file-contention error
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::Contention(_))
    }

    /// Check if this is a "source not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound(_))
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Whether an I/O error means another process holds the file
pub fn is_contention_error(err: &io::Error) -> bool {
    match err.raw_os_error() {
        Some(code) if cfg!(windows) => code == WIN_SHARING_VIOLATION || code == WIN_LOCK_VIOLATION,
        Some(code) => code == POSIX_EBUSY || code == POSIX_ETXTBSY,
        None => false,
    }
}

// Implement From traits for common error types

impl From<io::Error> for UserDataError {
    fn from(err: io::Error) -> Self {
        if is_contention_error(&err) {
            Self::Contention(err.to_string())
        } else {
            Self::Io(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UserDataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for userdata-backup operations
pub type UserDataResult<T> = Result<T, UserDataError>;
