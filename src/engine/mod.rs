//! Backup and restore engine
//!
//! Passes run strictly one target at a time on the calling thread. The engine
//! is handed its paths, process guard and bookmark merger explicitly and never
//! reads process-wide state.

pub mod backup;
pub mod migrate;
pub mod restore;
pub mod retry;

pub use backup::BackupManager;
pub use migrate::{migrate_legacy, MigrationReport};
pub use restore::RestoreManager;
pub use retry::with_contention_retry;
