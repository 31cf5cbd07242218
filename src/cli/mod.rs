//! CLI command handlers
//!
//! Bridges the clap front end with the engine. Listing targets and showing
//! the configuration are plain display calls and live in `main.rs`.

pub mod backup;
pub mod restore;

pub use backup::handle_backup_command;
pub use restore::handle_restore_command;
