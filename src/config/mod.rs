//! Configuration module for userdata-backup
//!
//! This module provides configuration management including:
//! - Base directory resolution (roaming, local, public, backup root)
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::ProfilePaths;
pub use settings::Settings;
