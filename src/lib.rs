//! userdata-backup - per-user application data backup and restore
//!
//! This library backs up a fixed set of per-user application data (browser
//! bookmarks, sticky notes, mail signatures, text-expansion dictionaries,
//! editor sessions, jump lists) to a synced backup root, and restores it onto
//! a new machine. Restore merges Chromium bookmarks instead of overwriting
//! them, stops owning processes before touching live files, and retries once
//! when a file is still held open.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Base directory resolution and persisted settings
//! - `error`: Custom error types
//! - `models`: Targets and per-pass outcomes
//! - `registry`: The declarative target list
//! - `fsops`: Directory and file copy, filesystem probing, atomic writes
//! - `process`: Stopping processes that hold live data open
//! - `bookmarks`: Chromium bookmark merge
//! - `asutype`: AsUType config rewriting
//! - `engine`: Backup, restore and legacy migration passes
//! - `display` / `cli`: Terminal front end
//!
//! # Example
//!
//! ```rust,ignore
//! use userdata_backup::config::{ProfilePaths, Settings};
//! use userdata_backup::engine::BackupManager;
//! use userdata_backup::process::SystemProcessGuard;
//! use userdata_backup::registry::TargetRegistry;
//!
//! let paths = ProfilePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let paths = paths.apply_settings(&settings);
//! let registry = TargetRegistry::load(&paths, &settings)?;
//! let guard = SystemProcessGuard::new();
//! let report = BackupManager::new(&paths, &guard).run(&registry)?;
//! ```

pub mod asutype;
pub mod bookmarks;
pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod fsops;
pub mod models;
pub mod process;
pub mod registry;

pub use error::UserDataError;
