//! Core data models for userdata-backup
//!
//! This module contains the target definitions and the per-pass outcome
//! types used by the backup and restore engines.

pub mod result;
pub mod target;

pub use result::{
    BackupEntry, BackupReport, BackupStatus, RestoreReport, RestoreResult, TargetOutcome,
};
pub use target::{
    AsUTypeLayout, BackupTarget, ChromiumProfile, EditorLayout, FileSystemType, LiveLocator,
    TargetApp, TargetKind,
};
