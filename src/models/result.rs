//! Per-pass outcomes
//!
//! Restore outcomes are a small state set kept in a map keyed by friendly
//! name, separate from the target definitions. Backup only records what
//! happened for the summary; its failures never change the pass outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::target::{BackupTarget, TargetApp};

/// Outcome of restoring one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RestoreResult {
    /// Initial state; never re-entered once left
    #[default]
    NotAttempted,
    /// Nothing to restore from
    NoBackupExists,
    /// The owning application has never run here
    NoNewProfile,
    /// Contention after one retry, merge failure or unexpected I/O error
    MergeFailed,
    RestoreComplete,
}

impl RestoreResult {
    /// Whether this outcome fails the whole pass
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::NoNewProfile | Self::MergeFailed)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotAttempted)
    }
}

impl fmt::Display for RestoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotAttempted => "Not attempted",
            Self::NoBackupExists => "No backup exists",
            Self::NoNewProfile => "No profile on this machine",
            Self::MergeFailed => "Failed",
            Self::RestoreComplete => "Restored",
        };
        write!(f, "{}", text)
    }
}

/// Restore outcome for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub friendly_name: String,
    pub app: TargetApp,
    pub result: RestoreResult,
}

/// Results of one restore pass
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub started_at: DateTime<Utc>,
    /// Whether a legacy layout was copied forward first
    pub migrated: bool,
    outcomes: Vec<TargetOutcome>,
}

impl RestoreReport {
    /// Start a report with every target `NotAttempted`
    pub fn new<'a>(targets: impl IntoIterator<Item = &'a BackupTarget>) -> Self {
        Self {
            started_at: Utc::now(),
            migrated: false,
            outcomes: targets
                .into_iter()
                .map(|t| TargetOutcome {
                    friendly_name: t.friendly_name.clone(),
                    app: t.app(),
                    result: RestoreResult::NotAttempted,
                })
                .collect(),
        }
    }

    /// Assign a target's terminal result
    ///
    /// Returns false and leaves the report untouched if the target is unknown,
    /// already has a result, or `result` is `NotAttempted`.
    pub fn record(&mut self, friendly_name: &str, result: RestoreResult) -> bool {
        if !result.is_terminal() {
            return false;
        }
        match self
            .outcomes
            .iter_mut()
            .find(|o| o.friendly_name == friendly_name)
        {
            Some(outcome) if !outcome.result.is_terminal() => {
                outcome.result = result;
                true
            }
            _ => false,
        }
    }

    pub fn result(&self, friendly_name: &str) -> Option<RestoreResult> {
        self.outcomes
            .iter()
            .find(|o| o.friendly_name == friendly_name)
            .map(|o| o.result)
    }

    pub fn outcomes(&self) -> &[TargetOutcome] {
        &self.outcomes
    }

    /// Aggregate outcome: fails iff any target is `NoNewProfile` or `MergeFailed`
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(|o| o.result.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_failure())
    }

    /// Whether some application has to be launched once before retrying
    pub fn needs_new_profile(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.result == RestoreResult::NoNewProfile)
    }

    pub fn count(&self, result: RestoreResult) -> usize {
        self.outcomes.iter().filter(|o| o.result == result).count()
    }
}

/// What a backup pass did with one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    Copied,
    /// Live data absent or target incomplete
    Skipped,
    /// Copy failed; logged and swallowed
    Failed(String),
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied => write!(f, "Backed up"),
            Self::Skipped => write!(f, "Skipped (not found)"),
            Self::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub friendly_name: String,
    pub app: TargetApp,
    pub status: BackupStatus,
}

/// Summary of one backup pass
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub started_at: DateTime<Utc>,
    pub entries: Vec<BackupEntry>,
}

impl BackupReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, target: &BackupTarget, status: BackupStatus) {
        self.entries.push(BackupEntry {
            friendly_name: target.friendly_name.clone(),
            app: target.app(),
            status,
        });
    }

    pub fn status(&self, friendly_name: &str) -> Option<&BackupStatus> {
        self.entries
            .iter()
            .find(|e| e.friendly_name == friendly_name)
            .map(|e| &e.status)
    }

    pub fn copied_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == BackupStatus::Copied)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, BackupStatus::Failed(_)))
            .count()
    }
}

impl Default for BackupReport {
    fn default() -> Self {
        Self::new()
    }
}
