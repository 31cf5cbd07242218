//! Restore orchestration
//!
//! Mirrors the backup pass: every target is copied from its backup folder
//! back to its live location and gets exactly one [`RestoreResult`].
//! Chromium bookmarks are merged into an existing live file instead of
//! overwriting it. Every step that mutates live data is retried once on file
//! contention.

use std::path::Path;

use tracing::{debug, info, warn};

use super::backup::EDITOR_FILES_DIR;
use super::migrate::migrate_legacy;
use super::retry::with_contention_retry;
use crate::asutype::{self, PERSONALIZATION_GLOBS};
use crate::bookmarks::BookmarkMerger;
use crate::config::ProfilePaths;
use crate::error::{UserDataError, UserDataResult};
use crate::fsops::{self, CopyFilter};
use crate::models::{
    AsUTypeLayout, BackupTarget, ChromiumProfile, EditorLayout, RestoreReport, RestoreResult,
    TargetKind,
};
use crate::process::ProcessGuard;
use crate::registry::TargetRegistry;

/// Runs restore passes
pub struct RestoreManager<'a> {
    paths: &'a ProfilePaths,
    guard: &'a dyn ProcessGuard,
    merger: &'a dyn BookmarkMerger,
}

impl<'a> RestoreManager<'a> {
    pub fn new(
        paths: &'a ProfilePaths,
        guard: &'a dyn ProcessGuard,
        merger: &'a dyn BookmarkMerger,
    ) -> Self {
        Self {
            paths,
            guard,
            merger,
        }
    }

    /// Restore every target
    ///
    /// When the backup root does not exist but a legacy root does, the legacy
    /// layout is migrated first. With neither present there is nothing to
    /// restore and [`UserDataError::BackupRootMissing`] is returned.
    pub fn run(&self, registry: &TargetRegistry) -> UserDataResult<RestoreReport> {
        let root = self.paths.require_backup_root()?;
        let mut report = RestoreReport::new(registry);

        if !root.is_dir() {
            let legacy = self
                .paths
                .legacy_root()
                .filter(|legacy| legacy.is_dir())
                .ok_or_else(|| UserDataError::BackupRootMissing(root.display().to_string()))?;

            info!(legacy = %legacy.display(), "backup root missing; migrating legacy backups");
            let migration = migrate_legacy(registry, legacy, root)?;
            if !migration.is_complete() {
                warn!(
                    failed = migration.failed.len(),
                    "legacy migration incomplete; restoring what was migrated"
                );
            }
            report.migrated = true;
        }

        for target in registry {
            let result = self.restore_target(target, root);
            match result {
                RestoreResult::RestoreComplete => info!(name = %target.friendly_name, "restored"),
                RestoreResult::NoBackupExists => {
                    debug!(name = %target.friendly_name, "no backup to restore")
                }
                other => {
                    warn!(name = %target.friendly_name, result = %other, "restore did not complete")
                }
            }
            report.record(&target.friendly_name, result);
        }

        Ok(report)
    }

    /// Restore one target from `root`
    pub fn restore_target(&self, target: &BackupTarget, root: &Path) -> RestoreResult {
        let backup_dir = root.join(&target.backup_folder);

        match &target.kind {
            TargetKind::Chrome(profile) | TargetKind::Edge(profile) => {
                self.restore_chromium(target, profile, &backup_dir)
            }
            TargetKind::Firefox => self.restore_firefox(target, &backup_dir),
            TargetKind::AsUType(layout) => self.restore_asutype(target, layout, &backup_dir),
            TargetKind::TextEditor(layout) => self.restore_editor(target, layout, &backup_dir),
            TargetKind::StickyNotes
            | TargetKind::OutlookSignatures
            | TargetKind::AutoDestinations
            | TargetKind::Generic { .. } => self.restore_generic(target, &backup_dir),
        }
    }

    /// Run a live-data mutation with the guard and the single retry
    fn mutate<F>(&self, target: &BackupTarget, step: F) -> RestoreResult
    where
        F: FnMut() -> UserDataResult<()>,
    {
        self.guard.terminate_all(&target.process_names);
        finish(
            target,
            with_contention_retry(self.guard, &target.process_names, step),
        )
    }

    fn restore_generic(&self, target: &BackupTarget, backup_dir: &Path) -> RestoreResult {
        let live = target.live.path();

        if let Some(file_name) = &target.live.file_name {
            let backup_file = backup_dir.join(file_name);
            if !backup_file.is_file() {
                return RestoreResult::NoBackupExists;
            }
            if let Err(result) = prepare_live(target) {
                return result;
            }
            return self.mutate(target, || fsops::copy_file_to(&backup_file, &live));
        }

        if !backup_dir.is_dir() {
            return RestoreResult::NoBackupExists;
        }
        if let Err(result) = prepare_live(target) {
            return result;
        }
        self.mutate(target, || {
            fsops::copy_directory(backup_dir, &live, &CopyFilter::all(), true).map(|_| ())
        })
    }

    fn restore_firefox(&self, target: &BackupTarget, backup_dir: &Path) -> RestoreResult {
        if !backup_dir.is_dir() {
            return RestoreResult::NoBackupExists;
        }
        let live = target.live.path();
        if let Err(e) = fsops::ensure_dir(&live) {
            return finish(target, Err(e));
        }
        self.mutate(target, || {
            fsops::copy_directory(backup_dir, &live, &CopyFilter::all(), true).map(|_| ())
        })
    }

    fn restore_chromium(
        &self,
        target: &BackupTarget,
        profile: &ChromiumProfile,
        backup_dir: &Path,
    ) -> RestoreResult {
        let live_file = target.live.path();
        let Some(file_name) = live_file.file_name() else {
            return finish(target, Err(UserDataError::source_not_found(&live_file)));
        };
        let backup_file = backup_dir.join(file_name);

        if !backup_file.is_file() {
            return RestoreResult::NoBackupExists;
        }
        if let Err(result) = prepare_live(target) {
            return result;
        }
        if !live_file.is_file() {
            return self.mutate(target, || fsops::copy_file_to(&backup_file, &live_file));
        }

        self.guard.terminate_all(&target.process_names);

        let merged = match self.merge_bookmarks(&live_file, &backup_file) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(name = %target.friendly_name, "bookmark merge reported failure");
                return RestoreResult::MergeFailed;
            }
            Err(e) => return finish(target, Err(e)),
        };

        let rollback_copy = profile
            .live_backup_file
            .as_ref()
            .map(|name| target.live.container().join(name));

        finish(
            target,
            with_contention_retry(self.guard, &target.process_names, || {
                fsops::write_atomic(&live_file, &merged)?;
                if let Some(path) = &rollback_copy {
                    fsops::remove_file_if_exists(path)?;
                }
                Ok(())
            }),
        )
    }

    /// Parse both trees and merge them once; `None` when the merge fails
    fn merge_bookmarks(&self, live: &Path, backup: &Path) -> UserDataResult<Option<Vec<u8>>> {
        let live_tree = self.merger.parse(live)?;
        let backup_tree = self.merger.parse(backup)?;
        let (merged, ok) = self.merger.merge(live_tree, backup_tree);
        if !ok {
            return Ok(None);
        }
        self.merger.serialize(&merged).map(Some)
    }

    fn restore_asutype(
        &self,
        target: &BackupTarget,
        layout: &AsUTypeLayout,
        backup_dir: &Path,
    ) -> RestoreResult {
        let Some(config_name) = layout.config_file.file_name() else {
            return finish(
                target,
                Err(UserDataError::source_not_found(&layout.config_file)),
            );
        };
        let backup_config = backup_dir.join(config_name);
        if !backup_config.is_file() {
            return RestoreResult::NoBackupExists;
        }
        if let Err(result) = prepare_live(target) {
            return result;
        }

        let filters = match PERSONALIZATION_GLOBS
            .iter()
            .map(|glob| CopyFilter::include(glob))
            .collect::<UserDataResult<Vec<_>>>()
        {
            Ok(filters) => filters,
            Err(e) => return finish(target, Err(e)),
        };
        let live_dir = target.live.path();
        let data_dir = match asutype::read_data_folder(&backup_config, &live_dir) {
            Ok(folder) => folder,
            Err(e) => {
                warn!(
                    name = %target.friendly_name,
                    error = %e,
                    "unreadable AsUType config; restoring lists into the live folder"
                );
                live_dir
            }
        };

        self.mutate(target, || {
            for filter in &filters {
                fsops::copy_directory(backup_dir, &data_dir, filter, false)?;
            }
            fsops::copy_file_to(&backup_config, &layout.config_file)
        })
    }

    fn restore_editor(
        &self,
        target: &BackupTarget,
        layout: &EditorLayout,
        backup_dir: &Path,
    ) -> RestoreResult {
        let live_session = target.live.path();
        let Some(session_name) = live_session.file_name() else {
            return finish(target, Err(UserDataError::source_not_found(&live_session)));
        };
        let backup_session = backup_dir.join(session_name);
        if !backup_session.is_file() {
            return RestoreResult::NoBackupExists;
        }
        if let Err(result) = prepare_live(target) {
            return result;
        }

        let snapshots = backup_dir.join(EDITOR_FILES_DIR);
        self.mutate(target, || {
            fsops::copy_file_to(&backup_session, &live_session)?;
            if snapshots.is_dir() {
                fsops::copy_directory(&snapshots, &layout.snapshot_dir, &CopyFilter::all(), false)?;
            } else {
                fsops::ensure_dir(&layout.snapshot_dir)?;
            }
            Ok(())
        })
    }
}

/// Make sure the live container exists before data is placed in it
///
/// A missing container means the application never ran here. That is a
/// `NoNewProfile` failure when the target requires it, and the container is
/// created otherwise.
fn prepare_live(target: &BackupTarget) -> Result<(), RestoreResult> {
    let container = target.live.container();
    if container.is_dir() {
        return Ok(());
    }
    if target.require_existing {
        return Err(RestoreResult::NoNewProfile);
    }
    fsops::ensure_dir(container).map_err(|e| finish(target, Err(e)))
}

fn finish(target: &BackupTarget, outcome: UserDataResult<()>) -> RestoreResult {
    match outcome {
        Ok(()) => RestoreResult::RestoreComplete,
        Err(e) => {
            warn!(name = %target.friendly_name, error = %e, "restore step failed");
            RestoreResult::MergeFailed
        }
    }
}
