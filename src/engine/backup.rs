//! Backup orchestration
//!
//! Copies every actionable target into its folder under the backup root, in
//! registry order. A failing target is logged and recorded, and the pass moves
//! on to the next one.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::asutype::{self, PERSONALIZATION_GLOBS};
use crate::config::ProfilePaths;
use crate::error::{UserDataError, UserDataResult};
use crate::fsops::{self, CopyFilter};
use crate::models::{
    AsUTypeLayout, BackupReport, BackupStatus, BackupTarget, EditorLayout, FileSystemType,
    TargetKind,
};
use crate::process::ProcessGuard;
use crate::registry::TargetRegistry;

/// Native-messaging manifests in a Firefox profile
pub const FIREFOX_EXCLUDE: &str = r"\.com$";

/// Subfolder of a text editor's backup holding unsaved-buffer snapshots
pub const EDITOR_FILES_DIR: &str = "files";

/// Runs backup passes
pub struct BackupManager<'a> {
    paths: &'a ProfilePaths,
    guard: &'a dyn ProcessGuard,
}

impl<'a> BackupManager<'a> {
    pub fn new(paths: &'a ProfilePaths, guard: &'a dyn ProcessGuard) -> Self {
        Self { paths, guard }
    }

    /// Back up every target
    ///
    /// Only a missing backup root configuration is an error; per-target
    /// failures end up in the report.
    pub fn run(&self, registry: &TargetRegistry) -> UserDataResult<BackupReport> {
        let root = self.paths.require_backup_root()?;
        fsops::ensure_dir(root)?;

        let mut report = BackupReport::new();
        for target in registry {
            if !target.is_actionable() {
                debug!(name = %target.friendly_name, "live data not found; skipping");
                report.push(target, BackupStatus::Skipped);
                continue;
            }

            match self.backup_target(target, root) {
                Ok(()) => {
                    info!(name = %target.friendly_name, "backed up");
                    report.push(target, BackupStatus::Copied);
                }
                Err(e) => {
                    warn!(name = %target.friendly_name, error = %e, "backup failed");
                    report.push(target, BackupStatus::Failed(e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Back up one target that is known to exist
    pub fn backup_target(&self, target: &BackupTarget, root: &Path) -> UserDataResult<()> {
        let destination = root.join(&target.backup_folder);
        fsops::ensure_dir(&destination)?;

        let stopped = self.guard.terminate_all(&target.process_names);
        if !stopped.is_clean() {
            debug!(name = %target.friendly_name, "some processes are still running");
        }

        match &target.kind {
            TargetKind::Chrome(_) | TargetKind::Edge(_) => {
                fsops::copy_file(&target.live.path(), &destination)?;
            }
            TargetKind::Firefox => {
                let filter = CopyFilter::exclude(FIREFOX_EXCLUDE)?;
                fsops::copy_directory(&target.live.path(), &destination, &filter, true)?;
            }
            TargetKind::AsUType(layout) => self.backup_asutype(target, layout, &destination)?,
            TargetKind::TextEditor(layout) => backup_editor(target, layout, &destination)?,
            TargetKind::StickyNotes
            | TargetKind::OutlookSignatures
            | TargetKind::AutoDestinations
            | TargetKind::Generic { .. } => backup_generic(target, &destination)?,
        }
        Ok(())
    }

    fn backup_asutype(
        &self,
        target: &BackupTarget,
        layout: &AsUTypeLayout,
        destination: &Path,
    ) -> UserDataResult<()> {
        let live_dir = target.live.path();

        let data_dir = if layout.config_file.is_file() {
            let outcome =
                asutype::rewrite_config(&layout.config_file, self.paths.user_name(), &live_dir)?;
            debug!(
                renamed = outcome.renamed,
                lines = outcome.rewritten_lines,
                data_folder = %outcome.data_folder.display(),
                "rewrote personalization lists"
            );
            fsops::copy_file(&layout.config_file, destination)?;
            outcome.data_folder
        } else {
            warn!(
                config = %layout.config_file.display(),
                "AsUType config not found; backing up personalization files only"
            );
            live_dir
        };

        for glob in PERSONALIZATION_GLOBS {
            let filter = CopyFilter::include(glob)?;
            fsops::copy_directory(&data_dir, destination, &filter, false)?;
        }
        Ok(())
    }
}

/// Session file plus the unsaved-buffer snapshots; both copies always run
fn backup_editor(
    target: &BackupTarget,
    layout: &EditorLayout,
    destination: &Path,
) -> UserDataResult<()> {
    let session = fsops::copy_file(&target.live.path(), destination).map(|_| ());

    let snapshots = if layout.snapshot_dir.is_dir() {
        fsops::copy_directory(
            &layout.snapshot_dir,
            &destination.join(EDITOR_FILES_DIR),
            &CopyFilter::all(),
            false,
        )
        .map(|_| ())
    } else {
        debug!(name = %target.friendly_name, "no unsaved-buffer snapshots");
        Ok(())
    };

    session.and(snapshots)
}

fn backup_generic(target: &BackupTarget, destination: &Path) -> UserDataResult<()> {
    let live = target.live.path();
    match target.fs_type() {
        FileSystemType::File => fsops::copy_file(&live, destination).map(|_| ()),
        FileSystemType::Directory => fsops::copy_directory(
            &live,
            destination,
            &CopyFilter::all(),
            target.kind.backup_recursive(),
        )
        .map(|_| ()),
        FileSystemType::Unknown => Err(UserDataError::source_not_found(&live)),
    }
}
