//! Legacy backup migration
//!
//! Older releases kept backups under a different root with some folders named
//! differently. When the current backup root does not exist yet, restore
//! copies each target's legacy folder forward first.

use std::path::Path;

use tracing::{info, warn};

use crate::error::UserDataResult;
use crate::fsops::{self, CopyFilter};
use crate::registry::TargetRegistry;

/// What a migration copied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Friendly names whose legacy folder was copied forward
    pub migrated: Vec<String>,
    /// Friendly names whose copy failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Copy every target's legacy folder into the current backup root
///
/// A failed folder is logged and recorded; the remaining targets are still
/// migrated. Only failing to create the backup root itself is an error.
pub fn migrate_legacy(
    registry: &TargetRegistry,
    legacy_root: &Path,
    backup_root: &Path,
) -> UserDataResult<MigrationReport> {
    fsops::ensure_dir(backup_root)?;

    let mut report = MigrationReport::default();
    let filter = CopyFilter::all();

    for target in registry {
        let source = legacy_root.join(target.legacy_folder_name());
        if !source.is_dir() {
            continue;
        }
        let destination = backup_root.join(&target.backup_folder);

        match fsops::copy_directory(&source, &destination, &filter, true) {
            Ok(copied) => {
                info!(name = %target.friendly_name, copied, "migrated legacy backup");
                report.migrated.push(target.friendly_name.clone());
            }
            Err(e) => {
                warn!(name = %target.friendly_name, error = %e, "legacy migration failed");
                report
                    .failed
                    .push((target.friendly_name.clone(), e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfilePaths;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_legacy_folder_names_are_mapped() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        let registry = TargetRegistry::builtin(&paths).unwrap();

        let legacy = temp_dir.path().join("OldBackup");
        fs::create_dir_all(legacy.join("Sticky Notes")).unwrap();
        fs::write(legacy.join("Sticky Notes").join("plum.sqlite"), "notes").unwrap();
        fs::create_dir_all(legacy.join("npp").join("files")).unwrap();
        fs::write(legacy.join("npp").join("session.xml"), "<s/>").unwrap();
        fs::write(legacy.join("npp").join("files").join("new 1"), "draft").unwrap();

        let root = temp_dir.path().join("backup");
        let report = migrate_legacy(&registry, &legacy, &root).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.migrated, vec!["StickyNotes", "Notepad++"]);
        assert_eq!(
            fs::read_to_string(root.join("StickyNotes").join("plum.sqlite")).unwrap(),
            "notes"
        );
        assert!(root.join("npp").join("files").join("new 1").exists());
        assert!(!root.join("Chrome").exists());
    }

    #[test]
    fn test_empty_legacy_root_creates_backup_root() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        let registry = TargetRegistry::builtin(&paths).unwrap();

        let legacy = temp_dir.path().join("OldBackup");
        fs::create_dir_all(&legacy).unwrap();
        let root = temp_dir.path().join("backup");

        let report = migrate_legacy(&registry, &legacy, &root).unwrap();

        assert!(report.migrated.is_empty());
        assert!(root.is_dir());
    }
}
