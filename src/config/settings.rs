//! User settings for userdata-backup
//!
//! Manages overrides for the backup root, the legacy migration source, the
//! declarative target list and the user name used by the AsUType rewriter.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::ProfilePaths;
use crate::error::UserDataError;

/// User settings for userdata-backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Override for the sync-folder-backed backup root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<PathBuf>,

    /// Older backup layout that restore migrates from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_backup_root: Option<PathBuf>,

    /// Target list to load instead of the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets_file: Option<PathBuf>,

    /// Override for the OS user name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup_root: None,
            legacy_backup_root: None,
            targets_file: None,
            user_name: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &ProfilePaths) -> Result<Self, UserDataError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                UserDataError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                UserDataError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ProfilePaths) -> Result<(), UserDataError> {
        paths.ensure_config_dir()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            UserDataError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            UserDataError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.backup_root.is_none());
        assert!(settings.targets_file.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let settings = Settings {
            backup_root: Some(temp_dir.path().join("Backup")),
            user_name: Some("bob".into()),
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.backup_root, Some(temp_dir.path().join("Backup")));
        assert_eq!(loaded.user_name.as_deref(), Some("bob"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert!(loaded.legacy_backup_root.is_none());
        assert!(!paths.settings_file().exists());
    }

    #[test]
    fn test_malformed_settings_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        paths.ensure_config_dir().unwrap();
        std::fs::write(paths.settings_file(), "{ not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(err.is_config());
    }
}
