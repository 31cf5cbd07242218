//! Path management for userdata-backup
//!
//! Resolves every base directory the engine needs into one explicit struct
//! that is handed to the orchestrators, so nothing below the CLI reads
//! ambient process state.
//!
//! ## Path Resolution Order
//!
//! Settings directory:
//! 1. `USERDATA_BACKUP_CONFIG_DIR` environment variable (if set)
//! 2. `<roaming>/userdata-backup`
//!
//! Backup root:
//! 1. `backup_root` from settings (or `--backup-root`)
//! 2. `USERDATA_BACKUP_ROOT` environment variable
//! 3. `%OneDriveCommercial%\Backup`

use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};

use crate::config::settings::Settings;
use crate::error::UserDataError;

const APP_DIR: &str = "userdata-backup";

/// Every directory the backup engine resolves targets against
#[derive(Debug, Clone)]
pub struct ProfilePaths {
    /// Roaming application data (`%APPDATA%`)
    roaming_dir: PathBuf,
    /// Local application data (`%LOCALAPPDATA%`)
    local_dir: PathBuf,
    /// Shared documents (`%PUBLIC%\Documents`)
    public_dir: PathBuf,
    /// Where settings are stored
    config_dir: PathBuf,
    /// Sync-folder-backed root all backups live under
    backup_root: Option<PathBuf>,
    /// Older backup layout to migrate from
    legacy_root: Option<PathBuf>,
    /// Current OS user name
    user_name: String,
}

impl ProfilePaths {
    /// Resolve paths from the OS, without applying settings
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined. A missing
    /// backup root is only reported once a pass asks for it.
    pub fn new() -> Result<Self, UserDataError> {
        let base = BaseDirs::new()
            .ok_or_else(|| UserDataError::Config("Could not determine home directory".into()))?;

        let roaming_dir = base.config_dir().to_path_buf();
        let local_dir = base.data_local_dir().to_path_buf();
        let public_dir = resolve_public_documents(&base);

        let config_dir = std::env::var("USERDATA_BACKUP_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| roaming_dir.join(APP_DIR));

        let backup_root = resolve_backup_root();
        let legacy_root = std::env::var("USERDATA_BACKUP_LEGACY_ROOT")
            .ok()
            .map(PathBuf::from);

        Ok(Self {
            roaming_dir,
            local_dir,
            public_dir,
            config_dir,
            backup_root,
            legacy_root,
            user_name: current_user_name(),
        })
    }

    /// Build paths rooted at a single directory (useful for testing)
    ///
    /// Lays out `roaming/`, `local/`, `public/`, `config/` and `backup/`
    /// below `base_dir`.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            roaming_dir: base_dir.join("roaming"),
            local_dir: base_dir.join("local"),
            public_dir: base_dir.join("public"),
            config_dir: base_dir.join("config"),
            backup_root: Some(base_dir.join("backup")),
            legacy_root: None,
            user_name: "user".to_string(),
        }
    }

    /// Apply overrides from persisted settings
    pub fn apply_settings(mut self, settings: &Settings) -> Self {
        if let Some(root) = &settings.backup_root {
            self.backup_root = Some(root.clone());
        }
        if let Some(legacy) = &settings.legacy_backup_root {
            self.legacy_root = Some(legacy.clone());
        }
        if let Some(user) = &settings.user_name {
            self.user_name = user.clone();
        }
        self
    }

    /// Replace the backup root
    pub fn with_backup_root(mut self, backup_root: PathBuf) -> Self {
        self.backup_root = Some(backup_root);
        self
    }

    /// Replace the legacy backup root
    pub fn with_legacy_root(mut self, legacy_root: PathBuf) -> Self {
        self.legacy_root = Some(legacy_root);
        self
    }

    /// Replace the current user name
    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn roaming_dir(&self) -> &Path {
        &self.roaming_dir
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Base directory for a target's `{base}` placeholder
    pub fn base_for(&self, roaming: bool) -> &Path {
        if roaming {
            &self.roaming_dir
        } else {
            &self.local_dir
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn backup_root(&self) -> Option<&Path> {
        self.backup_root.as_deref()
    }

    /// Get the backup root, failing if none could be resolved
    pub fn require_backup_root(&self) -> Result<&Path, UserDataError> {
        self.backup_root().ok_or_else(|| {
            UserDataError::Config(
                "Could not determine backup root: \
                 set USERDATA_BACKUP_ROOT, OneDriveCommercial or --backup-root"
                    .into(),
            )
        })
    }

    pub fn legacy_root(&self) -> Option<&Path> {
        self.legacy_root.as_deref()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Ensure the settings directory exists
    pub fn ensure_config_dir(&self) -> Result<(), UserDataError> {
        std::fs::create_dir_all(&self.config_dir)
            .map_err(|e| UserDataError::Io(format!("Failed to create config directory: {}", e)))
    }
}

/// Resolve the backup root from the environment
fn resolve_backup_root() -> Option<PathBuf> {
    if let Ok(root) = std::env::var("USERDATA_BACKUP_ROOT") {
        return Some(PathBuf::from(root));
    }
    std::env::var("OneDriveCommercial")
        .ok()
        .map(|od| PathBuf::from(od).join("Backup"))
}

/// Resolve the shared documents folder
#[cfg(windows)]
fn resolve_public_documents(base: &BaseDirs) -> PathBuf {
    std::env::var("PUBLIC")
        .map(|p| PathBuf::from(p).join("Documents"))
        .unwrap_or_else(|_| fallback_documents(base))
}

/// Resolve the shared documents folder
#[cfg(not(windows))]
fn resolve_public_documents(base: &BaseDirs) -> PathBuf {
    fallback_documents(base)
}

fn fallback_documents(base: &BaseDirs) -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| base.home_dir().join("Documents"))
}

fn current_user_name() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "user".to_string())
}
