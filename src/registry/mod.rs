//! Target registry
//!
//! An ordered collection of targets, unique by application. Loaded once at
//! startup from the declarative list (a configured file, or the list built
//! into the binary); a missing or malformed list is fatal.

pub mod record;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::{ProfilePaths, Settings};
use crate::error::{UserDataError, UserDataResult};
use crate::models::{BackupTarget, TargetApp};

pub use record::{resolve_template, TargetRecord};

/// Target list compiled into the binary
pub const BUILTIN_TARGETS: &str = include_str!("default_targets.json");

/// Ordered, unique collection of backup targets
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<BackupTarget>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configured target list, or the built-in one
    pub fn load(paths: &ProfilePaths, settings: &Settings) -> UserDataResult<Self> {
        match &settings.targets_file {
            Some(file) => Self::from_file(file, paths),
            None => Self::builtin(paths),
        }
    }

    pub fn builtin(paths: &ProfilePaths) -> UserDataResult<Self> {
        Self::from_json(BUILTIN_TARGETS, paths)
    }

    pub fn from_file(file: &Path, paths: &ProfilePaths) -> UserDataResult<Self> {
        let contents = fs::read_to_string(file).map_err(|e| {
            UserDataError::Config(format!(
                "Failed to read target list {}: {}",
                file.display(),
                e
            ))
        })?;
        Self::from_json(&contents, paths)
    }

    pub fn from_json(json: &str, paths: &ProfilePaths) -> UserDataResult<Self> {
        let records: Vec<TargetRecord> = serde_json::from_str(json)
            .map_err(|e| UserDataError::Config(format!("Malformed target list: {}", e)))?;
        Self::from_records(records, paths)
    }

    pub fn from_records(records: Vec<TargetRecord>, paths: &ProfilePaths) -> UserDataResult<Self> {
        let mut registry = Self::new();
        for record in records {
            registry.add(record.into_target(paths)?)?;
        }
        debug!(count = registry.len(), "loaded targets");
        Ok(registry)
    }

    /// Append a target, rejecting a second target of the same application
    /// or with the same friendly name
    pub fn add(&mut self, target: BackupTarget) -> UserDataResult<()> {
        if self.targets.contains(&target) {
            return Err(UserDataError::DuplicateTarget(format!(
                "{} is already registered",
                target.app()
            )));
        }
        if self.by_name(&target.friendly_name).is_some() {
            return Err(UserDataError::DuplicateTarget(format!(
                "friendly name '{}' is already used",
                target.friendly_name
            )));
        }
        self.targets.push(target);
        Ok(())
    }

    /// Re-check every target's live path
    pub fn validate_all(&mut self) {
        for target in &mut self.targets {
            target.validate();
        }
    }

    pub fn get(&self, app: TargetApp) -> Option<&BackupTarget> {
        self.targets.iter().find(|t| t.app() == app)
    }

    pub fn by_name(&self, friendly_name: &str) -> Option<&BackupTarget> {
        self.targets
            .iter()
            .find(|t| t.friendly_name == friendly_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BackupTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<'a> IntoIterator for &'a TargetRegistry {
    type Item = &'a BackupTarget;
    type IntoIter = std::slice::Iter<'a, BackupTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetKind;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_targets_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let registry = TargetRegistry::builtin(&paths).unwrap();

        assert_eq!(registry.len(), 8);
        assert_eq!(registry.iter().next().unwrap().app(), TargetApp::Chrome);
        assert!(registry.iter().all(|t| t.is_valid()));
        assert!(registry.iter().all(|t| !t.exists()));

        let sticky = registry.get(TargetApp::StickyNotes).unwrap();
        assert_eq!(sticky.legacy_folder_name(), "Sticky Notes");
        assert!(matches!(
            registry.get(TargetApp::Chrome).unwrap().kind,
            TargetKind::Chrome(_)
        ));
    }

    #[test]
    fn test_duplicate_app_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        let json = r#"[
            {"app":"firefox","friendly_name":"Firefox","path":"{base}/Mozilla/Firefox","backup_folder":"Firefox"},
            {"app":"firefox","friendly_name":"Firefox 2","path":"{base}/Other","backup_folder":"Other"}
        ]"#;

        let err = TargetRegistry::from_json(json, &paths).unwrap_err();
        assert!(matches!(err, UserDataError::DuplicateTarget(_)));
    }

    #[test]
    fn test_malformed_list_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        assert!(TargetRegistry::from_json("{not json", &paths)
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn test_missing_configured_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        let settings = Settings {
            targets_file: Some(temp_dir.path().join("targets.json")),
            ..Settings::default()
        };

        assert!(TargetRegistry::load(&paths, &settings).unwrap_err().is_config());
    }

    #[test]
    fn test_validate_all_sees_new_files() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        let json = r#"[{"app":"generic","friendly_name":"Tool","path":"{base}/Tool","backup_folder":"Tool"}]"#;
        let mut registry = TargetRegistry::from_json(json, &paths).unwrap();
        assert!(!registry.get(TargetApp::Generic).unwrap().exists());

        fs::create_dir_all(paths.roaming_dir().join("Tool")).unwrap();
        registry.validate_all();

        assert!(registry.by_name("Tool").unwrap().exists());
    }
}
