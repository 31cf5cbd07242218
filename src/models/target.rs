//! Backup target model
//!
//! One managed application/resource: where its live data is, where its backup
//! copy goes, which processes hold it open, and how its kind is handled.
//! Targets are built once from the declarative list and are immutable apart
//! from the cached existence check.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fsops;

/// Application tag; the identity of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetApp {
    Chrome,
    Edge,
    Firefox,
    StickyNotes,
    OutlookSignatures,
    #[serde(rename = "asutype")]
    AsUType,
    TextEditor,
    AutoDestinations,
    Generic,
}

impl TargetApp {
    /// Chrome and Edge share the Chromium bookmark layout
    pub fn is_chromium(&self) -> bool {
        matches!(self, Self::Chrome | Self::Edge)
    }
}

impl fmt::Display for TargetApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chrome => "Chrome",
            Self::Edge => "Edge",
            Self::Firefox => "Firefox",
            Self::StickyNotes => "Sticky Notes",
            Self::OutlookSignatures => "Outlook Signatures",
            Self::AsUType => "AsUType",
            Self::TextEditor => "Text Editor",
            Self::AutoDestinations => "Jump Lists",
            Self::Generic => "Generic",
        };
        write!(f, "{}", name)
    }
}

/// Chromium profile details beyond the bookmarks file itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromiumProfile {
    /// The browser's own rollback copy, deleted after a merge is written
    pub live_backup_file: Option<String>,
}

/// AsUType keeps its config apart from its personalization files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsUTypeLayout {
    /// Resolved path of `asutype.config`
    pub config_file: PathBuf,
}

/// Session-based editors keep unsaved buffers in a side folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorLayout {
    /// Resolved path of the unsaved-buffer snapshot folder
    pub snapshot_dir: PathBuf,
}

/// Kind of target, with the payload only that kind needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    Chrome(ChromiumProfile),
    Edge(ChromiumProfile),
    Firefox,
    StickyNotes,
    OutlookSignatures,
    AsUType(AsUTypeLayout),
    TextEditor(EditorLayout),
    AutoDestinations,
    Generic { recursive: bool },
}

impl TargetKind {
    pub fn app(&self) -> TargetApp {
        match self {
            Self::Chrome(_) => TargetApp::Chrome,
            Self::Edge(_) => TargetApp::Edge,
            Self::Firefox => TargetApp::Firefox,
            Self::StickyNotes => TargetApp::StickyNotes,
            Self::OutlookSignatures => TargetApp::OutlookSignatures,
            Self::AsUType(_) => TargetApp::AsUType,
            Self::TextEditor(_) => TargetApp::TextEditor,
            Self::AutoDestinations => TargetApp::AutoDestinations,
            Self::Generic { .. } => TargetApp::Generic,
        }
    }

    /// Whether a backup of this kind descends into subdirectories
    pub fn backup_recursive(&self) -> bool {
        match self {
            Self::Firefox | Self::OutlookSignatures => true,
            Self::Generic { recursive } => *recursive,
            _ => false,
        }
    }
}

/// What the live path turned out to be when last checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileSystemType {
    File,
    Directory,
    #[default]
    Unknown,
}

impl fmt::Display for FileSystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Where the live data lives
///
/// `dir` is the resolved template. File targets append `file_name` to it;
/// directory targets use `dir` as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveLocator {
    /// Unformatted template, kept for display
    pub template: String,
    /// Template with its base directory substituted
    pub dir: PathBuf,
    /// File inside `dir`, for single-file targets
    pub file_name: Option<String>,
}

impl LiveLocator {
    pub fn new(template: impl Into<String>, dir: PathBuf, file_name: Option<String>) -> Self {
        Self {
            template: template.into(),
            dir,
            file_name: file_name.filter(|name| !name.is_empty()),
        }
    }

    /// Full live path
    pub fn path(&self) -> PathBuf {
        match &self.file_name {
            Some(name) => self.dir.join(name),
            None => self.dir.clone(),
        }
    }

    /// Directory that must exist before live data can be placed
    pub fn container(&self) -> &Path {
        &self.dir
    }

    pub fn is_file_target(&self) -> bool {
        self.file_name.is_some()
    }
}

/// Result of the last existence check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LiveState {
    fs_type: FileSystemType,
    exists: bool,
}

/// One managed application/resource
#[derive(Debug, Clone)]
pub struct BackupTarget {
    pub kind: TargetKind,
    /// Display/result key, unique within a registry
    pub friendly_name: String,
    pub live: LiveLocator,
    /// Path relative to the backup root
    pub backup_folder: String,
    /// Folder name under the legacy backup root, when it differs
    pub legacy_folder: Option<String>,
    /// Processes to stop before touching live data
    pub process_names: Vec<String>,
    /// Restore needs the live container to exist already
    pub require_existing: bool,
    state: LiveState,
}

impl BackupTarget {
    /// Create a target and check its live path
    pub fn new(
        kind: TargetKind,
        friendly_name: impl Into<String>,
        live: LiveLocator,
        backup_folder: impl Into<String>,
    ) -> Self {
        let mut target = Self {
            kind,
            friendly_name: friendly_name.into(),
            live,
            backup_folder: backup_folder.into(),
            legacy_folder: None,
            process_names: Vec::new(),
            require_existing: false,
            state: LiveState::default(),
        };
        target.validate();
        target
    }

    pub fn with_process_names(mut self, names: Vec<String>) -> Self {
        self.process_names = names;
        self
    }

    pub fn with_require_existing(mut self, require_existing: bool) -> Self {
        self.require_existing = require_existing;
        self
    }

    pub fn with_legacy_folder(mut self, legacy_folder: Option<String>) -> Self {
        self.legacy_folder = legacy_folder.filter(|f| !f.is_empty());
        self
    }

    pub fn app(&self) -> TargetApp {
        self.kind.app()
    }

    /// Re-check the live path
    ///
    /// Never fails: a path that cannot be inspected counts as absent.
    pub fn validate(&mut self) {
        let fs_type = fsops::inspect(&self.live.path());
        self.state = LiveState {
            fs_type,
            exists: fs_type != FileSystemType::Unknown,
        };
    }

    pub fn exists(&self) -> bool {
        self.state.exists
    }

    pub fn fs_type(&self) -> FileSystemType {
        self.state.fs_type
    }

    /// Whether the declarative fields are complete
    pub fn is_valid(&self) -> bool {
        if self.live.template.trim().is_empty()
            || self.backup_folder.trim().is_empty()
            || self.friendly_name.trim().is_empty()
        {
            return false;
        }
        match self.fs_type() {
            FileSystemType::File => self.live.is_file_target(),
            FileSystemType::Directory | FileSystemType::Unknown => true,
        }
    }

    /// Whether a backup pass should touch this target
    pub fn is_actionable(&self) -> bool {
        self.is_valid() && self.exists()
    }

    /// Backup folder under the legacy root
    pub fn legacy_folder_name(&self) -> &str {
        self.legacy_folder.as_deref().unwrap_or(&self.backup_folder)
    }
}

impl PartialEq for BackupTarget {
    fn eq(&self, other: &Self) -> bool {
        self.app() == other.app()
    }
}

impl Eq for BackupTarget {}

impl Hash for BackupTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.app().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sticky_target(dir: &Path) -> BackupTarget {
        BackupTarget::new(
            TargetKind::StickyNotes,
            "StickyNotes",
            LiveLocator::new("{base}/Sticky", dir.to_path_buf(), Some("plum.sqlite".into())),
            "StickyNotes",
        )
    }

    #[test]
    fn test_missing_live_path_is_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let target = sticky_target(&temp_dir.path().join("nope"));

        assert!(!target.exists());
        assert_eq!(target.fs_type(), FileSystemType::Unknown);
        assert!(target.is_valid());
        assert!(!target.is_actionable());
    }

    #[test]
    fn test_validate_refreshes_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut target = sticky_target(temp_dir.path());
        assert!(!target.exists());

        fs::write(temp_dir.path().join("plum.sqlite"), b"db").unwrap();
        target.validate();

        assert!(target.exists());
        assert_eq!(target.fs_type(), FileSystemType::File);
        assert!(target.is_actionable());
    }

    #[test]
    fn test_directory_target_state() {
        let temp_dir = TempDir::new().unwrap();
        let target = BackupTarget::new(
            TargetKind::OutlookSignatures,
            "Outlook Signatures",
            LiveLocator::new("{base}/Signatures", temp_dir.path().to_path_buf(), None),
            "Signatures",
        );

        assert_eq!(target.fs_type(), FileSystemType::Directory);
        assert!(target.is_actionable());
    }

    #[test]
    fn test_file_without_file_name_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("session.xml");
        fs::write(&file, b"<session/>").unwrap();

        let target = BackupTarget::new(
            TargetKind::Generic { recursive: false },
            "Session",
            LiveLocator::new("{base}/session.xml", file, None),
            "Session",
        );

        assert!(target.exists());
        assert!(!target.is_valid());
        assert!(!target.is_actionable());
    }

    #[test]
    fn test_empty_fields_are_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let mut target = sticky_target(temp_dir.path());
        target.backup_folder = String::new();
        assert!(!target.is_valid());

        let mut target = sticky_target(temp_dir.path());
        target.friendly_name = "  ".into();
        assert!(!target.is_valid());
    }

    #[test]
    fn test_identity_is_kind_only() {
        let temp_dir = TempDir::new().unwrap();
        let a = sticky_target(temp_dir.path());
        let mut b = sticky_target(&temp_dir.path().join("other"));
        b.friendly_name = "Notes".into();

        assert_eq!(a, b);
        assert_ne!(
            a,
            BackupTarget::new(
                TargetKind::Firefox,
                "Firefox",
                LiveLocator::new("{base}/Mozilla/Firefox", temp_dir.path().to_path_buf(), None),
                "Firefox",
            )
        );
    }

    #[test]
    fn test_locator_paths() {
        let locator = LiveLocator::new("{base}/x", PathBuf::from("x"), Some("Bookmarks".into()));
        assert_eq!(locator.path(), PathBuf::from("x").join("Bookmarks"));
        assert_eq!(locator.container(), Path::new("x"));
        assert!(locator.is_file_target());

        let locator = LiveLocator::new("{base}/x", PathBuf::from("x"), Some(String::new()));
        assert!(!locator.is_file_target());
    }

    #[test]
    fn test_backup_recursion_by_kind() {
        assert!(TargetKind::Firefox.backup_recursive());
        assert!(TargetKind::OutlookSignatures.backup_recursive());
        assert!(!TargetKind::AutoDestinations.backup_recursive());
        assert!(TargetKind::Generic { recursive: true }.backup_recursive());
    }

    #[test]
    fn test_app_serde_names() {
        let app: TargetApp = serde_json::from_str("\"asutype\"").unwrap();
        assert_eq!(app, TargetApp::AsUType);
        let app: TargetApp = serde_json::from_str("\"outlook_signatures\"").unwrap();
        assert_eq!(app, TargetApp::OutlookSignatures);
    }
}
