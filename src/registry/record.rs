//! Declarative target records
//!
//! One JSON record per target. Path templates carry a placeholder for the
//! base directory they live under: `{base}` picks roaming or local from the
//! record's `roaming` flag, while `{roaming}`, `{local}` and `{public}` name a
//! base explicitly.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ProfilePaths;
use crate::error::{UserDataError, UserDataResult};
use crate::models::{
    AsUTypeLayout, BackupTarget, ChromiumProfile, EditorLayout, LiveLocator, TargetApp, TargetKind,
};

/// Folder the text editor keeps unsaved buffers in, next to its session file
const EDITOR_SNAPSHOT_DIR: &str = "backup";

/// Bookmark file name in a Chromium profile directory
const CHROMIUM_BOOKMARKS: &str = "Bookmarks";

fn default_roaming() -> bool {
    true
}

/// One entry of the declarative target list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetRecord {
    pub app: TargetApp,
    pub friendly_name: String,
    /// Live path template
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub backup_folder: String,
    #[serde(default)]
    pub process_names: Vec<String>,
    #[serde(default = "default_roaming")]
    pub roaming: bool,
    #[serde(default)]
    pub require_existing: bool,
    /// Chrome/Edge: browser's own rollback copy of the bookmarks file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_backup_file: Option<String>,
    /// AsUType: config file template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    /// Text editor: unsaved-buffer folder template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
    /// Generic: descend into subdirectories on backup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    /// Folder name under the legacy backup root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_folder: Option<String>,
}

impl TargetRecord {
    /// Resolve templates and build the checked target
    pub fn into_target(self, paths: &ProfilePaths) -> UserDataResult<BackupTarget> {
        let dir = resolve_template(&self.path, paths, self.roaming)?;

        let kind = match self.app {
            TargetApp::Chrome => TargetKind::Chrome(ChromiumProfile {
                live_backup_file: self.live_backup_file,
            }),
            TargetApp::Edge => TargetKind::Edge(ChromiumProfile {
                live_backup_file: self.live_backup_file,
            }),
            TargetApp::Firefox => TargetKind::Firefox,
            TargetApp::StickyNotes => TargetKind::StickyNotes,
            TargetApp::OutlookSignatures => TargetKind::OutlookSignatures,
            TargetApp::AsUType => {
                let template = self.config_path.as_deref().ok_or_else(|| {
                    UserDataError::Config(format!(
                        "Target '{}' needs a config_path",
                        self.friendly_name
                    ))
                })?;
                TargetKind::AsUType(AsUTypeLayout {
                    config_file: resolve_template(template, paths, self.roaming)?,
                })
            }
            TargetApp::TextEditor => {
                let snapshot_dir = match self.snapshot_path.as_deref() {
                    Some(template) => resolve_template(template, paths, self.roaming)?,
                    None => dir.join(EDITOR_SNAPSHOT_DIR),
                };
                TargetKind::TextEditor(EditorLayout { snapshot_dir })
            }
            TargetApp::AutoDestinations => TargetKind::AutoDestinations,
            TargetApp::Generic => TargetKind::Generic {
                recursive: self.recursive.unwrap_or(false),
            },
        };

        let file_name = if self.app.is_chromium() {
            self.file_name.or_else(|| Some(CHROMIUM_BOOKMARKS.to_string()))
        } else {
            self.file_name
        };

        let live = LiveLocator::new(self.path, dir, file_name);
        Ok(BackupTarget::new(kind, self.friendly_name, live, self.backup_folder)
            .with_process_names(self.process_names)
            .with_require_existing(self.require_existing)
            .with_legacy_folder(self.legacy_folder))
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("valid pattern"))
}

/// Substitute base-directory placeholders in a path template
///
/// Literal segments may use either `/` or `\` as separator.
pub fn resolve_template(
    template: &str,
    paths: &ProfilePaths,
    roaming: bool,
) -> UserDataResult<PathBuf> {
    let mut resolved = PathBuf::new();
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_literal(&mut resolved, &template[last..whole.start()]);

        let base = match name.as_str() {
            "base" => paths.base_for(roaming),
            "roaming" => paths.roaming_dir(),
            "local" => paths.local_dir(),
            "public" => paths.public_dir(),
            other => {
                return Err(UserDataError::Config(format!(
                    "Unknown placeholder '{{{}}}' in '{}'",
                    other, template
                )))
            }
        };
        resolved.push(base);
        last = whole.end();
    }
    push_literal(&mut resolved, &template[last..]);

    Ok(resolved)
}

fn push_literal(path: &mut PathBuf, literal: &str) {
    if path.as_os_str().is_empty() {
        if !literal.is_empty() {
            path.push(Path::new(literal));
        }
        return;
    }
    for part in literal.split(['/', '\\']).filter(|p| !p.is_empty()) {
        path.push(part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(app: TargetApp, path: &str) -> TargetRecord {
        TargetRecord {
            app,
            friendly_name: app.to_string(),
            path: path.into(),
            file_name: None,
            backup_folder: "Folder".into(),
            process_names: Vec::new(),
            roaming: true,
            require_existing: false,
            live_backup_file: None,
            config_path: None,
            snapshot_path: None,
            recursive: None,
            legacy_folder: None,
        }
    }

    #[test]
    fn test_base_follows_roaming_flag() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let roaming = resolve_template("{base}/Mozilla/Firefox", &paths, true).unwrap();
        let local = resolve_template(r"{base}\Google\Chrome", &paths, false).unwrap();

        assert_eq!(roaming, paths.roaming_dir().join("Mozilla").join("Firefox"));
        assert_eq!(local, paths.local_dir().join("Google").join("Chrome"));
    }

    #[test]
    fn test_explicit_placeholders() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let public = resolve_template("{public}/Fanix", &paths, true).unwrap();
        assert_eq!(public, paths.public_dir().join("Fanix"));

        let local = resolve_template("{local}/x", &paths, true).unwrap();
        assert_eq!(local, paths.local_dir().join("x"));
    }

    #[test]
    fn test_unknown_placeholder_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let err = resolve_template("{desktop}/x", &paths, true).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_asutype_requires_config_path() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let err = record(TargetApp::AsUType, "{public}/Fanix")
            .into_target(&paths)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_editor_snapshot_defaults_next_to_session() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let mut rec = record(TargetApp::TextEditor, "{base}/Notepad++");
        rec.file_name = Some("session.xml".into());
        let target = rec.into_target(&paths).unwrap();

        match &target.kind {
            TargetKind::TextEditor(layout) => assert_eq!(
                layout.snapshot_dir,
                paths.roaming_dir().join("Notepad++").join("backup")
            ),
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(
            target.live.path(),
            paths.roaming_dir().join("Notepad++").join("session.xml")
        );
    }

    #[test]
    fn test_chromium_defaults_to_bookmarks_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());

        let mut rec = record(TargetApp::Edge, "{base}/Microsoft/Edge/User Data/Default");
        rec.roaming = false;
        let target = rec.into_target(&paths).unwrap();

        assert_eq!(target.live.file_name.as_deref(), Some("Bookmarks"));
        assert!(target.live.path().starts_with(paths.local_dir()));
    }

    #[test]
    fn test_record_json_defaults() {
        let rec: TargetRecord = serde_json::from_str(
            r#"{"app":"generic","friendly_name":"Tool","path":"{base}/Tool","backup_folder":"Tool"}"#,
        )
        .unwrap();

        assert!(rec.roaming);
        assert!(!rec.require_existing);
        assert!(rec.process_names.is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<TargetRecord, _> = serde_json::from_str(
            r#"{"app":"generic","friendly_name":"T","path":"p","backup_folder":"b","colour":"red"}"#,
        );
        assert!(result.is_err());
    }
}
