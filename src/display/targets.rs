//! Target list and configuration display

use std::path::Path;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::{ProfilePaths, Settings};
use crate::registry::TargetRegistry;

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "Target")]
    name: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Found")]
    exists: &'static str,
    #[tabled(rename = "Type")]
    fs_type: String,
    #[tabled(rename = "Live path")]
    live: String,
    #[tabled(rename = "Backup folder")]
    backup_folder: String,
    #[tabled(rename = "Backed up")]
    actionable: &'static str,
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Format the registry with each target's existence state
pub fn format_target_list(registry: &TargetRegistry) -> String {
    if registry.is_empty() {
        return "No targets configured.".to_string();
    }

    let rows: Vec<TargetRow> = registry
        .iter()
        .map(|t| TargetRow {
            name: t.friendly_name.clone(),
            app: t.app().to_string(),
            exists: yes_no(t.exists()),
            fs_type: t.fs_type().to_string(),
            live: t.live.path().display().to_string(),
            backup_folder: t.backup_folder.clone(),
            actionable: yes_no(t.is_actionable()),
        })
        .collect();

    Table::new(rows).with(Style::psql()).to_string()
}

fn show(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Format resolved paths and persisted settings
pub fn format_config(paths: &ProfilePaths, settings: &Settings) -> String {
    let mut output = String::new();
    output.push_str("userdata-backup Configuration\n");
    output.push_str("=============================\n");
    output.push_str(&format!("Settings file:   {}\n", paths.settings_file().display()));
    output.push_str(&format!("Roaming base:    {}\n", paths.roaming_dir().display()));
    output.push_str(&format!("Local base:      {}\n", paths.local_dir().display()));
    output.push_str(&format!("Public base:     {}\n", paths.public_dir().display()));
    output.push_str(&format!("Backup root:     {}\n", show(paths.backup_root())));
    output.push_str(&format!("Legacy root:     {}\n", show(paths.legacy_root())));
    output.push_str(&format!("User name:       {}\n", paths.user_name()));
    output.push_str(&format!(
        "Target list:     {}\n",
        settings
            .targets_file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string())
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_target_list_shows_existence_state() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path());
        fs::create_dir_all(paths.roaming_dir().join("Mozilla").join("Firefox")).unwrap();
        let registry = TargetRegistry::builtin(&paths).unwrap();

        let output = format_target_list(&registry);

        assert!(output.contains("Firefox"));
        assert!(output.contains("directory"));
        assert!(output.contains("Jump Lists"));
        assert!(output.contains("unknown"));
    }

    #[test]
    fn test_empty_registry() {
        assert_eq!(
            format_target_list(&TargetRegistry::new()),
            "No targets configured."
        );
    }

    #[test]
    fn test_config_shows_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ProfilePaths::with_base_dir(temp_dir.path()).with_user_name("alice");
        let settings = Settings::default();

        let output = format_config(&paths, &settings);

        assert!(output.contains("alice"));
        assert!(output.contains("(built-in)"));
        assert!(output.contains("Legacy root:     (not set)"));
    }
}
