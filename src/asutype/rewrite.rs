//! Personalization list rewriting
//!
//! Planning is pure: it turns config lines into rewritten lines plus a list of
//! file renames. Applying the plan renames files as a batch and only then
//! replaces the config, undoing the renames if anything fails.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::codec::{decode_lines, encode_lines};
use crate::error::{UserDataError, UserDataResult};
use crate::fsops;

/// Shared dictionaries that ship with every install; never renamed
pub const GLOBAL_SPELLERS: [&str; 4] = [
    "english.spelling",
    "medical.spelling",
    "mhs_terms.spelling",
    "ranks_us_army.spelling",
];

/// The three list directives and the extension each one references
const LIST_DIRECTIVES: [(&str, &str); 3] = [
    ("CorrectorMyFileList", "correction"),
    ("ExpanderMyFileList", "shortcut"),
    ("SpellerMyFileList", "spelling"),
];

struct Patterns {
    data_folder: Regex,
    lists: Vec<(bool, Regex)>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        data_folder: Regex::new(r"DataFolder\s=\s.*,\s(?P<path>.*)").expect("valid pattern"),
        lists: LIST_DIRECTIVES
            .iter()
            .map(|(directive, ext)| {
                let pattern = format!(
                    r"(?P<header>{}\s=\s.*,\s)(?P<files>(?:\.\\[^|\\]*\.{}\|?)+)",
                    directive, ext
                );
                let is_speller = *ext == "spelling";
                (is_speller, Regex::new(&pattern).expect("valid pattern"))
            })
            .collect(),
    })
}

/// One personalization file to rename inside the data folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Result of planning a rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePlan {
    pub lines: Vec<String>,
    pub renames: Vec<Rename>,
    /// Folder the personalization files live in
    pub data_folder: PathBuf,
    /// Number of list lines whose text changed
    pub rewritten_lines: usize,
}

impl RewritePlan {
    pub fn is_noop(&self) -> bool {
        self.renames.is_empty() && self.rewritten_lines == 0
    }
}

/// Summary of an applied rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub renamed: usize,
    pub rewritten_lines: usize,
    /// Folder the config points its personalization files at
    pub data_folder: PathBuf,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn is_global(file_name: &str) -> bool {
    GLOBAL_SPELLERS
        .iter()
        .any(|global| contains_ignore_case(file_name, global))
}

/// Folder named by the first `DataFolder` directive, or `fallback`
pub fn data_folder(lines: &[String], fallback: &Path) -> PathBuf {
    lines
        .iter()
        .find_map(|line| patterns().data_folder.captures(line))
        .and_then(|caps| caps.name("path"))
        .map(|m| PathBuf::from(m.as_str().trim()))
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| fallback.to_path_buf())
}

/// Read a config and resolve its data folder
pub fn read_data_folder(config_file: &Path, fallback: &Path) -> UserDataResult<PathBuf> {
    let bytes = fs::read(config_file)
        .map_err(|e| UserDataError::io(format!("Failed to read {}", config_file.display()), e))?;
    Ok(data_folder(&decode_lines(&bytes)?, fallback))
}

/// Plan the rewrite of every list directive in `lines`
///
/// Personal files not already carrying `user` become `<user>-<NN><ext>`,
/// numbered by position among the line's personal files; a number whose name
/// the line already lists is skipped for the next free one. Shared speller
/// dictionaries keep their names and move after the personal files. The
/// `DataFolder` directive locates the files; `fallback_data_folder` is used
/// when there is none.
pub fn plan_rewrite(lines: &[String], user: &str, fallback_data_folder: &Path) -> RewritePlan {
    let patterns = patterns();
    let data_folder = data_folder(lines, fallback_data_folder);

    let mut renames = Vec::new();
    let mut rewritten_lines = 0;
    let mut output = Vec::with_capacity(lines.len());

    for line in lines {
        let matched = patterns
            .lists
            .iter()
            .find_map(|(is_speller, regex)| regex.captures(line).map(|caps| (*is_speller, caps)));

        let Some((is_speller, caps)) = matched else {
            output.push(line.clone());
            continue;
        };

        let header = caps.name("header").map(|m| m.as_str()).unwrap_or_default();
        let files: Vec<&str> = caps
            .name("files")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split('|')
            .filter_map(|entry| entry.strip_prefix(".\\"))
            .filter(|name| !name.is_empty())
            .collect();

        let (mut personal, global): (Vec<String>, Vec<String>) = if is_speller {
            let (global, personal): (Vec<&str>, Vec<&str>) =
                files.into_iter().partition(|name| is_global(name));
            (
                personal.into_iter().map(String::from).collect(),
                global.into_iter().map(String::from).collect(),
            )
        } else {
            (files.into_iter().map(String::from).collect(), Vec::new())
        };

        if personal.is_empty() {
            output.push(line.clone());
            continue;
        }

        let mut taken: HashSet<String> = personal
            .iter()
            .chain(global.iter())
            .map(|name| name.to_lowercase())
            .collect();

        for (index, name) in personal.iter_mut().enumerate() {
            if contains_ignore_case(name, user) {
                continue;
            }
            let ext = Path::new(name.as_str())
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let mut number = index + 1;
            let mut new_name = format!("{}-{:02}{}", user, number, ext);
            while !taken.insert(new_name.to_lowercase()) {
                number += 1;
                new_name = format!("{}-{:02}{}", user, number, ext);
            }
            renames.push(Rename {
                from: data_folder.join(name.as_str()),
                to: data_folder.join(&new_name),
            });
            *name = new_name;
        }

        let entries: Vec<String> = personal
            .iter()
            .chain(global.iter())
            .map(|name| format!(".\\{}", name))
            .collect();
        let new_line = format!("{}{}", header, entries.join("|"));

        if new_line != *line {
            rewritten_lines += 1;
        }
        output.push(new_line);
    }

    RewritePlan {
        lines: output,
        renames,
        data_folder,
        rewritten_lines,
    }
}

/// Rename every file in the batch, or none of them
pub fn apply_renames(renames: &[Rename]) -> UserDataResult<()> {
    for rename in renames {
        if !rename.from.is_file() {
            return Err(UserDataError::source_not_found(&rename.from));
        }
        if rename.to.exists() {
            return Err(UserDataError::Validation(format!(
                "Cannot rename {}: {} already exists",
                rename.from.display(),
                rename.to.display()
            )));
        }
    }

    for (done, rename) in renames.iter().enumerate() {
        if let Err(e) = fs::rename(&rename.from, &rename.to) {
            roll_back(&renames[..done]);
            return Err(UserDataError::io(
                format!("Failed to rename {}", rename.from.display()),
                e,
            ));
        }
        debug!(
            from = %rename.from.display(),
            to = %rename.to.display(),
            "renamed personalization file"
        );
    }
    Ok(())
}

fn roll_back(applied: &[Rename]) {
    for rename in applied.iter().rev() {
        if let Err(e) = fs::rename(&rename.to, &rename.from) {
            warn!(
                file = %rename.to.display(),
                error = %e,
                "could not undo personalization rename"
            );
        }
    }
}

/// Rewrite the live config in place for `user`
///
/// Leaves the config untouched when nothing needs to change.
pub fn rewrite_config(
    config_file: &Path,
    user: &str,
    fallback_data_folder: &Path,
) -> UserDataResult<RewriteOutcome> {
    let bytes = fs::read(config_file)
        .map_err(|e| UserDataError::io(format!("Failed to read {}", config_file.display()), e))?;
    let lines = decode_lines(&bytes)?;
    let plan = plan_rewrite(&lines, user, fallback_data_folder);

    if plan.is_noop() {
        debug!(config = %config_file.display(), "personalization lists already up to date");
        return Ok(RewriteOutcome {
            data_folder: plan.data_folder,
            ..RewriteOutcome::default()
        });
    }

    apply_renames(&plan.renames)?;

    if let Err(e) = fsops::write_atomic(config_file, &encode_lines(&plan.lines)) {
        roll_back(&plan.renames);
        return Err(e);
    }

    Ok(RewriteOutcome {
        renamed: plan.renames.len(),
        rewritten_lines: plan.rewritten_lines,
        data_folder: plan.data_folder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_speller_line_renamed_and_reordered() {
        let input = lines(&[r"SpellerMyFileList = h, .\english.spelling|.\a.spelling"]);

        let plan = plan_rewrite(&input, "bob", Path::new("data"));

        assert_eq!(
            plan.lines,
            lines(&[r"SpellerMyFileList = h, .\bob-01.spelling|.\english.spelling"])
        );
        assert_eq!(
            plan.renames,
            vec![Rename {
                from: PathBuf::from("data").join("a.spelling"),
                to: PathBuf::from("data").join("bob-01.spelling"),
            }]
        );
    }

    #[test]
    fn test_numbering_counts_skipped_files() {
        let input = lines(&[r"ExpanderMyFileList = 3, 1, .\bob-01.shortcut|.\x.shortcut"]);

        let plan = plan_rewrite(&input, "bob", Path::new("d"));

        assert_eq!(
            plan.lines[0],
            r"ExpanderMyFileList = 3, 1, .\bob-01.shortcut|.\bob-02.shortcut"
        );
        assert_eq!(plan.renames.len(), 1);
    }

    #[test]
    fn test_planned_name_skips_names_already_listed() {
        let input = lines(&[r"ExpanderMyFileList = 3, 1, .\x.shortcut|.\bob-01.shortcut"]);

        let plan = plan_rewrite(&input, "bob", Path::new("d"));

        assert_eq!(
            plan.lines[0],
            r"ExpanderMyFileList = 3, 1, .\bob-02.shortcut|.\bob-01.shortcut"
        );
        assert_eq!(
            plan.renames,
            vec![Rename {
                from: PathBuf::from("d").join("x.shortcut"),
                to: PathBuf::from("d").join("bob-02.shortcut"),
            }]
        );
    }

    #[test]
    fn test_read_data_folder_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("asutype.config");
        fs::write(
            &config,
            encode_lines(&lines(&["[Main]", r"DataFolder = 1, D:\Lists"])),
        )
        .unwrap();

        let folder = read_data_folder(&config, Path::new("fallback")).unwrap();
        assert_eq!(folder, PathBuf::from(r"D:\Lists"));

        fs::write(&config, encode_lines(&lines(&["[Main]"]))).unwrap();
        let folder = read_data_folder(&config, Path::new("fallback")).unwrap();
        assert_eq!(folder, PathBuf::from("fallback"));
    }

    #[test]
    fn test_user_match_is_case_insensitive() {
        let input = lines(&[r"CorrectorMyFileList = h, .\BOB-notes.correction"]);

        let plan = plan_rewrite(&input, "bob", Path::new("d"));

        assert!(plan.renames.is_empty());
        assert!(plan.is_noop());
    }

    #[test]
    fn test_only_globals_is_unchanged() {
        let input = lines(&[r"SpellerMyFileList = h, .\english.spelling|.\medical.spelling"]);

        let plan = plan_rewrite(&input, "bob", Path::new("d"));

        assert_eq!(plan.lines, input);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_data_folder_directive_used() {
        let input = lines(&[
            r"CorrectorMyFileList = h, .\mine.correction",
            r"DataFolder = 1, C:\Data\Fanix",
            "[Other]",
        ]);

        let plan = plan_rewrite(&input, "amy", Path::new("fallback"));

        assert_eq!(plan.data_folder, PathBuf::from(r"C:\Data\Fanix"));
        assert_eq!(plan.lines[1], input[1]);
        assert_eq!(plan.lines[2], "[Other]");
    }

    #[test]
    fn test_rewrite_config_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let data = temp_dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("a.spelling"), "words").unwrap();
        fs::write(data.join("english.spelling"), "shared").unwrap();

        let config = temp_dir.path().join("asutype.config");
        let input = lines(&[
            "[Speller]",
            r"SpellerMyFileList = h, .\a.spelling|.\english.spelling",
        ]);
        fs::write(&config, encode_lines(&input)).unwrap();

        let outcome = rewrite_config(&config, "bob", &data).unwrap();

        assert_eq!(outcome.renamed, 1);
        assert!(!data.join("a.spelling").exists());
        assert_eq!(fs::read_to_string(data.join("bob-01.spelling")).unwrap(), "words");
        assert!(data.join("english.spelling").exists());

        let written = decode_lines(&fs::read(&config).unwrap()).unwrap();
        assert_eq!(
            written[1],
            r"SpellerMyFileList = h, .\bob-01.spelling|.\english.spelling"
        );
    }

    #[test]
    fn test_missing_file_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let data = temp_dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("a.spelling"), "a").unwrap();

        let config = temp_dir.path().join("asutype.config");
        let input = lines(&[r"SpellerMyFileList = h, .\a.spelling|.\gone.spelling"]);
        let original = encode_lines(&input);
        fs::write(&config, &original).unwrap();

        let err = rewrite_config(&config, "bob", &data).unwrap_err();

        assert!(err.is_not_found());
        assert!(data.join("a.spelling").exists());
        assert_eq!(fs::read(&config).unwrap(), original);
    }

    #[test]
    fn test_existing_destination_blocks_batch() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.shortcut"), "a").unwrap();
        fs::write(temp_dir.path().join("bob-01.shortcut"), "taken").unwrap();

        let renames = vec![Rename {
            from: temp_dir.path().join("a.shortcut"),
            to: temp_dir.path().join("bob-01.shortcut"),
        }];

        assert!(apply_renames(&renames).is_err());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("bob-01.shortcut")).unwrap(),
            "taken"
        );
    }
}
