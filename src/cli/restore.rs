//! Restore CLI command

use crate::bookmarks::BookmarkMerger;
use crate::config::ProfilePaths;
use crate::display::format_restore_report;
use crate::engine::RestoreManager;
use crate::error::UserDataResult;
use crate::process::ProcessGuard;
use crate::registry::TargetRegistry;

/// Handle `restore`
///
/// Returns the aggregate outcome so the caller can set the exit code.
pub fn handle_restore_command(
    paths: &ProfilePaths,
    registry: &TargetRegistry,
    guard: &dyn ProcessGuard,
    merger: &dyn BookmarkMerger,
) -> UserDataResult<bool> {
    let root = paths.require_backup_root()?;
    println!("Restoring from {}", root.display());
    println!();

    let manager = RestoreManager::new(paths, guard, merger);
    let report = manager.run(registry)?;

    print!("{}", format_restore_report(&report));
    Ok(report.is_success())
}
