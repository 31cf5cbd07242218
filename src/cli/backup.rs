//! Backup CLI command
//!
//! Runs an unattended backup pass and prints its summary.

use crate::config::ProfilePaths;
use crate::display::format_backup_report;
use crate::engine::BackupManager;
use crate::error::UserDataResult;
use crate::process::ProcessGuard;
use crate::registry::TargetRegistry;

/// Handle `backup`
///
/// Per-target failures only show up in the summary; the command fails only
/// when no backup root can be resolved or created.
pub fn handle_backup_command(
    paths: &ProfilePaths,
    registry: &TargetRegistry,
    guard: &dyn ProcessGuard,
) -> UserDataResult<()> {
    let root = paths.require_backup_root()?;
    println!("Backing up to {}", root.display());
    println!();

    let manager = BackupManager::new(paths, guard);
    let report = manager.run(registry)?;

    print!("{}", format_backup_report(&report));
    Ok(())
}
