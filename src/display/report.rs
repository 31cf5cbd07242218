//! Backup and restore summaries
//!
//! Formats pass reports for terminal output.

use chrono::{DateTime, Utc};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{BackupReport, BackupStatus, RestoreReport, RestoreResult};

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "Target")]
    name: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct RestoreRow {
    #[tabled(rename = "Target")]
    name: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Result")]
    result: String,
}

fn format_started(label: &str, started_at: &DateTime<Utc>) -> String {
    format!("{} started {}\n\n", label, started_at.format("%Y-%m-%d %H:%M:%S UTC"))
}

/// Format a backup pass as a table followed by a one-line total
pub fn format_backup_report(report: &BackupReport) -> String {
    if report.entries.is_empty() {
        return "No targets configured.".to_string();
    }

    let rows: Vec<BackupRow> = report
        .entries
        .iter()
        .map(|e| BackupRow {
            name: e.friendly_name.clone(),
            app: e.app.to_string(),
            status: e.status.to_string(),
        })
        .collect();

    let skipped = report
        .entries
        .iter()
        .filter(|e| e.status == BackupStatus::Skipped)
        .count();

    let mut output = format_started("Backup", &report.started_at);
    output.push_str(&Table::new(rows).with(Style::psql()).to_string());
    output.push_str(&format!(
        "\n\n{} backed up, {} skipped, {} failed\n",
        report.copied_count(),
        skipped,
        report.failed_count()
    ));
    output
}

/// Format a restore pass as a table followed by the aggregate outcome
pub fn format_restore_report(report: &RestoreReport) -> String {
    if report.outcomes().is_empty() {
        return "No targets configured.".to_string();
    }

    let rows: Vec<RestoreRow> = report
        .outcomes()
        .iter()
        .map(|o| RestoreRow {
            name: o.friendly_name.clone(),
            app: o.app.to_string(),
            result: o.result.to_string(),
        })
        .collect();

    let mut output = format_started("Restore", &report.started_at);
    if report.migrated {
        output.push_str("Migrated backups from the legacy location.\n\n");
    }
    output.push_str(&Table::new(rows).with(Style::psql()).to_string());
    output.push_str("\n\n");

    if report.is_success() {
        output.push_str(&format!(
            "Restore succeeded: {} restored, {} without a backup\n",
            report.count(RestoreResult::RestoreComplete),
            report.count(RestoreResult::NoBackupExists)
        ));
    } else {
        let failed: Vec<&str> = report
            .failures()
            .map(|o| o.friendly_name.as_str())
            .collect();
        output.push_str(&format!("Restore failed for: {}\n", failed.join(", ")));
    }

    if report.needs_new_profile() {
        output.push_str(
            "\nSome applications have not created a profile on this machine yet.\n\
             Launch each of them once, close it, then run the restore again.\n",
        );
    }

    output
}
