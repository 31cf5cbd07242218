//! Display formatting for terminal output
//!
//! Renders pass summaries, the target list and the resolved configuration
//! as plain text tables.

pub mod report;
pub mod targets;

pub use report::{format_backup_report, format_restore_report};
pub use targets::{format_config, format_target_list};
