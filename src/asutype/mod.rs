//! AsUType personalization support
//!
//! AsUType keeps its corrector, expander and speller lists in a UTF-16
//! `asutype.config`. Before a backup, personal list files are renamed to carry
//! the current user's name so they cannot collide with another user's files
//! once restored into the shared public folder.

pub mod codec;
pub mod rewrite;

pub use codec::{decode_lines, encode_lines};
pub use rewrite::{
    apply_renames, data_folder, plan_rewrite, read_data_folder, rewrite_config, Rename,
    RewriteOutcome, RewritePlan, GLOBAL_SPELLERS,
};

/// Personalization file globs copied alongside the config
pub const PERSONALIZATION_GLOBS: [&str; 3] = ["*.correction", "*.shortcut", "*.spelling"];
