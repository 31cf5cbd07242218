//! Filesystem layer for userdata-backup
//!
//! Provides the copy engine, the existence check and atomic single-file
//! writes. Every function here is synchronous and blocking.

pub mod copy;
pub mod file_io;

pub use copy::{copy_directory, copy_file, copy_file_to, is_cache_storage, CopyFilter};
pub use file_io::{ensure_dir, inspect, remove_file_if_exists, write_atomic};
