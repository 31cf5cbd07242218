//! Bookmark merge capability
//!
//! Chromium-family browsers keep bookmarks in a single JSON file. When a
//! restore finds one already in place, the live and backed-up trees are
//! merged rather than overwritten.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{UserDataError, UserDataResult};

/// A parsed bookmark tree
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkTree(pub Value);

/// Parse, merge and serialize bookmark trees
pub trait BookmarkMerger {
    fn parse(&self, path: &Path) -> UserDataResult<BookmarkTree>;

    /// Merge `backup` into `live`; the flag reports whether the merge succeeded
    fn merge(&self, live: BookmarkTree, backup: BookmarkTree) -> (BookmarkTree, bool);

    fn serialize(&self, tree: &BookmarkTree) -> UserDataResult<Vec<u8>>;
}

/// Union merge over the Chromium `Bookmarks` JSON layout
///
/// Backup nodes are appended when no live node at the same position has the
/// same URL (or, for folders, the same name). Matching folders are merged
/// recursively. Appended nodes get fresh ids, and the checksum is dropped so
/// the browser recomputes it on next start.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumBookmarks;

impl BookmarkMerger for ChromiumBookmarks {
    fn parse(&self, path: &Path) -> UserDataResult<BookmarkTree> {
        let contents = fs::read_to_string(path)
            .map_err(|e| UserDataError::io(format!("Failed to read {}", path.display()), e))?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| {
            UserDataError::Merge(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if !value.is_object() {
            return Err(UserDataError::Merge(format!(
                "{} is not a bookmark file",
                path.display()
            )));
        }
        Ok(BookmarkTree(value))
    }

    fn merge(&self, live: BookmarkTree, backup: BookmarkTree) -> (BookmarkTree, bool) {
        let BookmarkTree(mut live_value) = live;
        let backup_roots = match backup.0.get("roots").and_then(Value::as_object) {
            Some(roots) => roots.clone(),
            None => return (BookmarkTree(live_value), false),
        };

        let mut next_id = max_id(&live_value) + 1;

        let Some(live_obj) = live_value.as_object_mut() else {
            return (BookmarkTree(live_value), false);
        };
        let Some(live_roots) = live_obj.get_mut("roots").and_then(Value::as_object_mut) else {
            return (BookmarkTree(live_value), false);
        };

        for (key, backup_root) in backup_roots {
            match live_roots.get_mut(&key) {
                Some(live_root) => merge_folder(live_root, &backup_root, &mut next_id),
                None => {
                    let mut root = backup_root;
                    reassign_ids(&mut root, &mut next_id);
                    live_roots.insert(key, root);
                }
            }
        }

        live_obj.remove("checksum");
        (BookmarkTree(live_value), true)
    }

    fn serialize(&self, tree: &BookmarkTree) -> UserDataResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&tree.0)?)
    }
}

fn node_type(node: &Value) -> Option<&str> {
    node.get("type").and_then(Value::as_str)
}

fn same_node(a: &Value, b: &Value) -> bool {
    match (node_type(a), node_type(b)) {
        (Some("url"), Some("url")) => a.get("url") == b.get("url"),
        (Some("folder"), Some("folder")) => a.get("name") == b.get("name"),
        _ => false,
    }
}

fn merge_folder(live: &mut Value, backup: &Value, next_id: &mut u64) {
    let Some(backup_children) = backup.get("children").and_then(Value::as_array) else {
        return;
    };
    let Some(live_folder) = live.as_object_mut() else {
        return;
    };
    let live_children = live_folder
        .entry("children")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(live_children) = live_children.as_array_mut() else {
        return;
    };

    for child in backup_children {
        match live_children.iter_mut().find(|l| same_node(l, child)) {
            Some(existing) if node_type(child) == Some("folder") => {
                merge_folder(existing, child, next_id)
            }
            Some(_) => {}
            None => {
                let mut node = child.clone();
                reassign_ids(&mut node, next_id);
                live_children.push(node);
            }
        }
    }
}

fn reassign_ids(node: &mut Value, next_id: &mut u64) {
    if let Some(obj) = node.as_object_mut() {
        if obj.contains_key("id") {
            obj.insert("id".into(), Value::String(next_id.to_string()));
            *next_id += 1;
        }
        if let Some(children) = obj.get_mut("children").and_then(Value::as_array_mut) {
            for child in children {
                reassign_ids(child, next_id);
            }
        }
    }
}

fn max_id(value: &Value) -> u64 {
    match value {
        Value::Object(obj) => {
            let own = id_of(obj).unwrap_or(0);
            obj.values().map(max_id).fold(own, u64::max)
        }
        Value::Array(items) => items.iter().map(max_id).max().unwrap_or(0),
        _ => 0,
    }
}

fn id_of(obj: &Map<String, Value>) -> Option<u64> {
    obj.get("id")
        .and_then(Value::as_str)
        .and_then(|id| id.parse().ok())
}
