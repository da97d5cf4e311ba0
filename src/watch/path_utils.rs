// src/watch/path_utils.rs

//! Path helpers for the watcher.

use std::path::Path;

use crate::paths::to_slash;

/// Render `path` relative to `root`, with forward slashes.
///
/// Tries a direct `strip_prefix` first. Notify reports canonical paths,
/// which may differ from a configured root (symlinks, `/private/var` on
/// macOS), so the canonical root is tried next, and for a removed file the
/// canonical form of its parent directory.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    if let Ok(rel) = path.strip_prefix(&root_canon) {
        return Some(to_slash(rel));
    }

    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}
