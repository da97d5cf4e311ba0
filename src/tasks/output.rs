// src/tasks/output.rs

//! Output writing shared by all tasks.
//!
//! Outputs are only written when their content differs from what is on
//! disk, compared by blake3 digest. Unchanged re-runs therefore leave files
//! (and their mtimes) untouched and trigger no reload.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;
use crate::paths::join_segments;
use crate::tasks::{TaskContext, TaskReport};

/// Digest of a byte buffer as hex.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Write `contents` to `path` unless it already holds the same bytes.
///
/// Returns whether the file was written.
pub fn write_if_changed(fs: &dyn FileSystem, path: &Path, contents: &[u8]) -> Result<bool> {
    if fs.is_file(path) {
        let existing = fs.read(path)?;
        if existing.len() == contents.len() && content_hash(&existing) == content_hash(contents) {
            debug!(path = ?path, "output unchanged; skipping write");
            return Ok(false);
        }
    }
    fs.write(path, contents)?;
    debug!(path = ?path, bytes = contents.len(), "wrote output");
    Ok(true)
}

/// Destination of a base-relative input under `dest_dir`, optionally with a
/// new extension.
pub fn dest_path(dest_dir: &Path, rel: &str, new_ext: Option<&str>) -> PathBuf {
    let mut out = join_segments(dest_dir, [rel]);
    if let Some(ext) = new_ext {
        out.set_extension(ext);
    }
    out
}

/// Write a root-relative output through the context filesystem and record it
/// in the report when its content changed.
pub fn emit(
    ctx: &TaskContext,
    report: &mut TaskReport,
    dest: PathBuf,
    contents: &[u8],
) -> Result<bool> {
    let changed = write_if_changed(ctx.fs.as_ref(), &ctx.abs(&dest), contents)
        .with_context(|| format!("writing {}", dest.display()))?;
    if changed {
        report.written.push(dest);
    }
    Ok(changed)
}
