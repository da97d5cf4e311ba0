// src/tasks/concat.rs

//! `concat`: bundle plugin scripts into `js/lib/plugins.js`.

use anyhow::Result;

use crate::paths::join_segments;
use crate::tasks::output::emit;
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport};

pub const BUNDLE_NAME: &str = "plugins.js";

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    let files = def.select(ctx)?;
    if files.is_empty() {
        return Ok(());
    }

    let mut parts = Vec::with_capacity(files.len());
    for file in &files {
        report.processed += 1;
        match ctx.fs.read_to_string(&file.path) {
            Ok(text) => parts.push(text),
            Err(e) => report.errors.push(FileError::new(&file.path, format!("{e:#}"))),
        }
    }

    // A bundle with a missing member would silently break pages.
    if !report.errors.is_empty() {
        return Ok(());
    }

    let bundle = parts.join("\n");
    emit(ctx, report, join_segments(dest, [BUNDLE_NAME]), bundle.as_bytes())?;
    Ok(())
}
