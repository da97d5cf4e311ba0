// src/tasks/minify_css.rs

//! `cssmin`: minify every dev stylesheet into dist.

use anyhow::Result;

use crate::tasks::output::{dest_path, emit};
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport, css};

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    let targets = css::compatibility_targets(&ctx.config.css.minify_compatibility);

    for file in def.select(ctx)? {
        report.processed += 1;
        let path = &file.path;
        let minified = ctx
            .fs
            .read_to_string(path)
            .map_err(|e| FileError::new(path, format!("{e:#}")))
            .and_then(|source| css::process(&source, path, targets.clone(), true));

        match minified {
            Ok(out) => {
                emit(ctx, report, dest_path(dest, &file.rel, None), out.as_bytes())?;
            }
            Err(err) => report.errors.push(err),
        }
    }
    Ok(())
}
