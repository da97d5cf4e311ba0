// src/tasks/copy.rs

//! `copy:js` and `copy:dev`: byte-for-byte copies that keep the structure
//! below the source base.

use anyhow::Result;

use crate::tasks::output::{dest_path, emit};
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport};

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    for file in def.select(ctx)? {
        report.processed += 1;
        let bytes = match ctx.fs.read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.errors.push(FileError::new(&file.path, format!("{e:#}")));
                continue;
            }
        };
        emit(ctx, report, dest_path(dest, &file.rel, None), &bytes)?;
    }
    Ok(())
}
