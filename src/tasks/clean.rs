// src/tasks/clean.rs

//! `clean:all`: remove the dist tree.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::tasks::{TaskContext, TaskDef, TaskReport};

pub fn run(def: &TaskDef, ctx: &TaskContext, _report: &mut TaskReport) -> Result<()> {
    let dist = ctx.abs(def.dest_dir()?);
    if !ctx.fs.exists(&dist) {
        debug!(path = ?dist, "nothing to clean");
        return Ok(());
    }
    ctx.fs
        .remove_dir_all(&dist)
        .with_context(|| format!("removing {}", dist.display()))?;
    info!(path = ?dist, "removed");
    Ok(())
}
