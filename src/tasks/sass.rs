// src/tasks/sass.rs

//! `sass`: compile top-level `.scss` files with `grass`, then add vendor
//! prefixes for the configured browsers.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::fs::FileSystem;
use crate::tasks::output::{dest_path, emit};
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport, css};

/// Location line of a grass diagnostic, e.g. `  a.scss 3:9  root stylesheet`.
const LOCATION_PATTERN: &str = r"(?m)\s(\d+):(\d+)\s+root stylesheet\s*$";

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    let targets = css::browser_targets(&ctx.config.css.browsers);
    let location = Regex::new(LOCATION_PATTERN).context("compiling sass location pattern")?;

    for file in def.select(ctx)? {
        report.processed += 1;
        let path = &file.path;
        let compiled = compile_file(ctx.fs.as_ref(), path, &location)
            .and_then(|plain| css::process(&plain, path, targets.clone(), false));

        match compiled {
            Ok(out) => {
                emit(ctx, report, dest_path(dest, &file.rel, Some("css")), out.as_bytes())?;
            }
            Err(err) => report.errors.push(err),
        }
    }
    Ok(())
}

/// Routes grass' file access (the entry file and every `@import`/`@use`)
/// through a [`FileSystem`].
#[derive(Debug)]
struct GrassFs<'a>(&'a dyn FileSystem);

impl grass::Fs for GrassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.0.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.0.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.0
            .read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("{e:#}")))
    }
}

/// Compile one stylesheet. Imports resolve relative to the file.
pub fn compile_file(fs: &dyn FileSystem, path: &Path, location: &Regex) -> Result<String, FileError> {
    debug!(path = ?path, "compiling sass");
    let grass_fs = GrassFs(fs);
    let options = grass::Options::default().fs(&grass_fs);
    grass::from_path(path, &options).map_err(|err| {
        let text = err.to_string();
        to_file_error(path, &text, location)
    })
}

/// Turn a grass diagnostic into a [`FileError`]: first line is the message,
/// the `root stylesheet` frame carries line and column.
fn to_file_error(path: &Path, text: &str, location: &Regex) -> FileError {
    let message = text
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches("Error: ")
        .to_string();

    let loc = location.captures(text).and_then(|caps| {
        let line = caps.get(1)?.as_str().parse().ok()?;
        let col = caps.get(2)?.as_str().parse().ok()?;
        Some((line, col))
    });

    match loc {
        Some((line, col)) => FileError::with_location(path, line, col, message),
        None => FileError::new(path, message),
    }
}
