// src/tasks/minify_js.rs

//! `uglify`: minify every dev script into dist.
//!
//! Whitespace and syntax are compacted by `swc` codegen; identifiers are not
//! mangled. With the `some` comment policy, `/*! ... */` blocks and block
//! comments carrying `@license` or `@preserve` are kept at the top of the
//! output.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::CommentPolicy;
use crate::tasks::output::{dest_path, emit};
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport, js};

const BLOCK_COMMENT: &str = r"/\*[\s\S]*?\*/";

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    let comments = Regex::new(BLOCK_COMMENT).context("compiling comment pattern")?;
    let policy = ctx.config.js.preserve_comments;

    for file in def.select(ctx)? {
        report.processed += 1;
        let minified = ctx
            .fs
            .read_to_string(&file.path)
            .map_err(|e| FileError::new(&file.path, format!("{e:#}")))
            .and_then(|source| minify(&file.path, &source, policy, &comments));

        match minified {
            Ok(out) => {
                emit(ctx, report, dest_path(dest, &file.rel, None), out.as_bytes())?;
            }
            Err(err) => report.errors.push(err),
        }
    }
    Ok(())
}

/// Minify one script. Syntax errors, including recovered ones, are errors.
pub fn minify(
    path: &Path,
    source: &str,
    policy: CommentPolicy,
    comments: &Regex,
) -> Result<String, FileError> {
    let to_error = |issue: js::SyntaxIssue| {
        FileError::with_location(path, issue.line, issue.column, issue.message)
    };

    let parsed = js::parse(path, source).map_err(to_error)?;
    if let Some(issue) = parsed.recovered.first() {
        return Err(to_error(issue.clone()));
    }

    let code = js::emit_minified(&parsed).map_err(|e| FileError::new(path, e.to_string()))?;

    let kept: Vec<&str> = match policy {
        CommentPolicy::None => Vec::new(),
        CommentPolicy::Some => comments
            .find_iter(source)
            .map(|m| m.as_str())
            .filter(|c| is_preserved(c))
            .collect(),
    };

    if kept.is_empty() {
        return Ok(code);
    }
    let mut out = kept.join("\n");
    out.push('\n');
    out.push_str(&code);
    Ok(out)
}

fn is_preserved(comment: &str) -> bool {
    comment.starts_with("/*!") || comment.contains("@license") || comment.contains("@preserve")
}
