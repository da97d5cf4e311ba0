// src/tasks/template.rs

//! `ejs`: render page templates into the dev tree.
//!
//! Supported EJS subset:
//! - `<%# comment %>`
//! - `<%= name %>` (HTML-escaped) and `<%- name %>` (raw), where `name` is a
//!   key of `[template.data]`
//! - `<%- include('path') %>` / `<%= include("path") %>` and the legacy
//!   `<% include path %>`; paths resolve against the including file and get
//!   `.ejs` appended when they have no extension
//! - `<%%` for a literal `<%`, and `-%>` to swallow the following newline
//!
//! Any other scriptlet is reported as a transformation error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::fs::FileSystem;
use crate::tasks::output::{dest_path, emit};
use crate::tasks::report::line_col;
use crate::tasks::{FileError, TaskContext, TaskDef, TaskReport};

const OPEN: &str = "<%";
const MAX_INCLUDE_DEPTH: usize = 32;

pub fn run(def: &TaskDef, ctx: &TaskContext, report: &mut TaskReport) -> Result<()> {
    let dest = def.dest_dir()?;
    for file in def.select(ctx)? {
        report.processed += 1;
        match render_file(ctx.fs.as_ref(), &file.path, &ctx.config.template.data) {
            Ok(html) => {
                emit(ctx, report, dest_path(dest, &file.rel, None), html.as_bytes())?;
            }
            Err(err) => report.errors.push(err),
        }
    }
    Ok(())
}

/// Render one template file with `data`.
pub fn render_file(
    fs: &dyn FileSystem,
    path: &Path,
    data: &BTreeMap<String, String>,
) -> Result<String, FileError> {
    Renderer {
        fs,
        data,
        stack: Vec::new(),
    }
    .render(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Comment,
    Escaped,
    Raw,
    Scriptlet,
}

struct Renderer<'a> {
    fs: &'a dyn FileSystem,
    data: &'a BTreeMap<String, String>,
    stack: Vec<PathBuf>,
}

impl Renderer<'_> {
    fn render(&mut self, path: &Path) -> Result<String, FileError> {
        if self.stack.iter().any(|p| p == path) {
            return Err(FileError::new(path, "include cycle detected"));
        }
        if self.stack.len() >= MAX_INCLUDE_DEPTH {
            return Err(FileError::new(path, "includes nested too deeply"));
        }

        let source = self
            .fs
            .read_to_string(path)
            .map_err(|e| FileError::new(path, format!("{e:#}")))?;

        self.stack.push(path.to_path_buf());
        let rendered = self.render_source(path, &source);
        self.stack.pop();
        rendered
    }

    fn render_source(&mut self, path: &Path, source: &str) -> Result<String, FileError> {
        let mut out = String::with_capacity(source.len());
        let mut pos = 0;

        while let Some(found) = source[pos..].find(OPEN) {
            let start = pos + found;
            out.push_str(&source[pos..start]);
            let after_open = start + OPEN.len();

            if source[after_open..].starts_with('%') {
                out.push_str(OPEN);
                pos = after_open + 1;
                continue;
            }

            let (kind, body_start) = match source[after_open..].chars().next() {
                Some('#') => (TagKind::Comment, after_open + 1),
                Some('=') => (TagKind::Escaped, after_open + 1),
                Some('-') => (TagKind::Raw, after_open + 1),
                _ => (TagKind::Scriptlet, after_open),
            };

            let Some(close_rel) = source[body_start..].find("%>") else {
                let (line, col) = line_col(source, start);
                return Err(FileError::with_location(
                    path,
                    line,
                    col,
                    "could not find matching close tag for \"<%\"",
                ));
            };
            let close = body_start + close_rel;
            let mut body = &source[body_start..close];
            let mut trim_newline = false;
            if let Some(stripped) = body.strip_suffix('-') {
                body = stripped;
                trim_newline = true;
            }

            let piece = self.eval(path, source, start, kind, body.trim())?;
            out.push_str(&piece);

            pos = close + 2;
            if trim_newline {
                if source[pos..].starts_with("\r\n") {
                    pos += 2;
                } else if source[pos..].starts_with('\n') {
                    pos += 1;
                }
            }
        }

        out.push_str(&source[pos..]);
        Ok(out)
    }

    fn eval(
        &mut self,
        path: &Path,
        source: &str,
        at: usize,
        kind: TagKind,
        expr: &str,
    ) -> Result<String, FileError> {
        let error = |message: String| {
            let (line, col) = line_col(source, at);
            FileError::with_location(path, line, col, message)
        };

        match kind {
            TagKind::Comment => Ok(String::new()),
            TagKind::Escaped | TagKind::Raw => {
                let value = if let Some(target) = include_call(expr) {
                    let target = target.ok_or_else(|| error(format!("malformed include: {expr}")))?;
                    self.render(&include_path(path, target))?
                } else if is_identifier(expr) {
                    self.data
                        .get(expr)
                        .cloned()
                        .ok_or_else(|| error(format!("{expr} is not defined")))?
                } else {
                    return Err(error(format!("unsupported expression: {expr}")));
                };
                Ok(if kind == TagKind::Escaped {
                    escape_html(&value)
                } else {
                    value
                })
            }
            TagKind::Scriptlet => {
                if expr.is_empty() {
                    return Ok(String::new());
                }
                match expr.strip_prefix("include ") {
                    Some(target) if !target.trim().is_empty() => {
                        self.render(&include_path(path, target.trim()))
                    }
                    _ => Err(error(format!("unsupported scriptlet: {expr}"))),
                }
            }
        }
    }
}

/// `Some(Some(path))` for a well-formed `include('path')`, `Some(None)` for
/// a malformed call, `None` when `expr` is not an include call.
fn include_call(expr: &str) -> Option<Option<&str>> {
    let rest = expr.strip_prefix("include")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let inner = rest.trim_end().trim_end_matches(';').trim_end();
    let Some(inner) = inner.strip_suffix(')') else {
        return Some(None);
    };
    let inner = inner.trim();
    let quoted = ['\'', '"'].into_iter().find_map(|q| {
        inner
            .strip_prefix(q)
            .and_then(|s| s.strip_suffix(q))
            .filter(|s| !s.is_empty() && !s.contains(q))
    });
    Some(quoted)
}

fn include_path(current: &Path, target: &str) -> PathBuf {
    let base = current.parent().unwrap_or_else(|| Path::new(""));
    let mut path = base.join(target);
    if path.extension().is_none() {
        path.set_extension("ejs");
    }
    path
}

fn is_identifier(expr: &str) -> bool {
    let mut chars = expr.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Same entity set EJS uses for `<%=`.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
