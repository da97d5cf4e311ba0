// src/fileset.rs

//! Glob-based input selection.
//!
//! A [`SourceSpec`] is the declarative form (base directory relative to the
//! working root, include globs, negated exclusion globs, all relative to the
//! base). [`FileSet`] is the compiled form that walks the base directory and
//! returns matches in a stable, sorted order.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;
use crate::paths::to_slash;

/// Declarative input selection for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Base directory relative to the working root. Output paths keep the
    /// structure below this directory.
    pub base: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Match file names regardless of case (`LOGO.PNG`).
    pub case_insensitive: bool,
}

impl SourceSpec {
    pub fn new(base: impl Into<PathBuf>, include: &[&str]) -> Self {
        Self {
            base: base.into(),
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            case_insensitive: false,
        }
    }

    pub fn ignoring_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Add a negated pattern. A leading `!` is accepted and stripped, so
    /// gulp-style `"!plugins/*.js"` and `"plugins/*.js"` are equivalent.
    pub fn excluding(mut self, pattern: &str) -> Self {
        let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
        self.exclude.push(pattern.to_string());
        self
    }

    /// Include patterns joined onto the base, i.e. relative to the working
    /// root. Used by watch bindings and dry-run output.
    pub fn rooted_patterns(&self) -> Vec<String> {
        let base = to_slash(&self.base);
        self.include
            .iter()
            .map(|p| {
                if base.is_empty() {
                    p.clone()
                } else {
                    format!("{base}/{p}")
                }
            })
            .collect()
    }

    pub fn compile(&self) -> Result<FileSet> {
        FileSet::new(self)
    }
}

/// One selected input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Path joined onto the working root.
    pub path: PathBuf,
    /// Path relative to the spec base, with forward slashes.
    pub rel: String,
}

/// Compiled include/exclude globs over a base directory.
#[derive(Clone)]
pub struct FileSet {
    base: PathBuf,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSet")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl FileSet {
    pub fn new(spec: &SourceSpec) -> Result<Self> {
        let include = build_globset_with(&spec.include, spec.case_insensitive)
            .with_context(|| format!("building include globset for {:?}", spec.base))?;
        let exclude = if spec.exclude.is_empty() {
            None
        } else {
            Some(
                build_globset_with(&spec.exclude, spec.case_insensitive)
                    .with_context(|| format!("building exclude globset for {:?}", spec.base))?,
            )
        };
        Ok(Self {
            base: spec.base.clone(),
            include,
            exclude,
        })
    }

    /// Whether a base-relative path (forward slashes) is selected.
    pub fn matches(&self, rel: &str) -> bool {
        if !self.include.is_match(rel) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel) {
                return false;
            }
        }
        true
    }

    /// Walk `<root>/<base>` and return every selected file, sorted by
    /// relative path. A missing base directory selects nothing.
    pub fn select(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SelectedFile>> {
        let base_dir = root.join(&self.base);
        let mut files = Vec::new();
        if !fs.is_dir(&base_dir) {
            return Ok(files);
        }

        let mut stack = vec![base_dir.clone()];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    if let Ok(rel) = path.strip_prefix(&base_dir) {
                        let rel = to_slash(rel);
                        if self.matches(&rel) {
                            files.push(SelectedFile { path, rel });
                        }
                    }
                }
            }
        }

        files.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(files)
    }
}

/// Build a GlobSet where `*` does not cross directory separators
/// (`**` does), matching the usual build-tool glob semantics.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    build_globset_with(patterns, false)
}

fn build_globset_with(patterns: &[String], case_insensitive: bool) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .case_insensitive(case_insensitive)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
