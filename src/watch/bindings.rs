// src/watch/bindings.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::fileset::build_globset;
use crate::paths::{DirRoles, Role, to_slash};
use crate::tasks::TaskId;

/// Glob pattern (relative to the working root) and the tasks it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBinding {
    pub pattern: String,
    pub tasks: Vec<TaskId>,
}

impl WatchBinding {
    pub fn new(pattern: impl Into<String>, tasks: &[TaskId]) -> Self {
        Self {
            pattern: pattern.into(),
            tasks: tasks.to_vec(),
        }
    }

    pub fn compile(&self) -> Result<CompiledBinding> {
        let set = build_globset(std::slice::from_ref(&self.pattern))
            .with_context(|| format!("compiling watch pattern {}", self.pattern))?;
        Ok(CompiledBinding {
            binding: self.clone(),
            set,
        })
    }
}

/// A binding with its pattern compiled.
#[derive(Clone)]
pub struct CompiledBinding {
    binding: WatchBinding,
    set: GlobSet,
}

impl fmt::Debug for CompiledBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBinding")
            .field("pattern", &self.binding.pattern)
            .field("tasks", &self.binding.tasks)
            .finish()
    }
}

impl CompiledBinding {
    pub fn binding(&self) -> &WatchBinding {
        &self.binding
    }

    /// `rel` is relative to the working root, with forward slashes.
    pub fn matches(&self, rel: &str) -> bool {
        self.set.is_match(rel)
    }
}

/// The watch bindings of the development pipeline.
///
/// | pattern                          | tasks               |
/// |----------------------------------|---------------------|
/// | `<src>/**/*.html`                | `ejs`, `html`       |
/// | `<src>/<pr>/**/*.ejs`            | `ejs`               |
/// | `<src>/<pr>/<assets>/sass/*.scss`| `sass`              |
/// | `<src>/<pr>/<assets>/js/plugins/*` | `concat`          |
/// | `<src>/<pr>/<assets>/js/*.js`    | `jshint`, `copy:js` |
pub fn default_bindings(dirs: &DirRoles) -> Vec<WatchBinding> {
    let src = to_slash(&dirs.resolve::<&str>(Role::Src, &[]));
    let project = to_slash(&dirs.project_path(Role::Src));
    let sass = to_slash(&dirs.asset_path(Role::Src, "sass"));
    let plugins = to_slash(&dirs.asset_path(Role::Src, "js/plugins"));
    let js = to_slash(&dirs.asset_path(Role::Src, "js"));

    vec![
        WatchBinding::new(format!("{src}/**/*.html"), &[TaskId::Ejs, TaskId::LintHtml]),
        WatchBinding::new(format!("{project}/**/*.ejs"), &[TaskId::Ejs]),
        WatchBinding::new(format!("{sass}/*.scss"), &[TaskId::Sass]),
        WatchBinding::new(format!("{plugins}/*"), &[TaskId::Concat]),
        WatchBinding::new(format!("{js}/*.js"), &[TaskId::LintJs, TaskId::CopyJs]),
    ]
}
