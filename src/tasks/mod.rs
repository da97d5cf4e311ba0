// src/tasks/mod.rs

//! Task definitions and their implementations.
//!
//! - [`TaskId`] is the closed set of task identifiers; strings only appear at
//!   the CLI boundary (`FromStr`) and in logs (`Display`).
//! - [`registry`] builds one immutable [`TaskDef`] per id from the directory
//!   roles and dispatches batch tasks to their implementation module.
//! - [`report`] holds per-run results (files written, per-file errors, lint
//!   reports) and derives the task outcome.
//! - Long-lived tasks (`server`, `watch`) are started by the executor, not
//!   by the registry.

pub mod clean;
pub mod concat;
pub mod copy;
pub mod css;
pub mod images;
pub mod js;
pub mod lint_html;
pub mod lint_js;
pub mod minify_css;
pub mod minify_js;
pub mod output;
pub mod registry;
pub mod report;
pub mod sass;
pub mod template;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::fs::{FileSystem, RealFileSystem};
use crate::paths::DirRoles;
use crate::server::ReloadHub;

pub use registry::{FailureRule, FileKinds, IoSpec, ReloadPolicy, TaskDef, TaskRegistry};
pub use report::{FileError, LintFinding, LintReport, TaskReport};

/// Identifier of every task the tool knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Sass,
    Ejs,
    LintJs,
    LintHtml,
    Images,
    Concat,
    Uglify,
    Cssmin,
    CleanAll,
    CopyJs,
    CopyDev,
    Server,
    Watch,
}

impl TaskId {
    pub const ALL: [TaskId; 13] = [
        TaskId::Sass,
        TaskId::Ejs,
        TaskId::LintJs,
        TaskId::LintHtml,
        TaskId::Images,
        TaskId::Concat,
        TaskId::Uglify,
        TaskId::Cssmin,
        TaskId::CleanAll,
        TaskId::CopyJs,
        TaskId::CopyDev,
        TaskId::Server,
        TaskId::Watch,
    ];

    /// Name used on the command line and in logs.
    pub fn name(self) -> &'static str {
        match self {
            TaskId::Sass => "sass",
            TaskId::Ejs => "ejs",
            TaskId::LintJs => "jshint",
            TaskId::LintHtml => "html",
            TaskId::Images => "images",
            TaskId::Concat => "concat",
            TaskId::Uglify => "uglify",
            TaskId::Cssmin => "cssmin",
            TaskId::CleanAll => "clean:all",
            TaskId::CopyJs => "copy:js",
            TaskId::CopyDev => "copy:dev",
            TaskId::Server => "server",
            TaskId::Watch => "watch",
        }
    }

    /// Tasks that keep running after they are up (they report progress
    /// instead of completion).
    pub fn is_long_lived(self) -> bool {
        matches!(self, TaskId::Server | TaskId::Watch)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TaskId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = TaskId::ALL.iter().map(|id| id.name()).collect();
                format!("unknown task '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// How per-file transformation errors affect a task's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Dev pipeline and watch-triggered runs: report errors, keep going,
    /// outcome stays successful.
    Interactive,
    /// Production pipeline and tasks invoked by name: any per-file error
    /// fails the task once all files were processed.
    Strict,
}

/// Everything a task needs at run time.
///
/// Built once at startup from the validated config; cloned (cheaply) into
/// the executor.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub root: PathBuf,
    pub config: Arc<ConfigFile>,
    pub fs: Arc<dyn FileSystem>,
    pub registry: Arc<TaskRegistry>,
    pub reload: ReloadHub,
}

impl TaskContext {
    pub fn new(root: impl Into<PathBuf>, config: ConfigFile) -> Self {
        Self::with_fs(root, config, Arc::new(RealFileSystem))
    }

    pub fn with_fs(root: impl Into<PathBuf>, config: ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        let registry = TaskRegistry::new(config.dirs());
        Self {
            root: root.into(),
            config: Arc::new(config),
            fs,
            registry: Arc::new(registry),
            reload: ReloadHub::new(),
        }
    }

    pub fn dirs(&self) -> &DirRoles {
        self.config.dirs()
    }

    /// Join a root-relative path onto the working root.
    pub fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Run a batch task to completion. See [`TaskRegistry::run`].
    pub fn run(&self, id: TaskId, mode: BuildMode) -> anyhow::Result<TaskReport> {
        self.registry.run(id, self, mode)
    }
}
