// src/tasks/registry.rs

//! Static task definitions and batch-task dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use crate::fileset::{SelectedFile, SourceSpec};
use crate::paths::{DirRoles, Role, join_segments, to_slash};
use crate::server::ReloadEvent;
use crate::tasks::{
    BuildMode, TaskContext, TaskId, TaskReport, clean, concat, copy, images, lint_html, lint_js,
    minify_css, minify_js, sass, template,
};

pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"];
const SASS_EXTS: &[&str] = &["scss", "sass", "css"];
const TEMPLATE_EXTS: &[&str] = &["html", "ejs"];
const HTML: &[&str] = &["html"];
const JS: &[&str] = &["js"];
const CSS: &[&str] = &["css"];

/// Set of file kinds (by extension) a task reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKinds {
    Any,
    Only(&'static [&'static str]),
}

impl FileKinds {
    pub fn intersects(&self, other: &FileKinds) -> bool {
        match (self, other) {
            (FileKinds::Any, _) | (_, FileKinds::Any) => true,
            (FileKinds::Only(a), FileKinds::Only(b)) => a.iter().any(|ext| b.contains(ext)),
        }
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        match self {
            FileKinds::Any => true,
            FileKinds::Only(exts) => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e))),
        }
    }
}

/// Declared data a task touches, relative to the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoSpec {
    /// Files of `kinds` anywhere below `dir`, minus explicitly excluded files.
    Tree {
        dir: PathBuf,
        kinds: FileKinds,
        except: Vec<PathBuf>,
    },
    /// One exact file.
    File(PathBuf),
}

impl IoSpec {
    pub fn tree(dir: PathBuf, kinds: FileKinds) -> Self {
        IoSpec::Tree {
            dir,
            kinds,
            except: Vec::new(),
        }
    }

    /// Whether two declarations can refer to the same file.
    pub fn overlaps(&self, other: &IoSpec) -> bool {
        match (self, other) {
            (IoSpec::File(a), IoSpec::File(b)) => a == b,
            (IoSpec::File(file), IoSpec::Tree { dir, kinds, except })
            | (IoSpec::Tree { dir, kinds, except }, IoSpec::File(file)) => {
                file.starts_with(dir) && kinds.contains_path(file) && !except.contains(file)
            }
            (
                IoSpec::Tree {
                    dir: a, kinds: ka, ..
                },
                IoSpec::Tree {
                    dir: b, kinds: kb, ..
                },
            ) => (a.starts_with(b) || b.starts_with(a)) && ka.intersects(kb),
        }
    }
}

/// Which live-reload notification a task emits after changing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    None,
    Full,
    InjectCss,
}

/// Which problems turn a task run into a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureRule {
    /// Per-file transformation errors fail the task in strict mode only.
    TransformErrors,
    /// Report-only task.
    NeverFail,
    /// Any lint finding fails the task, in every mode.
    FailOnFindings,
}

/// Immutable definition of one task.
#[derive(Debug, Clone)]
pub struct TaskDef {
    pub id: TaskId,
    pub source: Option<SourceSpec>,
    /// Main destination directory (root-relative).
    pub dest: Option<PathBuf>,
    pub reads: Vec<IoSpec>,
    pub writes: Vec<IoSpec>,
    pub reload: ReloadPolicy,
    pub failure: FailureRule,
}

impl TaskDef {
    fn new(id: TaskId) -> Self {
        Self {
            id,
            source: None,
            dest: None,
            reads: Vec::new(),
            writes: Vec::new(),
            reload: ReloadPolicy::None,
            failure: FailureRule::TransformErrors,
        }
    }

    fn source(mut self, spec: SourceSpec, kinds: FileKinds) -> Self {
        self.reads.push(IoSpec::tree(spec.base.clone(), kinds));
        self.source = Some(spec);
        self
    }

    fn reads(mut self, dir: PathBuf, kinds: FileKinds) -> Self {
        self.reads.push(IoSpec::tree(dir, kinds));
        self
    }

    fn dest(mut self, dir: PathBuf, kinds: FileKinds) -> Self {
        self.writes.push(IoSpec::tree(dir.clone(), kinds));
        self.dest = Some(dir);
        self
    }

    fn with_dest(mut self, dir: PathBuf) -> Self {
        self.dest = Some(dir);
        self
    }

    fn writes(mut self, io: IoSpec) -> Self {
        self.writes.push(io);
        self
    }

    fn reload(mut self, policy: ReloadPolicy) -> Self {
        self.reload = policy;
        self
    }

    fn failure(mut self, rule: FailureRule) -> Self {
        self.failure = rule;
        self
    }

    pub fn source_spec(&self) -> Result<&SourceSpec> {
        self.source
            .as_ref()
            .ok_or_else(|| anyhow!("task '{}' has no input selection", self.id))
    }

    pub fn dest_dir(&self) -> Result<&Path> {
        self.dest
            .as_deref()
            .ok_or_else(|| anyhow!("task '{}' has no destination", self.id))
    }

    /// Select this task's inputs under the context root.
    pub fn select(&self, ctx: &TaskContext) -> Result<Vec<SelectedFile>> {
        let spec = self.source_spec()?;
        let files = spec
            .compile()?
            .select(ctx.fs.as_ref(), &ctx.root)
            .with_context(|| format!("selecting inputs for task '{}'", self.id))?;
        debug!(task = %self.id, base = ?spec.base, count = files.len(), "selected inputs");
        Ok(files)
    }
}

/// One definition per [`TaskId`], derived from the directory roles.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    defs: Vec<TaskDef>,
    dev_dir: PathBuf,
}

impl TaskRegistry {
    pub fn new(dirs: &DirRoles) -> Self {
        let defs = TaskId::ALL
            .into_iter()
            .map(|id| define(id, dirs))
            .collect();
        Self {
            defs,
            dev_dir: dirs.resolve::<&str>(Role::Dev, &[]),
        }
    }

    pub fn def(&self, id: TaskId) -> Result<&TaskDef> {
        self.defs
            .get(id.index())
            .ok_or_else(|| anyhow!("task '{id}' is not registered"))
    }

    pub fn defs(&self) -> impl Iterator<Item = &TaskDef> {
        self.defs.iter()
    }

    /// Run a batch task to completion, decide its outcome, send the
    /// live-reload notification and log the report.
    ///
    /// `Err` means the task could not run at all (IO failure); per-file
    /// problems are carried in the returned report.
    pub fn run(&self, id: TaskId, ctx: &TaskContext, mode: BuildMode) -> Result<TaskReport> {
        let def = self.def(id)?;
        let mut report = TaskReport::new(id, mode);

        match id {
            TaskId::Sass => sass::run(def, ctx, &mut report)?,
            TaskId::Ejs => template::run(def, ctx, &mut report)?,
            TaskId::LintJs => lint_js::run(def, ctx, &mut report)?,
            TaskId::LintHtml => lint_html::run(def, ctx, &mut report)?,
            TaskId::Images => images::run(def, ctx, &mut report)?,
            TaskId::Concat => concat::run(def, ctx, &mut report)?,
            TaskId::Uglify => minify_js::run(def, ctx, &mut report)?,
            TaskId::Cssmin => minify_css::run(def, ctx, &mut report)?,
            TaskId::CleanAll => clean::run(def, ctx, &mut report)?,
            TaskId::CopyJs | TaskId::CopyDev => copy::run(def, ctx, &mut report)?,
            TaskId::Server | TaskId::Watch => {
                bail!("task '{id}' is long-lived and is started by the executor")
            }
        }

        report.outcome = report.decide_outcome(def.failure);
        self.notify_reload(def, ctx, &report);
        report.log();
        Ok(report)
    }

    fn notify_reload(&self, def: &TaskDef, ctx: &TaskContext, report: &TaskReport) {
        if report.written.is_empty() {
            return;
        }
        match def.reload {
            ReloadPolicy::None => {}
            ReloadPolicy::Full => ctx.reload.notify(ReloadEvent::Reload),
            ReloadPolicy::InjectCss => {
                let paths = report
                    .written
                    .iter()
                    .filter_map(|p| p.strip_prefix(&self.dev_dir).ok())
                    .map(|p| format!("/{}", to_slash(p)))
                    .collect();
                ctx.reload.notify(ReloadEvent::InjectCss { paths });
            }
        }
    }
}

fn define(id: TaskId, dirs: &DirRoles) -> TaskDef {
    let src = dirs.resolve::<&str>(Role::Src, &[]);
    let dev = dirs.resolve::<&str>(Role::Dev, &[]);
    let dist = dirs.resolve::<&str>(Role::Dist, &[]);
    let plugins_bundle = join_segments(&dirs.asset_path(Role::Dev, "js/lib"), ["plugins.js"]);
    let def = TaskDef::new(id);

    match id {
        TaskId::Sass => def
            .source(
                SourceSpec::new(dirs.asset_path(Role::Src, "sass"), &["*.scss"])
                    .excluding("_*.scss"),
                FileKinds::Only(SASS_EXTS),
            )
            .dest(dirs.asset_path(Role::Dev, "css"), FileKinds::Only(CSS))
            .reload(ReloadPolicy::InjectCss),

        TaskId::Ejs => def
            .source(
                SourceSpec::new(&src, &["**/*.html"]).excluding("**/_*.ejs"),
                FileKinds::Only(TEMPLATE_EXTS),
            )
            .dest(dev, FileKinds::Only(HTML))
            .reload(ReloadPolicy::Full),

        TaskId::LintJs => def
            .source(
                SourceSpec::new(dirs.asset_path(Role::Src, "js"), &["*.js"]),
                FileKinds::Only(JS),
            )
            .failure(FailureRule::NeverFail),

        TaskId::LintHtml => def
            .source(SourceSpec::new(dev, &["**/*.html"]), FileKinds::Only(HTML))
            .failure(FailureRule::FailOnFindings),

        TaskId::Images => {
            let pattern = format!("**/*.{{{}}}", IMAGE_EXTS.join(","));
            let src_images = dirs.asset_path(Role::Src, "images");
            def.source(
                SourceSpec::new(&src_images, &[pattern.as_str()]).ignoring_case(),
                FileKinds::Only(IMAGE_EXTS),
            )
            .writes(IoSpec::tree(src_images, FileKinds::Only(IMAGE_EXTS)))
            .dest(dirs.asset_path(Role::Dev, "images"), FileKinds::Only(IMAGE_EXTS))
            .reload(ReloadPolicy::Full)
        }

        TaskId::Concat => def
            .source(
                SourceSpec::new(dirs.asset_path(Role::Src, "js/plugins"), &["*.js"]),
                FileKinds::Only(JS),
            )
            .writes(IoSpec::File(plugins_bundle))
            .with_dest(dirs.asset_path(Role::Dev, "js/lib")),

        TaskId::Uglify => def
            .source(SourceSpec::new(&dev, &["**/*.js"]), FileKinds::Only(JS))
            .dest(dist, FileKinds::Only(JS)),

        TaskId::Cssmin => def
            .source(SourceSpec::new(&dev, &["**/*.css"]), FileKinds::Only(CSS))
            .dest(dist, FileKinds::Only(CSS)),

        TaskId::CleanAll => def
            .writes(IoSpec::tree(dist.clone(), FileKinds::Any))
            .with_dest(dist),

        TaskId::CopyJs => {
            // Plugin sources are bundled by `concat`, which also owns the
            // bundle path in dev; neither is copied.
            let project = join_segments(Path::new(""), [dirs.project_root.as_str()]);
            let plugins = to_slash(&join_segments(&project, [dirs.assets.as_str(), "js", "plugins"]));
            let bundle = to_slash(&join_segments(&project, [dirs.assets.as_str(), "js", "lib", "plugins.js"]));
            let spec = SourceSpec::new(&src, &["**/*.js"])
                .excluding(&format!("{plugins}/*.js"))
                .excluding(&bundle);
            def.source(spec, FileKinds::Only(JS))
                .writes(IoSpec::Tree {
                    dir: dev.clone(),
                    kinds: FileKinds::Only(JS),
                    except: vec![plugins_bundle],
                })
                .with_dest(dev)
                .reload(ReloadPolicy::Full)
        }

        TaskId::CopyDev => def
            .source(SourceSpec::new(&dev, &["**/*"]), FileKinds::Any)
            .dest(dist, FileKinds::Any),

        TaskId::Server => def.reads(dev, FileKinds::Any),

        TaskId::Watch => def.reads(src, FileKinds::Any),
    }
}
