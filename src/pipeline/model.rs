// src/pipeline/model.rs

use std::fmt;
use std::str::FromStr;

use crate::tasks::{BuildMode, TaskId};

/// The two named pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineId {
    /// Development: build into `dev`, then serve and watch.
    Default,
    /// Production: clean, build, copy into `dist`, minify.
    Build,
}

impl PipelineId {
    pub fn name(self) -> &'static str {
        match self {
            PipelineId::Default => "default",
            PipelineId::Build => "build",
        }
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a failed stage means for the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Log and move on to the next stage.
    Continue,
    /// Stop; later stages never start.
    Abort,
}

/// A set of tasks that run concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub tasks: Vec<TaskId>,
}

/// Ordered stages with a barrier between consecutive stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
    pub stages: Vec<Stage>,
    pub on_failure: OnFailure,
    pub mode: BuildMode,
}

impl Pipeline {
    pub fn new(
        name: impl Into<String>,
        stages: Vec<Vec<TaskId>>,
        on_failure: OnFailure,
        mode: BuildMode,
    ) -> Self {
        Self {
            name: name.into(),
            stages: stages.into_iter().map(|tasks| Stage { tasks }).collect(),
            on_failure,
            mode,
        }
    }

    pub fn development() -> Self {
        Self::new(
            PipelineId::Default.name(),
            vec![
                vec![
                    TaskId::Sass,
                    TaskId::Ejs,
                    TaskId::Images,
                    TaskId::Concat,
                    TaskId::CopyJs,
                ],
                vec![TaskId::Server, TaskId::Watch],
            ],
            OnFailure::Continue,
            BuildMode::Interactive,
        )
    }

    pub fn production() -> Self {
        Self::new(
            PipelineId::Build.name(),
            vec![
                vec![TaskId::CleanAll],
                vec![TaskId::Sass, TaskId::Ejs, TaskId::Images, TaskId::Concat],
                vec![TaskId::CopyDev],
                vec![TaskId::Uglify],
                vec![TaskId::Cssmin],
            ],
            OnFailure::Abort,
            BuildMode::Strict,
        )
    }

    /// One task invoked by name.
    pub fn single(task: TaskId) -> Self {
        Self::new(task.name(), vec![vec![task]], OnFailure::Abort, BuildMode::Strict)
    }

    pub fn for_target(target: Target) -> Self {
        match target {
            Target::Pipeline(PipelineId::Default) => Self::development(),
            Target::Pipeline(PipelineId::Build) => Self::production(),
            Target::Task(task) => Self::single(task),
        }
    }

    /// Every task of every stage, in stage order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.stages.iter().flat_map(|s| s.tasks.iter().copied())
    }

    pub fn stage_of(&self, task: TaskId) -> Option<usize> {
        self.stages.iter().position(|s| s.tasks.contains(&task))
    }

    /// Whether the pipeline ends with something that keeps running.
    pub fn has_long_lived(&self) -> bool {
        self.tasks().any(TaskId::is_long_lived)
    }
}

/// What the user asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Pipeline(PipelineId),
    Task(TaskId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Pipeline(id) => write!(f, "{id}"),
            Target::Task(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" | "" => Ok(Target::Pipeline(PipelineId::Default)),
            "build" => Ok(Target::Pipeline(PipelineId::Build)),
            other => other.parse::<TaskId>().map(Target::Task).map_err(|_| {
                let tasks: Vec<&str> = TaskId::ALL.iter().map(|id| id.name()).collect();
                format!(
                    "unknown target '{other}' (expected default, build or one of: {})",
                    tasks.join(", ")
                )
            }),
        }
    }
}
