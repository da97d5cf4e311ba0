// src/pipeline/task_info.rs

//! Per-run task state and the executor-facing task description.

use crate::tasks::{BuildMode, TaskId};

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunState {
    /// Part of a later stage that has not started yet.
    Pending,
    /// Dispatched to the executor.
    Running,
    /// Completed successfully, or a long-lived task reported it is up.
    DoneSuccess,
    DoneFailed,
    /// Never started because an earlier stage failed under `Abort`.
    Skipped,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not part of the pipeline.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
    Skipped,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

impl RunState {
    pub(crate) fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::DoneSuccess | RunState::DoneFailed | RunState::Skipped
        )
    }
}

/// Why a task is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOrigin {
    /// Released by the pipeline as part of stage `n` (0-based).
    Stage(usize),
    /// Triggered by a file change; outside the pipeline's barriers.
    Watch,
}

/// Description of a task that should be run now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub task: TaskId,
    pub origin: TaskOrigin,
    pub mode: BuildMode,
}
