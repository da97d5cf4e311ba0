// src/engine/mod.rs

//! Pipeline engine.
//!
//! [`core::CoreRuntime`] owns the stage scheduler and turns events (task
//! completions, long-lived progress, watch triggers, Ctrl-C) into commands.
//! [`runtime::Runtime`] is the async loop that feeds it and hands dispatched
//! tasks to an executor.

use crate::pipeline::{RunStatus, TaskOrigin};
use crate::tasks::TaskId;

/// Outcome of a task run for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Number of problems (errors or findings) that failed the task.
    Failed(usize),
}

/// Why a task was triggered outside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// A watched file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Exit once the pipeline has finished. Off for pipelines that end with
    /// long-lived tasks; those run until interrupted.
    pub exit_when_done: bool,
}

/// Events flowing into the runtime from the watcher, executor, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task should run now, outside the pipeline stages.
    TaskTriggered {
        task: TaskId,
        reason: TriggerReason,
    },
    /// A long-lived task is up.
    TaskProgressed { task: TaskId, origin: TaskOrigin },
    /// A batch task finished with a concrete outcome.
    TaskCompleted {
        task: TaskId,
        origin: TaskOrigin,
        outcome: TaskOutcome,
    },
    /// Ctrl-C or an equivalent stop request.
    ShutdownRequested,
}

/// Final state of a runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pipeline: String,
    pub status: RunStatus,
    pub failed: Vec<TaskId>,
    /// Whether the loop ended because of a shutdown request.
    pub interrupted: bool,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
