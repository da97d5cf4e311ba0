// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! threads.

use crate::engine::event_handlers::{
    CoreStep, apply_scheduler_step, handle_task_completion, handle_task_progress,
    handle_task_trigger,
};
use crate::engine::{RunSummary, RuntimeEvent, RuntimeOptions};
use crate::pipeline::{StageScheduler, TaskRunState};
use crate::tasks::TaskId;

/// Pure core runtime state.
///
/// This owns:
/// - the stage scheduler
/// - runtime options (e.g. `exit_when_done`)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: StageScheduler,
    options: RuntimeOptions,
    interrupted: bool,
}

impl CoreRuntime {
    pub fn new(scheduler: StageScheduler, options: RuntimeOptions) -> Self {
        Self {
            scheduler,
            options,
            interrupted: false,
        }
    }

    /// Release the first stage.
    pub fn start(&mut self) -> CoreStep {
        let step = self.scheduler.start();
        apply_scheduler_step(&self.scheduler, &self.options, step)
    }

    /// Expose whether the pipeline has finished (for tests).
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn run_state_of(&self, task: TaskId) -> TaskRunState {
        self.scheduler.run_state_of(task)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => handle_task_trigger(task, reason),
            RuntimeEvent::TaskProgressed { task, origin } => {
                handle_task_progress(&mut self.scheduler, &self.options, task, origin)
            }
            RuntimeEvent::TaskCompleted {
                task,
                origin,
                outcome,
            } => handle_task_completion(&mut self.scheduler, &self.options, task, origin, outcome),
            RuntimeEvent::ShutdownRequested => {
                self.interrupted = true;
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            pipeline: self.scheduler.pipeline().name.clone(),
            status: self.scheduler.status(),
            failed: self.scheduler.failed_tasks().to_vec(),
            interrupted: self.interrupted,
        }
    }
}
