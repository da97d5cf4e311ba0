// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::{RuntimeOptions, TaskOutcome, TriggerReason};
use crate::pipeline::{RunStatus, ScheduledTask, SchedulerStep, StageScheduler, TaskOrigin};
use crate::tasks::{BuildMode, TaskId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the process exits (pipeline finished or aborted).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn keep_going() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

/// Handle a task trigger (a watched file changed).
///
/// Triggered runs bypass the stage barriers and always run interactively.
/// Overlapping runs of the same task are allowed.
pub fn handle_task_trigger(task: TaskId, reason: TriggerReason) -> CoreStep {
    if task.is_long_lived() {
        warn!(%task, ?reason, "long-lived tasks cannot be triggered; ignoring");
        return CoreStep::keep_going();
    }

    debug!(%task, ?reason, "dispatching triggered task");
    CoreStep {
        commands: vec![CoreCommand::DispatchTasks(vec![ScheduledTask {
            task,
            origin: TaskOrigin::Watch,
            mode: BuildMode::Interactive,
        }])],
        keep_running: true,
    }
}

/// Handle a progress event from a long-lived task.
pub fn handle_task_progress(
    scheduler: &mut StageScheduler,
    options: &RuntimeOptions,
    task: TaskId,
    origin: TaskOrigin,
) -> CoreStep {
    if origin == TaskOrigin::Watch {
        return CoreStep::keep_going();
    }
    info!(%task, "long-lived task is up");
    let step = scheduler.handle_progress(task, origin);
    apply_scheduler_step(scheduler, options, step)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut StageScheduler,
    options: &RuntimeOptions,
    task: TaskId,
    origin: TaskOrigin,
    outcome: TaskOutcome,
) -> CoreStep {
    if origin == TaskOrigin::Watch {
        debug!(%task, ?outcome, "triggered run finished");
        return CoreStep::keep_going();
    }
    let step = scheduler.handle_completion(task, origin, outcome);
    apply_scheduler_step(scheduler, options, step)
}

/// Translate a scheduler step into commands for the IO shell.
pub fn apply_scheduler_step(
    scheduler: &StageScheduler,
    options: &RuntimeOptions,
    step: SchedulerStep,
) -> CoreStep {
    let mut commands = Vec::new();
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let mut keep_running = true;
    if step.run_just_finished {
        let exit = match scheduler.status() {
            RunStatus::Aborted { .. } => true,
            RunStatus::Completed => options.exit_when_done,
            RunStatus::NotStarted | RunStatus::Running { .. } => false,
        };
        if exit {
            keep_running = false;
            commands.push(CoreCommand::RequestExit);
        }
    }

    CoreStep {
        commands,
        keep_running,
    }
}
