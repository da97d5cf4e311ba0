// src/pipeline/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::pipeline::task_info::ScheduledTask;
use crate::tasks::TaskId;

/// Structured result of a single scheduler "step".
///
/// Tests use it to step a pipeline manually and assert on what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks released by this step (the next stage, when a barrier opened).
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked as failed in this step.
    pub newly_failed: Vec<TaskId>,
    /// Whether this step finished the pipeline (completed or aborted).
    pub run_just_finished: bool,
}
