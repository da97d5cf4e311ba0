// src/pipeline/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::engine::TaskOutcome;
use crate::pipeline::model::{OnFailure, Pipeline};
use crate::pipeline::scheduler_step::SchedulerStep;
use crate::pipeline::task_info::{RunState, ScheduledTask, TaskOrigin, TaskRunState};
use crate::tasks::TaskId;

/// Where a pipeline run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    NotStarted,
    Running { stage: usize },
    /// Every stage finished (possibly with failures under `Continue`).
    Completed,
    /// A stage failed under `Abort`; later stages were skipped.
    Aborted { stage: usize },
}

/// Stage scheduler: holds the pipeline plus mutable per-run state.
///
/// It is responsible for:
/// - releasing the tasks of one stage at a time
/// - marking tasks as succeeded/failed/progressed
/// - opening the barrier once every task of the current stage is terminal
/// - applying the pipeline's failure policy
///
/// Watch-triggered runs never pass through the scheduler's barrier logic.
#[derive(Debug)]
pub struct StageScheduler {
    pipeline: Pipeline,
    states: HashMap<TaskId, RunState>,
    status: RunStatus,
    failed: Vec<TaskId>,
}

impl StageScheduler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            states: HashMap::new(),
            status: RunStatus::NotStarted,
            failed: Vec::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns `true` once the pipeline completed or aborted.
    pub fn is_finished(&self) -> bool {
        matches!(self.status, RunStatus::Completed | RunStatus::Aborted { .. })
    }

    /// Tasks that failed so far, in failure order.
    pub fn failed_tasks(&self) -> &[TaskId] {
        &self.failed
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: TaskId) -> TaskRunState {
        self.states.get(&task).copied().into()
    }

    /// Start the run: every task becomes pending and the first non-empty
    /// stage is released.
    pub fn start(&mut self) -> SchedulerStep {
        if self.status != RunStatus::NotStarted {
            warn!(pipeline = %self.pipeline.name, "start called twice; ignoring");
            return SchedulerStep::default();
        }

        for task in self.pipeline.tasks() {
            self.states.insert(task, RunState::Pending);
        }
        info!(
            pipeline = %self.pipeline.name,
            stages = self.pipeline.stages.len(),
            "starting pipeline"
        );
        self.enter_stage(0)
    }

    /// A long-lived task reported it is up.
    pub fn handle_progress(&mut self, task: TaskId, origin: TaskOrigin) -> SchedulerStep {
        if !self.accepts(task, origin) {
            return SchedulerStep::default();
        }
        debug!(%task, "task reported progress; marking DoneSuccess for this run");
        self.states.insert(task, RunState::DoneSuccess);
        self.maybe_advance(Vec::new())
    }

    /// A batch task finished.
    pub fn handle_completion(
        &mut self,
        task: TaskId,
        origin: TaskOrigin,
        outcome: TaskOutcome,
    ) -> SchedulerStep {
        if !self.accepts(task, origin) {
            return SchedulerStep::default();
        }

        let mut newly_failed = Vec::new();
        match outcome {
            TaskOutcome::Success => {
                debug!(%task, "task completed successfully");
                self.states.insert(task, RunState::DoneSuccess);
            }
            TaskOutcome::Failed(problems) => {
                warn!(%task, problems, "task failed");
                self.states.insert(task, RunState::DoneFailed);
                self.failed.push(task);
                newly_failed.push(task);
            }
        }
        self.maybe_advance(newly_failed)
    }

    /// Whether an event for `task` belongs to the stage that is running now.
    fn accepts(&self, task: TaskId, origin: TaskOrigin) -> bool {
        let RunStatus::Running { stage } = self.status else {
            warn!(%task, status = ?self.status, "event with no running stage; ignoring");
            return false;
        };
        if origin != TaskOrigin::Stage(stage) {
            warn!(%task, ?origin, stage, "event for a different stage; ignoring");
            return false;
        }
        if self.states.get(&task) != Some(&RunState::Running) {
            warn!(%task, "event for a task that is not running; ignoring");
            return false;
        }
        true
    }

    fn maybe_advance(&mut self, newly_failed: Vec<TaskId>) -> SchedulerStep {
        let RunStatus::Running { stage } = self.status else {
            return SchedulerStep {
                newly_failed,
                ..SchedulerStep::default()
            };
        };

        let tasks = &self.pipeline.stages[stage].tasks;
        let all_terminal = tasks.iter().all(|t| {
            self.states
                .get(t)
                .is_some_and(|state| state.is_terminal())
        });
        if !all_terminal {
            return SchedulerStep {
                newly_failed,
                ..SchedulerStep::default()
            };
        }

        let stage_failed = tasks
            .iter()
            .any(|t| self.states.get(t) == Some(&RunState::DoneFailed));

        if stage_failed && self.pipeline.on_failure == OnFailure::Abort {
            for later in self.pipeline.stages[stage + 1..].iter() {
                for task in &later.tasks {
                    self.states.insert(*task, RunState::Skipped);
                }
            }
            self.status = RunStatus::Aborted { stage };
            warn!(
                pipeline = %self.pipeline.name,
                stage = stage + 1,
                failed = ?self.failed,
                "stage failed; aborting pipeline"
            );
            return SchedulerStep {
                newly_scheduled: Vec::new(),
                newly_failed,
                run_just_finished: true,
            };
        }

        info!(pipeline = %self.pipeline.name, stage = stage + 1, "stage finished");
        let mut step = self.enter_stage(stage + 1);
        step.newly_failed = newly_failed;
        step
    }

    /// Release the first non-empty stage at or after `from`, or complete.
    fn enter_stage(&mut self, from: usize) -> SchedulerStep {
        let mode = self.pipeline.mode;
        for (idx, stage) in self.pipeline.stages.iter().enumerate().skip(from) {
            if stage.tasks.is_empty() {
                continue;
            }

            self.status = RunStatus::Running { stage: idx };
            let mut scheduled = Vec::with_capacity(stage.tasks.len());
            for task in &stage.tasks {
                self.states.insert(*task, RunState::Running);
                scheduled.push(ScheduledTask {
                    task: *task,
                    origin: TaskOrigin::Stage(idx),
                    mode,
                });
            }
            debug!(stage = idx + 1, tasks = ?stage.tasks, "releasing stage");
            return SchedulerStep {
                newly_scheduled: scheduled,
                newly_failed: Vec::new(),
                run_just_finished: false,
            };
        }

        self.status = RunStatus::Completed;
        info!(
            pipeline = %self.pipeline.name,
            failed = self.failed.len(),
            "pipeline completed"
        );
        SchedulerStep {
            newly_scheduled: Vec::new(),
            newly_failed: Vec::new(),
            run_just_finished: true,
        }
    }
}
