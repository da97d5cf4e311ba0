// src/pipeline/mod.rs

//! Pipelines and stage scheduling.
//!
//! - [`model`] defines the fixed `default` / `build` pipelines, single-task
//!   pipelines and the CLI [`Target`].
//! - [`scheduler`] contains the per-run state machine that releases one
//!   stage at a time and holds the barrier between stages.
//! - [`task_info`] provides per-run task states and the scheduled task type.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`validate`] is the static same-stage conflict check.

pub mod model;
pub mod scheduler;
pub mod scheduler_step;
pub mod task_info;
pub mod validate;

pub use model::{OnFailure, Pipeline, PipelineId, Stage, Target};
pub use scheduler::{RunStatus, StageScheduler};
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskOrigin, TaskRunState};
pub use validate::{DataFlowGraph, validate_pipeline};
