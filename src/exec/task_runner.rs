// src/exec/task_runner.rs

//! Batch task runner.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::pipeline::ScheduledTask;
use crate::tasks::TaskContext;

/// Run one batch task on the blocking pool and report its outcome.
///
/// A task that could not run at all (IO failure, panic) completes with
/// `Failed(1)`; per-file problems are already folded into the report's
/// outcome.
pub async fn run_task(
    task: ScheduledTask,
    ctx: Arc<TaskContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let ScheduledTask { task: id, origin, mode } = task;
    debug!(task = %id, ?origin, ?mode, "starting task");

    let joined = tokio::task::spawn_blocking(move || ctx.run(id, mode)).await;
    let outcome = match joined {
        Ok(Ok(report)) => report.outcome,
        Ok(Err(err)) => {
            error!(task = %id, error = ?err, "task could not run");
            TaskOutcome::Failed(1)
        }
        Err(err) => {
            error!(task = %id, error = %err, "task panicked");
            TaskOutcome::Failed(1)
        }
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: id,
            origin,
            outcome,
        })
        .await
    {
        debug!(task = %id, "runtime gone before completion was reported: {err}");
    }
}
