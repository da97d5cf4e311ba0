// src/exec/executor_loop.rs

//! Main executor loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::exec::long_lived::{Service, start_service};
use crate::exec::task_runner::run_task;
use crate::pipeline::ScheduledTask;
use crate::tasks::{TaskContext, TaskId};

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what `RealExecutorBackend`
/// forwards to. Batch tasks each run in their own Tokio task; several runs
/// of the same task may overlap. Long-lived tasks are started at most once:
/// scheduling one that is already up synthesizes a `TaskProgressed` event so
/// the scheduler treats it as satisfied.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: Arc<TaskContext>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut services: HashMap<TaskId, Service> = HashMap::new();

        while let Some(task) = rx.recv().await {
            handle_scheduled_task(task, &ctx, &mut services, &runtime_tx).await;
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

async fn handle_scheduled_task(
    task: ScheduledTask,
    ctx: &Arc<TaskContext>,
    services: &mut HashMap<TaskId, Service>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    if !task.task.is_long_lived() {
        let ctx = Arc::clone(ctx);
        let rt_tx = runtime_tx.clone();
        tokio::spawn(async move {
            run_task(task, ctx, rt_tx).await;
        });
        return;
    }

    if services.contains_key(&task.task) {
        debug!(task = %task.task, "already running; synthesizing progress event");
        let _ = runtime_tx
            .send(RuntimeEvent::TaskProgressed {
                task: task.task,
                origin: task.origin,
            })
            .await;
        return;
    }

    if let Some(service) = start_service(task, ctx, runtime_tx).await {
        services.insert(task.task, service);
    }
}
