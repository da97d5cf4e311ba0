// src/exec/backend.rs

//! Seam between the runtime and task execution.
//!
//! The runtime hands released tasks to an [`ExecutorBackend`]. In production
//! that is [`RealExecutorBackend`], which forwards them to the executor loop
//! in [`executor_loop`](super::executor_loop); tests substitute a backend
//! that answers with `RuntimeEvent`s directly and never touches the disk.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::pipeline::ScheduledTask;
use crate::tasks::TaskContext;

use super::executor_loop::spawn_executor;

/// Runs whatever the core dispatches.
///
/// Implementations report back on the runtime event channel: a batch task
/// with `TaskCompleted`, a long-lived task with `TaskProgressed` once it is
/// up.
pub trait ExecutorBackend: Send {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Backend used by `sitedag` itself.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Starts the executor loop right away; it runs tasks against `ctx` and
    /// reports to `runtime_tx`.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, ctx: Arc<TaskContext>) -> Self {
        Self {
            tx: spawn_executor(runtime_tx, ctx),
        }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();
        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
