// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::RunSummary;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Async shell around [`CoreRuntime`].
///
/// Feeds every `RuntimeEvent` into the core and carries out the commands it
/// returns through an [`ExecutorBackend`]. All pipeline semantics live in the
/// core; this type only moves data between channels and the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Release the first stage, then process events until the core asks to
    /// stop or every sender is gone. Returns where the pipeline ended up.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("sitedag runtime started");

        let first = self.core.start();
        let mut running = self.apply(first).await?;

        while running {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed");
                break;
            };
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            running = self.apply(step).await?;
        }

        let summary = self.core.summary();
        info!(pipeline = %summary.pipeline, status = ?summary.status, "runtime stopped");
        Ok(summary)
    }

    /// Carry out one step's commands; returns `keep_running`.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) if tasks.is_empty() => {}
                CoreCommand::DispatchTasks(tasks) => {
                    let names: Vec<&str> = tasks.iter().map(|t| t.task.name()).collect();
                    debug!(?names, "dispatching tasks");
                    self.executor.spawn_ready_tasks(tasks).await?;
                }
                // `keep_running` already carries the decision.
                CoreCommand::RequestExit => info!("core requested exit"),
            }
        }
        Ok(step.keep_running)
    }
}
