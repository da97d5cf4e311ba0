use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitedag::engine::{RuntimeEvent, TaskOutcome};
use sitedag::errors::Result;
use sitedag::exec::ExecutorBackend;
use sitedag::pipeline::ScheduledTask;
use sitedag::tasks::TaskId;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports `TaskProgressed` for long-lived tasks
/// - reports `TaskCompleted(Failed(1))` for tasks marked as failing and
///   `TaskCompleted(Success)` for the rest
pub struct FakeExecutor {
    runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledTask>>>,
    failing: HashSet<TaskId>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledTask>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, task: TaskId) -> Self {
        self.failing.insert(task);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                executed.lock().unwrap().push(t);

                let event = if t.task.is_long_lived() {
                    RuntimeEvent::TaskProgressed {
                        task: t.task,
                        origin: t.origin,
                    }
                } else {
                    let outcome = if failing.contains(&t.task) {
                        TaskOutcome::Failed(1)
                    } else {
                        TaskOutcome::Success
                    };
                    RuntimeEvent::TaskCompleted {
                        task: t.task,
                        origin: t.origin,
                        outcome,
                    }
                };
                tx.send(event).await.map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
