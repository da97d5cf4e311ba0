// src/watch/dispatcher.rs

//! Turns changed paths into task triggers.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::tasks::TaskId;
use crate::watch::bindings::{CompiledBinding, WatchBinding};
use crate::watch::path_utils::relative_str;

/// Evaluates every changed path against all bindings.
#[derive(Debug, Clone)]
pub struct WatchDispatcher {
    root: PathBuf,
    bindings: Vec<CompiledBinding>,
}

impl WatchDispatcher {
    pub fn new(root: impl Into<PathBuf>, bindings: &[WatchBinding]) -> Result<Self> {
        let bindings = bindings
            .iter()
            .map(WatchBinding::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            root: root.into(),
            bindings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tasks triggered by a root-relative path, in binding order. A task
    /// named by several matching bindings is listed once.
    pub fn tasks_for(&self, rel: &str) -> Vec<TaskId> {
        let mut tasks = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.matches(rel)) {
            for task in &binding.binding().tasks {
                if !tasks.contains(task) {
                    tasks.push(*task);
                }
            }
        }
        tasks
    }

    /// Tasks triggered by a path as reported by the watcher.
    pub fn tasks_for_path(&self, path: &Path) -> Vec<TaskId> {
        match relative_str(&self.root, path) {
            Some(rel) => self.tasks_for(&rel),
            None => {
                warn!(?path, root = ?self.root, "changed path is outside the watch root");
                Vec::new()
            }
        }
    }

    /// Send one trigger per matched task. Returns `false` once the runtime
    /// channel is closed.
    pub async fn dispatch(&self, path: &Path, runtime_tx: &mpsc::Sender<RuntimeEvent>) -> bool {
        for task in self.tasks_for_path(path) {
            debug!(%task, ?path, "watch match -> triggering task");
            let event = RuntimeEvent::TaskTriggered {
                task,
                reason: TriggerReason::FileWatch,
            };
            if let Err(err) = runtime_tx.send(event).await {
                warn!("failed to send RuntimeEvent::TaskTriggered: {err}");
                return false;
            }
        }
        true
    }
}
