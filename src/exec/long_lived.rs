// src/exec/long_lived.rs

//! Start-up of the long-lived tasks.
//!
//! Both report `TaskProgressed` once they are up (server bound, watcher
//! registered) and keep running for the rest of the process. A service
//! that fails to start reports `TaskCompleted` with a failure instead.

use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::paths::Role;
use crate::pipeline::ScheduledTask;
use crate::server::{DevServer, Router};
use crate::tasks::{TaskContext, TaskId};
use crate::watch::{WatchDispatcher, WatcherHandle, default_bindings, spawn_watcher};

/// A running long-lived task. Dropping it stops the watcher; the server
/// thread runs until the process exits.
#[derive(Debug)]
pub enum Service {
    Server { _thread: thread::JoinHandle<()> },
    Watcher { _handle: WatcherHandle },
}

/// Start the service for `task` and report the result to the runtime.
pub async fn start_service(
    task: ScheduledTask,
    ctx: &Arc<TaskContext>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> Option<Service> {
    let started = match task.task {
        TaskId::Server => start_server(ctx),
        TaskId::Watch => start_watcher(ctx, runtime_tx),
        other => Err(anyhow::anyhow!("task '{other}' is not long-lived")),
    };

    let (event, service) = match started {
        Ok(service) => (
            RuntimeEvent::TaskProgressed {
                task: task.task,
                origin: task.origin,
            },
            Some(service),
        ),
        Err(err) => {
            error!(task = %task.task, error = ?err, "failed to start long-lived task");
            (
                RuntimeEvent::TaskCompleted {
                    task: task.task,
                    origin: task.origin,
                    outcome: TaskOutcome::Failed(1),
                },
                None,
            )
        }
    };

    let _ = runtime_tx.send(event).await;
    service
}

fn start_server(ctx: &TaskContext) -> Result<Service> {
    let addr = ctx.config.server.addr();
    let dev = ctx.abs(&ctx.dirs().resolve::<&str>(Role::Dev, &[]));
    let router = Router::new(ctx.fs.clone(), dev, ctx.reload.clone());
    let server = DevServer::bind(&addr, router)?;
    info!(addr = %addr, "dev server bound");

    let handle = thread::Builder::new()
        .name("sitedag-server".to_string())
        .spawn(move || server.run())
        .context("spawning dev server thread")?;
    Ok(Service::Server { _thread: handle })
}

fn start_watcher(ctx: &TaskContext, runtime_tx: &mpsc::Sender<RuntimeEvent>) -> Result<Service> {
    if !ctx.root.is_dir() {
        bail!("watch root {:?} is not a directory", ctx.root);
    }
    let bindings = default_bindings(ctx.dirs());
    let dispatcher = WatchDispatcher::new(&ctx.root, &bindings)?;
    let handle = spawn_watcher(dispatcher, runtime_tx.clone())?;
    Ok(Service::Watcher { _handle: handle })
}
