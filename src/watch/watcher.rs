// src/watch/watcher.rs

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::watch::dispatcher::WatchDispatcher;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch the dispatcher's root recursively and feed every changed path
/// through it. No debouncing: each notify event path is dispatched as is.
pub fn spawn_watcher(
    dispatcher: WatchDispatcher,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("sitedag: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("sitedag: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(dispatcher.root(), RecursiveMode::Recursive)?;

    info!(root = ?dispatcher.root(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in &event.paths {
                if !dispatcher.dispatch(path, &runtime_tx).await {
                    warn!("runtime channel closed; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
