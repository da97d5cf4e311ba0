// src/server/reload.rs

//! Live-reload event hub.
//!
//! Tasks publish [`ReloadEvent`]s after they changed files; every connected
//! browser long-polls the hub with the last sequence number it saw and gets
//! the events published since then, coalesced into one.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Events kept for clients that poll with an older sequence number.
const HISTORY: usize = 32;

/// What connected browsers should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReloadEvent {
    /// Reload the whole page.
    Reload,
    /// Re-fetch only these stylesheets (URL paths below the server root).
    InjectCss { paths: Vec<String> },
}

/// Body of a poll response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResponse {
    pub seq: u64,
    pub event: Option<ReloadEvent>,
}

#[derive(Debug, Default)]
struct HubState {
    seq: u64,
    history: VecDeque<(u64, ReloadEvent)>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<HubState>,
    changed: Condvar,
}

/// Cloneable handle; all clones publish to and read from the same hub.
#[derive(Debug, Clone, Default)]
pub struct ReloadHub {
    shared: Arc<Shared>,
}

impl ReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish an event and wake every waiting poller.
    pub fn notify(&self, event: ReloadEvent) {
        let mut state = self.lock();
        state.seq += 1;
        let seq = state.seq;
        debug!(seq, ?event, "live-reload event");
        state.history.push_back((seq, event));
        while state.history.len() > HISTORY {
            state.history.pop_front();
        }
        drop(state);
        self.shared.changed.notify_all();
    }

    /// Sequence number of the latest event (0 before the first one).
    pub fn sequence(&self) -> u64 {
        self.lock().seq
    }

    /// Block until an event newer than `since` exists or `timeout` elapses.
    ///
    /// Returns `None` on timeout. Several pending events are merged: any
    /// full reload wins, otherwise the stylesheet lists are concatenated.
    /// A client that fell out of the history window gets a full reload.
    pub fn wait_after(&self, since: u64, timeout: Duration) -> Option<PollResponse> {
        let state = self.lock();
        let (state, _) = self
            .shared
            .changed
            .wait_timeout_while(state, timeout, |s| s.seq <= since)
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.seq <= since {
            return None;
        }

        let missed = state
            .history
            .front()
            .is_none_or(|(oldest, _)| *oldest > since + 1);
        let event = if missed {
            ReloadEvent::Reload
        } else {
            coalesce(state.history.iter().filter(|(seq, _)| *seq > since).map(|(_, e)| e))
        };

        Some(PollResponse {
            seq: state.seq,
            event: Some(event),
        })
    }
}

fn coalesce<'a>(events: impl Iterator<Item = &'a ReloadEvent>) -> ReloadEvent {
    let mut paths: Vec<String> = Vec::new();
    for event in events {
        match event {
            ReloadEvent::Reload => return ReloadEvent::Reload,
            ReloadEvent::InjectCss { paths: more } => {
                for p in more {
                    if !paths.contains(p) {
                        paths.push(p.clone());
                    }
                }
            }
        }
    }
    ReloadEvent::InjectCss { paths }
}
