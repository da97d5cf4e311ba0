// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Declaring the glob -> task bindings of the development pipeline.
//! - Evaluating changed paths against every binding in one dispatcher.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about stages; it only turns filesystem changes into
//! task-level triggers.

pub mod bindings;
pub mod dispatcher;
pub mod path_utils;
pub mod watcher;

pub use bindings::{CompiledBinding, WatchBinding, default_bindings};
pub use dispatcher::WatchDispatcher;
pub use watcher::{WatcherHandle, spawn_watcher};
