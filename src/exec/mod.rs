// src/exec/mod.rs

//! Runs dispatched tasks and reports back as `RuntimeEvent`s.
//!
//! [`executor_loop`] receives batches and keeps the long-lived services
//! alive, [`task_runner`] runs one batch task on the blocking pool and
//! [`long_lived`] starts the dev server and the watcher. The runtime only
//! sees the [`backend::ExecutorBackend`] trait, so tests swap in a fake.

pub mod backend;
pub mod executor_loop;
pub mod long_lived;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
