// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fileset;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod server;
pub mod tasks;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::engine::{CoreRuntime, RunSummary, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::SitedagError;
use crate::exec::RealExecutorBackend;
use crate::paths::{Role, to_slash};
use crate::pipeline::{DataFlowGraph, Pipeline, RunStatus, StageScheduler, Target, validate_pipeline};
use crate::tasks::{TaskContext, TaskId};
use crate::watch::default_bindings;

/// Resolve the target from `args`, check its pipeline, then either print
/// the plan (`--dry-run`) or run it to completion.
pub async fn run(args: CliArgs) -> Result<()> {
    let root = PathBuf::from(&args.root);
    let cfg = load_or_default(&root, args.config.as_deref().map(Path::new))?;

    let target: Target = args.target.parse().map_err(SitedagError::UnknownTarget)?;
    let pipeline = Pipeline::for_target(target);

    let ctx = Arc::new(TaskContext::new(root, cfg));
    let flow = validate_pipeline(&pipeline, &ctx.registry)?;

    if args.dry_run {
        print_dry_run(&ctx, &pipeline, &flow);
        return Ok(());
    }

    let long_lived = pipeline.has_long_lived();
    let summary = run_pipeline(ctx, pipeline).await?;
    check_summary(&summary, long_lived)?;
    Ok(())
}

/// Run `pipeline` with the real executor until it finishes or the process
/// is interrupted.
pub async fn run_pipeline(ctx: Arc<TaskContext>, pipeline: Pipeline) -> Result<RunSummary> {
    let (events_tx, events_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(events_tx.clone(), ctx);

    tokio::spawn(forward_ctrl_c(events_tx));

    let options = RuntimeOptions {
        exit_when_done: !pipeline.has_long_lived(),
    };
    info!(pipeline = %pipeline.name, ?options, "running pipeline");

    let core = CoreRuntime::new(StageScheduler::new(pipeline), options);
    Ok(Runtime::new(core, events_rx, executor).run().await?)
}

async fn forward_ctrl_c(events: mpsc::Sender<RuntimeEvent>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("interrupted, stopping");
            // The runtime may already be gone.
            let _ = events.send(RuntimeEvent::ShutdownRequested).await;
        }
        Err(err) => warn!(error = %err, "Ctrl-C handler unavailable"),
    }
}

/// Map the end state of a run to the process result.
///
/// A pipeline with long-lived tasks only ends by interruption, which is a
/// normal exit. A batch pipeline must have completed.
pub fn check_summary(summary: &RunSummary, long_lived: bool) -> errors::Result<()> {
    match summary.status {
        RunStatus::Aborted { stage } => Err(SitedagError::PipelineFailed {
            pipeline: summary.pipeline.clone(),
            stage: stage + 1,
            tasks: summary
                .failed
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", "),
        }),
        RunStatus::Completed => Ok(()),
        RunStatus::Running { .. } if long_lived && summary.interrupted => Ok(()),
        status => Err(SitedagError::Other(anyhow::anyhow!(
            "pipeline '{}' stopped before it finished ({status:?})",
            summary.pipeline
        ))),
    }
}

/// Print directories, stages, task inputs/outputs, watch bindings and the
/// data-flow edges without running anything.
fn print_dry_run(ctx: &TaskContext, pipeline: &Pipeline, flow: &DataFlowGraph) {
    let dirs = ctx.dirs();
    println!("sitedag dry-run");
    println!("  root = {:?}", ctx.root);
    for role in [Role::Src, Role::Dev, Role::Dist, Role::Assets, Role::ProjectRoot] {
        println!("  dirs.{role} = {:?}", dirs.get(role));
    }
    println!();

    println!(
        "pipeline {} ({:?}, {:?}):",
        pipeline.name, pipeline.mode, pipeline.on_failure
    );
    for (idx, stage) in pipeline.stages.iter().enumerate() {
        let names: Vec<&str> = stage.tasks.iter().map(|t| t.name()).collect();
        println!("  stage {}: {}", idx + 1, names.join(", "));
    }
    println!();

    println!("tasks:");
    for task in pipeline.tasks() {
        println!("  - {task}");
        let Ok(def) = ctx.registry.def(task) else {
            continue;
        };
        if let Some(ref source) = def.source {
            println!("      input: {:?}", source.rooted_patterns());
            if !source.exclude.is_empty() {
                println!("      exclude (under {}): {:?}", to_slash(&source.base), source.exclude);
            }
        }
        if let Some(ref dest) = def.dest {
            println!("      output: {}", to_slash(dest));
        }
        if task.is_long_lived() {
            println!("      long_lived: true");
        }
    }

    if pipeline.tasks().any(|t| t == TaskId::Watch) {
        println!();
        println!("watch bindings:");
        for binding in default_bindings(dirs) {
            let names: Vec<&str> = binding.tasks.iter().map(|t| t.name()).collect();
            println!("  {} -> {}", binding.pattern, names.join(", "));
        }
    }

    let edges = flow.edges();
    if !edges.is_empty() {
        println!();
        println!("data flow:");
        for (producer, consumer) in edges {
            println!("  {producer} -> {consumer}");
        }
    }

    debug!(pipeline = %pipeline.name, "dry-run printed");
}
