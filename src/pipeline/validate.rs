// src/pipeline/validate.rs

//! Static data-ownership check for a pipeline.
//!
//! Builds a data-flow graph (edge `producer -> consumer` when something the
//! producer writes overlaps something the consumer reads) and rejects:
//! - a task listed more than once
//! - two tasks of one stage writing overlapping outputs
//! - a data-flow edge between two tasks of the same stage, since a stage
//!   gives no ordering guarantee

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{Result, SitedagError};
use crate::pipeline::model::Pipeline;
use crate::tasks::{TaskId, TaskRegistry};

/// Producer -> consumer edges between the tasks of one pipeline.
#[derive(Debug, Clone)]
pub struct DataFlowGraph {
    graph: DiGraphMap<TaskId, ()>,
}

impl DataFlowGraph {
    pub fn build(pipeline: &Pipeline, registry: &TaskRegistry) -> Result<Self> {
        let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
        let tasks: Vec<TaskId> = pipeline.tasks().collect();
        for task in &tasks {
            graph.add_node(*task);
        }

        for producer in &tasks {
            let writes = &registry.def(*producer)?.writes;
            for consumer in &tasks {
                if producer == consumer {
                    continue;
                }
                let reads = &registry.def(*consumer)?.reads;
                let flows = writes.iter().any(|w| reads.iter().any(|r| w.overlaps(r)));
                if flows {
                    graph.add_edge(*producer, *consumer, ());
                }
            }
        }

        Ok(Self { graph })
    }

    /// All edges, sorted for stable output.
    pub fn edges(&self) -> Vec<(TaskId, TaskId)> {
        let mut edges: Vec<(TaskId, TaskId)> =
            self.graph.all_edges().map(|(a, b, _)| (a, b)).collect();
        edges.sort();
        edges
    }

    pub fn consumers_of(&self, task: TaskId) -> Vec<TaskId> {
        let mut out: Vec<TaskId> = self.graph.neighbors(task).collect();
        out.sort();
        out
    }
}

/// Validate `pipeline` against the declared inputs/outputs in `registry`.
pub fn validate_pipeline(pipeline: &Pipeline, registry: &TaskRegistry) -> Result<DataFlowGraph> {
    ensure_unique_tasks(pipeline)?;
    ensure_disjoint_outputs(pipeline, registry)?;

    let flow = DataFlowGraph::build(pipeline, registry)?;
    for (producer, consumer) in flow.edges() {
        if pipeline.stage_of(producer) == pipeline.stage_of(consumer) {
            return Err(SitedagError::PipelineConflict(format!(
                "pipeline '{}': '{consumer}' reads files written by '{producer}' in the same stage",
                pipeline.name
            )));
        }
    }

    debug!(
        pipeline = %pipeline.name,
        edges = flow.edges().len(),
        "pipeline validated"
    );
    Ok(flow)
}

fn ensure_unique_tasks(pipeline: &Pipeline) -> Result<()> {
    let mut seen = HashSet::new();
    for task in pipeline.tasks() {
        if !seen.insert(task) {
            return Err(SitedagError::PipelineConflict(format!(
                "pipeline '{}' lists task '{task}' more than once",
                pipeline.name
            )));
        }
    }
    Ok(())
}

fn ensure_disjoint_outputs(pipeline: &Pipeline, registry: &TaskRegistry) -> Result<()> {
    for stage in &pipeline.stages {
        for (i, a) in stage.tasks.iter().enumerate() {
            for b in stage.tasks.iter().skip(i + 1) {
                let wa = &registry.def(*a)?.writes;
                let wb = &registry.def(*b)?.writes;
                if wa.iter().any(|x| wb.iter().any(|y| x.overlaps(y))) {
                    return Err(SitedagError::PipelineConflict(format!(
                        "pipeline '{}': '{a}' and '{b}' write overlapping outputs in the same stage",
                        pipeline.name
                    )));
                }
            }
        }
    }
    Ok(())
}
