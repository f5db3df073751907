//! Dependency-ordered task execution.
//!
//! The [`Executor`] walks a [`TaskGraph`], starting each task once every one
//! of its prerequisites has finished. Tasks whose prerequisites are all done
//! run concurrently on the caller's runtime; nothing is spawned. The first
//! failure ends the run and drops whatever else is still in flight.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use slackline_core::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::graph::{GraphError, TaskGraph, TaskName};
use crate::pipe::{Pipe, TaskOutput};

/// Runs one task given the results of its prerequisites.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Execute `task`. `pipe` holds only the slots of `task`'s prerequisites.
    async fn run(&self, task: TaskName, pipe: Pipe) -> Result<TaskOutput>;
}

/// Drives a [`TaskGraph`] to completion.
#[derive(Debug, Clone)]
pub struct Executor {
    graph: TaskGraph,
}

impl Executor {
    pub fn new(graph: TaskGraph) -> Self {
        Self { graph }
    }

    /// An executor over [`TaskGraph::standard`].
    pub fn standard() -> Self {
        Self::new(TaskGraph::standard())
    }

    /// Run every task in the graph and return the filled pipe.
    pub async fn execute<R>(&self, runner: &R) -> Result<Pipe>
    where
        R: TaskRunner + ?Sized,
    {
        let total = self.graph.nodes().len();
        let mut pipe = Pipe::default();
        let mut started: HashSet<TaskName> = HashSet::with_capacity(total);
        let mut done: HashSet<TaskName> = HashSet::with_capacity(total);
        let mut in_flight = FuturesUnordered::new();

        loop {
            for node in self.graph.nodes() {
                if started.contains(&node.task) || !node.deps.iter().all(|d| done.contains(d)) {
                    continue;
                }
                started.insert(node.task);
                debug!(task = %node.task, "Starting task");

                let task = node.task;
                let view = pipe.view(&node.deps);
                in_flight.push(async move { (task, runner.run(task, view).await) });
            }

            let Some((task, outcome)) = in_flight.next().await else {
                break;
            };

            let output = match outcome {
                Ok(output) => output,
                Err(e) => {
                    debug!(task = %task, error = %e, dropped = in_flight.len(), "Task failed");
                    return Err(e);
                }
            };

            debug!(task = %task, skipped = output.is_skipped(), "Task finished");
            pipe.record(task, output).map_err(internal)?;
            done.insert(task);
        }

        if done.len() != total {
            let stuck = self
                .graph
                .nodes()
                .iter()
                .find(|n| !done.contains(&n.task))
                .map(|n| n.task)
                .unwrap_or(TaskName::CheckArgs);
            return Err(internal(GraphError::Cycle(stuck)));
        }

        info!(tasks = total, "All tasks finished");
        Ok(pipe)
    }
}

fn internal(e: GraphError) -> Error {
    Error::Internal(e.to_string())
}
