//! The fixed task graph.
//!
//! ```text
//! checkArgs
//!  ├─ groups ─── groupId ───┐
//!  └─ channels ─ channelId ─┤
//!                           ├─ sendMessage ── pin
//!                           ├─ uploadFile ─── sendFileMessage
//!                           ├─ sendConsoleMessage
//!                           ├─ waitForText
//!                           └─ read
//! ```
//!
//! Every action depends on both identifier tasks; the one for the kind that
//! was not selected is skipped, so actions start as soon as the selected
//! destination is resolved.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every named step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskName {
    CheckArgs,
    Groups,
    GroupId,
    Channels,
    ChannelId,
    SendMessage,
    Pin,
    UploadFile,
    SendFileMessage,
    SendConsoleMessage,
    WaitForText,
    Read,
}

impl TaskName {
    /// All tasks, in declaration order.
    pub const ALL: [TaskName; 12] = [
        TaskName::CheckArgs,
        TaskName::Groups,
        TaskName::GroupId,
        TaskName::Channels,
        TaskName::ChannelId,
        TaskName::SendMessage,
        TaskName::Pin,
        TaskName::UploadFile,
        TaskName::SendFileMessage,
        TaskName::SendConsoleMessage,
        TaskName::WaitForText,
        TaskName::Read,
    ];

    /// Prerequisites of this task in the standard graph.
    pub fn deps(self) -> &'static [TaskName] {
        const RESOLVED: &[TaskName] = &[TaskName::GroupId, TaskName::ChannelId];
        match self {
            TaskName::CheckArgs => &[],
            TaskName::Groups | TaskName::Channels => &[TaskName::CheckArgs],
            TaskName::GroupId => &[TaskName::Groups],
            TaskName::ChannelId => &[TaskName::Channels],
            TaskName::Pin => &[TaskName::SendMessage],
            TaskName::SendFileMessage => &[TaskName::UploadFile],
            TaskName::SendMessage
            | TaskName::UploadFile
            | TaskName::SendConsoleMessage
            | TaskName::WaitForText
            | TaskName::Read => RESOLVED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::CheckArgs => "checkArgs",
            TaskName::Groups => "groups",
            TaskName::GroupId => "groupId",
            TaskName::Channels => "channels",
            TaskName::ChannelId => "channelId",
            TaskName::SendMessage => "sendMessage",
            TaskName::Pin => "pin",
            TaskName::UploadFile => "uploadFile",
            TaskName::SendFileMessage => "sendFileMessage",
            TaskName::SendConsoleMessage => "sendConsoleMessage",
            TaskName::WaitForText => "waitForText",
            TaskName::Read => "read",
        }
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed graph or a task result that does not fit its slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("task {task} depends on {dependency}, which is not in the graph")]
    UnknownDependency { task: TaskName, dependency: TaskName },

    #[error("task {0} is declared twice")]
    Duplicate(TaskName),

    #[error("dependency cycle through {0}")]
    Cycle(TaskName),

    #[error("task {task} produced a {output} result")]
    UnexpectedOutput { task: TaskName, output: &'static str },

    #[error("result for task {0} already recorded")]
    AlreadyRecorded(TaskName),
}

/// One task with its prerequisites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub task: TaskName,
    pub deps: Vec<TaskName>,
}

/// A validated, acyclic set of tasks.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<Node>,
}

impl TaskGraph {
    /// The full graph every run uses.
    pub fn standard() -> Self {
        let nodes = TaskName::ALL
            .iter()
            .map(|&task| Node {
                task,
                deps: task.deps().to_vec(),
            })
            .collect();
        Self { nodes }
    }

    /// Build a graph, rejecting unknown dependencies, duplicates and cycles.
    pub fn new(nodes: Vec<Node>) -> Result<Self, GraphError> {
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.task) {
                return Err(GraphError::Duplicate(node.task));
            }
        }
        for node in &nodes {
            if let Some(&dependency) = node.deps.iter().find(|d| !seen.contains(*d)) {
                return Err(GraphError::UnknownDependency {
                    task: node.task,
                    dependency,
                });
            }
        }

        let graph = Self { nodes };
        graph.topological_order()?;
        Ok(graph)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Kahn's algorithm; fails on the first task left inside a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskName>, GraphError> {
        let mut remaining: HashMap<TaskName, usize> = self
            .nodes
            .iter()
            .map(|n| (n.task, n.deps.len()))
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while order.len() < self.nodes.len() {
            let ready: Vec<TaskName> = self
                .nodes
                .iter()
                .filter(|n| remaining.get(&n.task) == Some(&0))
                .map(|n| n.task)
                .collect();

            if ready.is_empty() {
                let stuck = self
                    .nodes
                    .iter()
                    .find(|n| remaining.contains_key(&n.task))
                    .map(|n| n.task)
                    .unwrap_or(TaskName::CheckArgs);
                return Err(GraphError::Cycle(stuck));
            }

            for task in ready {
                remaining.remove(&task);
                order.push(task);
                for node in &self.nodes {
                    if node.deps.contains(&task) {
                        if let Some(count) = remaining.get_mut(&node.task) {
                            *count -= 1;
                        }
                    }
                }
            }
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(task: TaskName, deps: &[TaskName]) -> Node {
        Node {
            task,
            deps: deps.to_vec(),
        }
    }

    #[test]
    fn standard_graph_is_valid() {
        let graph = TaskGraph::new(TaskGraph::standard().nodes().to_vec()).unwrap();
        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), TaskName::ALL.len());
        assert_eq!(order[0], TaskName::CheckArgs);
    }

    #[test]
    fn resolution_precedes_every_action() {
        let order = TaskGraph::standard().topological_order().unwrap();
        let pos = |t: TaskName| order.iter().position(|&o| o == t).unwrap();
        for action in [
            TaskName::SendMessage,
            TaskName::UploadFile,
            TaskName::SendConsoleMessage,
            TaskName::WaitForText,
            TaskName::Read,
        ] {
            assert!(pos(TaskName::GroupId) < pos(action));
            assert!(pos(TaskName::ChannelId) < pos(action));
        }
        assert!(pos(TaskName::SendMessage) < pos(TaskName::Pin));
        assert!(pos(TaskName::UploadFile) < pos(TaskName::SendFileMessage));
    }

    #[test]
    fn unknown_dependency_rejected() {
        let err = TaskGraph::new(vec![node(TaskName::Pin, &[TaskName::SendMessage])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                task: TaskName::Pin,
                dependency: TaskName::SendMessage
            }
        );
    }

    #[test]
    fn cycle_rejected() {
        let err = TaskGraph::new(vec![
            node(TaskName::CheckArgs, &[]),
            node(TaskName::SendMessage, &[TaskName::Pin]),
            node(TaskName::Pin, &[TaskName::SendMessage]),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn duplicate_rejected() {
        let err = TaskGraph::new(vec![node(TaskName::Read, &[]), node(TaskName::Read, &[])])
            .unwrap_err();
        assert_eq!(err, GraphError::Duplicate(TaskName::Read));
    }

    #[test]
    fn names_render_camel_case() {
        assert_eq!(TaskName::SendFileMessage.to_string(), "sendFileMessage");
        assert_eq!(
            serde_json::to_string(&TaskName::WaitForText).unwrap(),
            "\"waitForText\""
        );
    }
}
