//! Workflow engine for one slackline run.
//!
//! A run is a fixed [`TaskGraph`]: validate arguments, resolve the
//! destination, then perform whichever actions were requested. The
//! [`Executor`] starts each task once its prerequisites are done, feeding it
//! a read-only [`Pipe`] view of their results, and stops at the first
//! failure. [`SlackTasks`] supplies the task behavior.

pub mod executor;
pub mod graph;
pub mod pipe;
pub mod relay;
pub mod tasks;

pub use executor::{Executor, TaskRunner};
pub use graph::{GraphError, Node, TaskGraph, TaskName};
pub use pipe::{Pipe, TaskOutput};
pub use relay::relay_lines;
pub use tasks::SlackTasks;
