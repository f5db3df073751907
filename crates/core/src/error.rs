//! Error types for slackline.
//!
//! Uses `thiserror` for ergonomic error definitions. Every failure that can
//! end a run is one variant of [`Error`]; configuration problems carry a
//! [`ConfigIssue`] so the CLI can map them to a friendly explanation.

use std::path::PathBuf;
use thiserror::Error;

use crate::destination::DestinationKind;

/// The top-level error type for all slackline operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(#[from] ConfigIssue),

    // --- Resolution errors ---
    #[error("{kind} not found: {name}")]
    NotFound { kind: DestinationKind, name: String },

    // --- Remote API errors ---
    #[error("Transport failure calling {method}: {reason}")]
    TransportFailure { method: String, reason: String },

    #[error("Slack rejected {method}: {error}")]
    RemoteRejected { method: String, error: String },

    // --- Local I/O ---
    #[error("Cannot read file {path}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Failed to read standard input: {0}")]
    Stdin(String),

    // --- Realtime session ---
    #[error("rtm.start did not return a session url")]
    NoSessionUrl,

    #[error("Timed out after {timeout_secs}s waiting for text")]
    Timeout { timeout_secs: u64 },

    #[error("Realtime connection closed by remote side")]
    ConnectionClosed,

    #[error("Realtime connection error: {0}")]
    Realtime(String),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn transport(method: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TransportFailure {
            method: method.into(),
            reason: reason.to_string(),
        }
    }
}

/// A configuration problem detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("SLACK_TOKEN not found")]
    MissingToken,

    #[error("group or channel not found")]
    MissingDestination,

    #[error("both group and channel specified")]
    ConflictingDestination,

    #[error("nothing to do")]
    NothingToDo,

    #[error("icon_url and icon_emoji are mutually exclusive")]
    ConflictingIcon,

    #[error("invalid emoji code: {0}")]
    InvalidEmoji(String),

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("failed to read config file at {path}: {reason}")]
    ReadFile { path: PathBuf, reason: String },

    #[error("failed to parse config file at {path}: {reason}")]
    ParseFile { path: PathBuf, reason: String },
}
