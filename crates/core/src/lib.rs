//! # slackline core
//!
//! Domain types and error definitions shared by every slackline crate.
//! This crate does no I/O; it defines the vocabulary the API client, the
//! task graph and the CLI speak.

pub mod destination;
pub mod error;
pub mod event;
pub mod record;

// Re-export key types at crate root for ergonomics
pub use destination::{Destination, DestinationId, DestinationKind};
pub use error::{ConfigIssue, Error, Result};
pub use event::RtmEvent;
pub use record::{Conversation, PostOptions, SentMessage, UploadedFile};
