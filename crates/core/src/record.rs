//! Records produced by the remote API and passed between tasks.

use serde::{Deserialize, Serialize};

use crate::destination::DestinationId;

/// One entry of a `groups.list` / `channels.list` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
}

/// Result of a successful `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Where the message landed
    pub channel: DestinationId,

    /// Server-assigned message timestamp, also the message's key for pinning
    pub ts: String,
}

/// Result of a successful `files.upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: String,

    /// File name as stored by Slack
    pub name: String,

    /// Team-private permalink
    pub permalink: String,

    /// Public permalink (may be empty when public sharing is disabled)
    #[serde(default)]
    pub permalink_public: String,

    /// The destination the file was shared to
    pub channel: DestinationId,
}

/// Options that shape how a message is posted.
///
/// Shared by every task that calls `chat.postMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOptions {
    /// Turn `@user` and `#channel` mentions into links
    pub link_names: bool,

    /// Post as the token's owner instead of the bot identity
    pub as_user: bool,

    /// Bot display name override
    pub username: Option<String>,

    /// Bot icon image URL
    pub icon_url: Option<String>,

    /// Bot icon emoji, e.g. `:ghost:`
    pub icon_emoji: Option<String>,
}
