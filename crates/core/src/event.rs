//! Realtime (RTM) events.
//!
//! Every event arriving over the realtime connection is a JSON object with at
//! least a `type` field. Message events also carry `text` and the `channel`
//! they were posted to. Everything else is kept verbatim in `extra`.

use serde::{Deserialize, Serialize};

/// A decoded realtime event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtmEvent {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RtmEvent {
    pub fn is_message(&self) -> bool {
        self.kind == "message"
    }

    /// A message event whose text is exactly `target`.
    pub fn is_message_with_text(&self, target: &str) -> bool {
        self.is_message() && self.text.as_deref() == Some(target)
    }

    /// A message event posted to `channel_id`.
    pub fn is_message_in(&self, channel_id: &str) -> bool {
        self.is_message() && self.channel.as_deref() == Some(channel_id)
    }
}
