//! Slack integration for slackline.
//!
//! - **client**: authenticated Web API calls (`chat.postMessage`,
//!   `files.upload`, `pins.add`, listings, `rtm.start`)
//! - **resolver**: group/channel name to identifier resolution
//! - **realtime**: RTM WebSocket session: wait-for-text and continuous read

pub mod client;
pub mod realtime;
pub mod resolver;

pub use client::ApiClient;
pub use realtime::{RealtimeSession, SessionState};
pub use resolver::find_id;
