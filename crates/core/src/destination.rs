//! Destinations: the group or channel a run targets.
//!
//! A run targets exactly one destination, named either as a private group or
//! as a public channel. The name is resolved once to a [`DestinationId`]
//! which every downstream call uses.

use serde::{Deserialize, Serialize};

use crate::error::ConfigIssue;

/// The two kinds of conversation a destination can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    Group,
    Channel,
}

impl DestinationKind {
    /// Web API method returning the full listing for this kind.
    pub fn list_method(self) -> &'static str {
        match self {
            Self::Group => "groups.list",
            Self::Channel => "channels.list",
        }
    }

    /// Key of the listing array in the `*.list` response body.
    pub fn listing_key(self) -> &'static str {
        match self {
            Self::Group => "groups",
            Self::Channel => "channels",
        }
    }
}

impl std::fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Channel => write!(f, "channel"),
        }
    }
}

/// A configured destination name together with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub kind: DestinationKind,
    pub name: String,
}

impl Destination {
    /// Pick the single destination out of the group/channel options.
    ///
    /// Exactly one of the two must be set.
    pub fn select(group: Option<&str>, channel: Option<&str>) -> Result<Self, ConfigIssue> {
        match (group, channel) {
            (Some(name), None) => Ok(Self {
                kind: DestinationKind::Group,
                name: name.to_string(),
            }),
            (None, Some(name)) => Ok(Self {
                kind: DestinationKind::Channel,
                name: name.trim_start_matches('#').to_string(),
            }),
            (Some(_), Some(_)) => Err(ConfigIssue::ConflictingDestination),
            (None, None) => Err(ConfigIssue::MissingDestination),
        }
    }
}

/// Opaque identifier of a resolved group or channel (e.g. `G024BE91L`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(pub String);

impl DestinationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DestinationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DestinationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
