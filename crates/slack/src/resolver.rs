//! Destination name → identifier resolution.

use slackline_core::{Conversation, DestinationId, DestinationKind, Error, Result};

/// Find `name` in a listing. Exact, case-sensitive; the first match wins.
pub fn find_id(listing: &[Conversation], kind: DestinationKind, name: &str) -> Result<DestinationId> {
    listing
        .iter()
        .find(|c| c.name == name)
        .map(|c| DestinationId(c.id.clone()))
        .ok_or_else(|| Error::NotFound {
            kind,
            name: name.to_string(),
        })
}
