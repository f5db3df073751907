//! Human-readable hints for failures a user can fix.

use slackline_core::{ConfigIssue, Error};

/// A follow-up line printed under the error, if one applies.
pub fn explain(err: &Error) -> Option<&'static str> {
    match err {
        Error::ConfigurationInvalid(issue) => match issue {
            ConfigIssue::MissingToken => Some(
                "Please either set environment variable SLACK_TOKEN or specify token using --token.",
            ),
            ConfigIssue::MissingDestination | ConfigIssue::ConflictingDestination => {
                Some("Please specify either group (--group) or channel (--channel), but not both.")
            }
            ConfigIssue::NothingToDo => {
                Some("Please specify either message, file name or running in console mode.")
            }
            ConfigIssue::ConflictingIcon => {
                Some("Please specify either --icon-url or --icon-emoji, not both.")
            }
            ConfigIssue::InvalidEmoji(_) => {
                Some("Emoji codes look like :ghost: (lowercase letters, digits, _ + -).")
            }
            ConfigIssue::ZeroTimeout => Some("Please specify a timeout of at least one second."),
            ConfigIssue::ReadFile { .. } | ConfigIssue::ParseFile { .. } => {
                Some("Check ~/.slackline/config.toml or the file passed with --config.")
            }
        },
        Error::NotFound { .. } => {
            Some("Check the name and that the token's owner is a member of it.")
        }
        Error::RemoteRejected { error, .. } if error == "invalid_auth" || error == "not_authed" => {
            Some("The token was rejected. Check SLACK_TOKEN or --token.")
        }
        Error::Timeout { .. } => Some("Raise the limit with --timeout <secs>."),
        _ => None,
    }
}
