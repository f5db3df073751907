//! Configuration loading, merging, and validation for slackline.
//!
//! A run's configuration comes from three places: command-line options, an
//! optional `~/.slackline/config.toml`, and the `SLACK_TOKEN` environment
//! variable. They are merged once into an immutable [`RunConfig`] which is
//! validated before any network call.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use slackline_core::{ConfigIssue, Destination, PostOptions};

/// Environment variable supplying the default API token.
pub const TOKEN_ENV: &str = "SLACK_TOKEN";

/// Default Slack Web API base URL.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Default wait-for-text timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

static EMOJI_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[a-z0-9_+\-]+:$").expect("emoji pattern is valid"));

/// Whether `code` looks like a Slack emoji code such as `:ghost:`.
pub fn is_emoji_code(code: &str) -> bool {
    EMOJI_CODE.is_match(code)
}

/// The on-disk configuration file.
///
/// Maps directly to `~/.slackline/config.toml`. Every field is optional.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// API token used when `--token` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Override the Web API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Default wait-for-text timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,

    #[serde(default)]
    pub as_user: bool,

    #[serde(default)]
    pub link_names: bool,
}

impl std::fmt::Debug for FileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfig")
            .field("token", &redact(&self.token))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("username", &self.username)
            .field("icon_url", &self.icon_url)
            .field("icon_emoji", &self.icon_emoji)
            .field("as_user", &self.as_user)
            .field("link_names", &self.link_names)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl FileConfig {
    /// Load from the default path (`~/.slackline/config.toml`).
    pub fn load() -> Result<Self, ConfigIssue> {
        Self::load_from(&Self::config_dir().join("config.toml"))
    }

    /// Load from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigIssue> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigIssue::ReadFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigIssue::ParseFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".slackline")
    }
}

/// Options as given on the command line, before merging.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub message: Option<String>,
    pub group: Option<String>,
    pub channel: Option<String>,
    pub file: Option<PathBuf>,
    pub token: Option<String>,
    pub console: bool,
    pub wait_for_text: Option<String>,
    pub timeout_secs: Option<u64>,
    pub pin: bool,
    pub read: bool,
    pub link_names: bool,
    pub as_user: bool,
    pub username: Option<String>,
    pub icon_url: Option<String>,
    pub icon_emoji: Option<String>,
}

/// The merged, read-only configuration of one run.
#[derive(Clone)]
pub struct RunConfig {
    /// API token (flag, then config file, then `SLACK_TOKEN`)
    pub token: Option<String>,

    /// Web API base URL without trailing slash
    pub api_base: String,

    pub group: Option<String>,
    pub channel: Option<String>,

    /// Text to post
    pub message: Option<String>,

    /// File to upload
    pub file: Option<PathBuf>,

    /// Relay standard input line by line
    pub console: bool,

    /// Block until a message with exactly this text arrives
    pub wait_for_text: Option<String>,

    /// How long to wait for `wait_for_text`
    pub timeout: Duration,

    /// Pin the posted message
    pub pin: bool,

    /// Print incoming messages for the destination until the connection closes
    pub read: bool,

    /// Shared `chat.postMessage` options
    pub post: PostOptions,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("token", &redact(&self.token))
            .field("api_base", &self.api_base)
            .field("group", &self.group)
            .field("channel", &self.channel)
            .field("message", &self.message)
            .field("file", &self.file)
            .field("console", &self.console)
            .field("wait_for_text", &self.wait_for_text)
            .field("timeout", &self.timeout)
            .field("pin", &self.pin)
            .field("read", &self.read)
            .field("post", &self.post)
            .finish()
    }
}

impl RunConfig {
    /// Merge command-line options with the config file and `SLACK_TOKEN`.
    pub fn from_env(options: RunOptions, file: FileConfig) -> Self {
        Self::merge(options, file, std::env::var(TOKEN_ENV).ok())
    }

    /// Merge the three sources. Command-line options win over the file; the
    /// environment token is only used when neither names one.
    pub fn merge(options: RunOptions, file: FileConfig, env_token: Option<String>) -> Self {
        let token = options
            .token
            .or(file.token)
            .or(env_token)
            .filter(|t| !t.trim().is_empty());

        let api_base = file
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = options
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            token,
            api_base,
            group: options.group,
            channel: options.channel,
            message: options.message,
            file: options.file,
            console: options.console,
            wait_for_text: options.wait_for_text,
            timeout: Duration::from_secs(timeout_secs),
            pin: options.pin,
            read: options.read,
            post: PostOptions {
                link_names: options.link_names || file.link_names,
                as_user: options.as_user || file.as_user,
                username: options.username.or(file.username),
                icon_url: options.icon_url.or(file.icon_url),
                icon_emoji: options.icon_emoji.or(file.icon_emoji),
            },
        }
    }

    /// Whether any action (post, upload, relay, wait, read) was requested.
    pub fn has_action(&self) -> bool {
        self.message.is_some()
            || self.file.is_some()
            || self.console
            || self.wait_for_text.is_some()
            || self.read
    }

    /// The selected destination, if exactly one was configured.
    pub fn destination(&self) -> Result<Destination, ConfigIssue> {
        Destination::select(self.group.as_deref(), self.channel.as_deref())
    }

    /// Validate the configuration, returning the selected destination.
    pub fn validate(&self) -> Result<Destination, ConfigIssue> {
        if self.token.is_none() {
            return Err(ConfigIssue::MissingToken);
        }

        let destination = self.destination()?;

        if !self.has_action() {
            return Err(ConfigIssue::NothingToDo);
        }

        if self.post.icon_url.is_some() && self.post.icon_emoji.is_some() {
            return Err(ConfigIssue::ConflictingIcon);
        }

        if let Some(emoji) = &self.post.icon_emoji {
            if !is_emoji_code(emoji) {
                return Err(ConfigIssue::InvalidEmoji(emoji.clone()));
            }
        }

        if self.wait_for_text.is_some() && self.timeout.is_zero() {
            return Err(ConfigIssue::ZeroTimeout);
        }

        Ok(destination)
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}
