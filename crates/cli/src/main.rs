//! slackline: the command-line entry point.
//!
//! One invocation is one run of the task graph: post a message, upload a
//! file, relay standard input, wait for a message, or print a destination's
//! messages, in any combination.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use slackline_config::{FileConfig, RunConfig, RunOptions};
use slackline_core::Error;
use slackline_workflow::{Executor, SlackTasks};

mod explain;

#[derive(Parser)]
#[command(
    name = "slackline",
    about = "Post to Slack groups and channels from the command line",
    version
)]
struct Cli {
    /// Message text to post
    #[arg(short, long)]
    message: Option<String>,

    /// Private group to post to
    #[arg(short, long)]
    group: Option<String>,

    /// Channel to post to (leading `#` optional)
    #[arg(short, long)]
    channel: Option<String>,

    /// File to upload
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// API token (overrides the config file and SLACK_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Post every line read from standard input
    #[arg(long)]
    console: bool,

    /// Wait until a message with exactly this text arrives
    #[arg(short, long, value_name = "TEXT")]
    wait_for_text: Option<String>,

    /// Seconds to wait for --wait-for-text
    #[arg(short = 's', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Pin the posted message
    #[arg(short, long)]
    pin: bool,

    /// Print messages posted to the destination until the connection closes
    #[arg(short, long)]
    read: bool,

    /// Link @user and #channel mentions
    #[arg(short, long)]
    link_names: bool,

    /// Post as the token's owner
    #[arg(short = 'u', long)]
    as_user: bool,

    /// Bot display name
    #[arg(long)]
    username: Option<String>,

    /// Bot icon image URL
    #[arg(long)]
    icon_url: Option<String>,

    /// Bot icon emoji, e.g. :ghost:
    #[arg(long)]
    icon_emoji: Option<String>,

    /// Config file (default: ~/.slackline/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(self) -> (RunOptions, Option<PathBuf>) {
        let options = RunOptions {
            message: self.message,
            group: self.group,
            channel: self.channel,
            file: self.file,
            token: self.token,
            console: self.console,
            wait_for_text: self.wait_for_text,
            timeout_secs: self.timeout,
            pin: self.pin,
            read: self.read,
            link_names: self.link_names,
            as_user: self.as_user,
            username: self.username,
            icon_url: self.icon_url,
            icon_emoji: self.icon_emoji,
        };
        (options, self.config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries --read output.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = explain::explain(&e) {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let (options, config_path) = cli.options();
    let file = match config_path {
        Some(path) => FileConfig::load_from(&path)?,
        None => FileConfig::load()?,
    };

    let config = RunConfig::from_env(options, file);
    tracing::debug!(?config, "Configuration loaded");

    let tasks = SlackTasks::new(config)?;
    Executor::standard().execute(&tasks).await?;
    Ok(())
}
