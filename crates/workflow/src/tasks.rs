//! The Slack-backed task runner.
//!
//! [`SlackTasks`] gives every [`TaskName`] its behavior against the Web API
//! and realtime session. Each task checks its own triggering option first and
//! returns [`TaskOutput::Skipped`] when it has nothing to do.

use async_trait::async_trait;
use slackline_config::RunConfig;
use slackline_core::{Conversation, DestinationId, DestinationKind, Error, Result, UploadedFile};
use slackline_slack::{ApiClient, RealtimeSession, find_id};
use tokio::io::{AsyncRead, AsyncWrite, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::executor::TaskRunner;
use crate::graph::TaskName;
use crate::pipe::{Pipe, TaskOutput};
use crate::relay::relay_lines;

/// Runs the standard tasks for one [`RunConfig`].
///
/// `I` feeds the console relay and `O` receives continuous-read output;
/// they default to the process's standard input and output.
pub struct SlackTasks<I = Stdin, O = Stdout> {
    config: RunConfig,
    client: ApiClient,
    input: Mutex<Option<I>>,
    output: Mutex<O>,
}

impl SlackTasks {
    pub fn new(config: RunConfig) -> Result<Self> {
        Self::with_io(config, tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<I, O> SlackTasks<I, O> {
    pub fn with_io(config: RunConfig, input: I, output: O) -> Result<Self> {
        // A missing token is reported by checkArgs before any request is made.
        let token = config.token.clone().unwrap_or_default();
        let client = ApiClient::new(config.api_base.as_str(), token)?;
        Ok(Self {
            config,
            client,
            input: Mutex::new(Some(input)),
            output: Mutex::new(output),
        })
    }

    /// Consume the runner and hand back its output sink.
    pub fn into_output(self) -> O {
        self.output.into_inner()
    }

    async fn list(&self, kind: DestinationKind, pipe: &Pipe) -> Result<TaskOutput> {
        match &pipe.check_args {
            Some(destination) if destination.kind == kind => {
                Ok(TaskOutput::Listing(self.client.list(kind).await?))
            }
            _ => Ok(TaskOutput::Skipped),
        }
    }

    fn resolve(&self, kind: DestinationKind, listing: Option<&[Conversation]>) -> Result<TaskOutput> {
        let Some(listing) = listing else {
            return Ok(TaskOutput::Skipped);
        };
        let destination = self.config.destination()?;
        let id = find_id(listing, kind, &destination.name)?;
        info!(%kind, name = %destination.name, %id, "Resolved destination");
        Ok(TaskOutput::Resolved(id))
    }

    async fn send_message(&self, pipe: &Pipe) -> Result<TaskOutput> {
        let Some(text) = &self.config.message else {
            return Ok(TaskOutput::Skipped);
        };
        if self.config.file.is_some() {
            debug!("Message will accompany the file upload");
            return Ok(TaskOutput::Skipped);
        }
        let channel = resolved(pipe)?;
        let sent = self
            .client
            .post_message(channel, text, &self.config.post)
            .await?;
        Ok(TaskOutput::Sent(sent))
    }

    async fn pin(&self, pipe: &Pipe) -> Result<TaskOutput> {
        if !self.config.pin {
            return Ok(TaskOutput::Skipped);
        }
        let Some(message) = &pipe.send_message else {
            debug!("Nothing was sent, nothing to pin");
            return Ok(TaskOutput::Skipped);
        };
        self.client.pin_message(message).await?;
        Ok(TaskOutput::Pinned(message.clone()))
    }

    async fn upload_file(&self, pipe: &Pipe) -> Result<TaskOutput> {
        let Some(path) = &self.config.file else {
            return Ok(TaskOutput::Skipped);
        };
        let channel = resolved(pipe)?;
        let uploaded = self.client.upload_file(channel, path).await?;
        Ok(TaskOutput::Uploaded(uploaded))
    }

    async fn send_file_message(&self, pipe: &Pipe) -> Result<TaskOutput> {
        let Some(uploaded) = &pipe.upload_file else {
            return Ok(TaskOutput::Skipped);
        };
        let text = self.announcement(uploaded);
        let sent = self
            .client
            .post_message(&uploaded.channel, &text, &self.config.post)
            .await?;
        Ok(TaskOutput::Sent(sent))
    }

    /// Link text posted after an upload.
    fn announcement(&self, uploaded: &UploadedFile) -> String {
        let label = match (&self.config.message, &self.config.file) {
            (Some(message), _) => message.clone(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => uploaded.name.clone(),
        };
        format!(
            "<{}|{}> (<{}|Public Permalink>)",
            uploaded.permalink, label, uploaded.permalink_public
        )
    }

    async fn wait_for_text(&self) -> Result<TaskOutput> {
        let Some(target) = &self.config.wait_for_text else {
            return Ok(TaskOutput::Skipped);
        };
        info!(text = %target, timeout = ?self.config.timeout, "Waiting for text");
        let session = RealtimeSession::start(&self.client).await?;
        let event = session.wait_for_text(target, self.config.timeout).await?;
        Ok(TaskOutput::Matched(event))
    }
}

impl<I, O> SlackTasks<I, O>
where
    I: AsyncRead + Unpin + Send,
    O: AsyncWrite + Unpin + Send,
{
    async fn send_console_message(&self, pipe: &Pipe) -> Result<TaskOutput> {
        if !self.config.console {
            return Ok(TaskOutput::Skipped);
        }
        let channel = resolved(pipe)?;
        let input = self
            .input
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::Internal("console input already consumed".into()))?;

        info!(%channel, "Relaying console input");
        let client = &self.client;
        let options = &self.config.post;
        let sent = relay_lines(input, move |text| async move {
            client.post_message(channel, &text, options).await
        })
        .await?;
        Ok(TaskOutput::Relayed(sent))
    }

    async fn read(&self, pipe: &Pipe) -> Result<TaskOutput> {
        if !self.config.read {
            return Ok(TaskOutput::Skipped);
        }
        let channel = resolved(pipe)?;
        info!(%channel, "Reading messages");
        let session = RealtimeSession::start(&self.client).await?;
        let mut output = self.output.lock().await;
        let printed = session.read(channel, &mut *output).await?;
        Ok(TaskOutput::Printed(printed))
    }
}

#[async_trait]
impl<I, O> TaskRunner for SlackTasks<I, O>
where
    I: AsyncRead + Unpin + Send,
    O: AsyncWrite + Unpin + Send,
{
    async fn run(&self, task: TaskName, pipe: Pipe) -> Result<TaskOutput> {
        match task {
            TaskName::CheckArgs => {
                let destination = self.config.validate()?;
                debug!(kind = %destination.kind, name = %destination.name, "Arguments valid");
                Ok(TaskOutput::Checked(destination))
            }
            TaskName::Groups => self.list(DestinationKind::Group, &pipe).await,
            TaskName::Channels => self.list(DestinationKind::Channel, &pipe).await,
            TaskName::GroupId => self.resolve(DestinationKind::Group, pipe.groups.as_deref()),
            TaskName::ChannelId => {
                self.resolve(DestinationKind::Channel, pipe.channels.as_deref())
            }
            TaskName::SendMessage => self.send_message(&pipe).await,
            TaskName::Pin => self.pin(&pipe).await,
            TaskName::UploadFile => self.upload_file(&pipe).await,
            TaskName::SendFileMessage => self.send_file_message(&pipe).await,
            TaskName::SendConsoleMessage => self.send_console_message(&pipe).await,
            TaskName::WaitForText => self.wait_for_text().await,
            TaskName::Read => self.read(&pipe).await,
        }
    }
}

fn resolved(pipe: &Pipe) -> Result<&DestinationId> {
    pipe.destination()
        .ok_or_else(|| Error::Internal("destination was not resolved".into()))
}
