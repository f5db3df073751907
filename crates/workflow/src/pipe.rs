//! The task result store ("pipe").
//!
//! One optional slot per task. Slots are filled once, by the executor, as
//! tasks complete; a task only ever sees a [`Pipe::view`] holding the slots
//! of its own prerequisites.

use slackline_core::{
    Conversation, Destination, DestinationId, RtmEvent, SentMessage, UploadedFile,
};

use crate::graph::{GraphError, TaskName};

/// What a task produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    /// The task's option was absent or superseded; nothing was done
    Skipped,
    /// `checkArgs`: the validated destination selection
    Checked(Destination),
    /// `groups` / `channels`: the full listing
    Listing(Vec<Conversation>),
    /// `groupId` / `channelId`
    Resolved(DestinationId),
    /// `sendMessage` / `sendFileMessage`
    Sent(SentMessage),
    /// `pin`: the message that was pinned
    Pinned(SentMessage),
    /// `uploadFile`
    Uploaded(UploadedFile),
    /// `sendConsoleMessage`: one record per relayed line
    Relayed(Vec<SentMessage>),
    /// `waitForText`: the matching event
    Matched(RtmEvent),
    /// `read`: number of messages printed
    Printed(usize),
}

impl TaskOutput {
    fn label(&self) -> &'static str {
        match self {
            TaskOutput::Skipped => "skipped",
            TaskOutput::Checked(_) => "checked",
            TaskOutput::Listing(_) => "listing",
            TaskOutput::Resolved(_) => "resolved",
            TaskOutput::Sent(_) => "sent",
            TaskOutput::Pinned(_) => "pinned",
            TaskOutput::Uploaded(_) => "uploaded",
            TaskOutput::Relayed(_) => "relayed",
            TaskOutput::Matched(_) => "matched",
            TaskOutput::Printed(_) => "printed",
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutput::Skipped)
    }
}

/// Results of completed tasks, one slot per task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipe {
    pub check_args: Option<Destination>,
    pub groups: Option<Vec<Conversation>>,
    pub group_id: Option<DestinationId>,
    pub channels: Option<Vec<Conversation>>,
    pub channel_id: Option<DestinationId>,
    pub send_message: Option<SentMessage>,
    pub pin: Option<SentMessage>,
    pub upload_file: Option<UploadedFile>,
    pub send_file_message: Option<SentMessage>,
    pub send_console_message: Option<Vec<SentMessage>>,
    pub wait_for_text: Option<RtmEvent>,
    pub read: Option<usize>,
}

impl Pipe {
    /// The resolved destination: the group id if a group was selected,
    /// otherwise the channel id.
    pub fn destination(&self) -> Option<&DestinationId> {
        self.group_id.as_ref().or(self.channel_id.as_ref())
    }

    /// Whether `task` left a result.
    pub fn has(&self, task: TaskName) -> bool {
        match task {
            TaskName::CheckArgs => self.check_args.is_some(),
            TaskName::Groups => self.groups.is_some(),
            TaskName::GroupId => self.group_id.is_some(),
            TaskName::Channels => self.channels.is_some(),
            TaskName::ChannelId => self.channel_id.is_some(),
            TaskName::SendMessage => self.send_message.is_some(),
            TaskName::Pin => self.pin.is_some(),
            TaskName::UploadFile => self.upload_file.is_some(),
            TaskName::SendFileMessage => self.send_file_message.is_some(),
            TaskName::SendConsoleMessage => self.send_console_message.is_some(),
            TaskName::WaitForText => self.wait_for_text.is_some(),
            TaskName::Read => self.read.is_some(),
        }
    }

    /// Store `output` in `task`'s slot.
    ///
    /// Skipped outputs leave the slot empty. A slot is never overwritten, and
    /// an output variant that does not belong to `task` is rejected.
    pub fn record(&mut self, task: TaskName, output: TaskOutput) -> Result<(), GraphError> {
        if output.is_skipped() {
            return Ok(());
        }
        if self.has(task) {
            return Err(GraphError::AlreadyRecorded(task));
        }

        let label = output.label();
        match (task, output) {
            (TaskName::CheckArgs, TaskOutput::Checked(d)) => self.check_args = Some(d),
            (TaskName::Groups, TaskOutput::Listing(l)) => self.groups = Some(l),
            (TaskName::GroupId, TaskOutput::Resolved(id)) => self.group_id = Some(id),
            (TaskName::Channels, TaskOutput::Listing(l)) => self.channels = Some(l),
            (TaskName::ChannelId, TaskOutput::Resolved(id)) => self.channel_id = Some(id),
            (TaskName::SendMessage, TaskOutput::Sent(m)) => self.send_message = Some(m),
            (TaskName::Pin, TaskOutput::Pinned(m)) => self.pin = Some(m),
            (TaskName::UploadFile, TaskOutput::Uploaded(f)) => self.upload_file = Some(f),
            (TaskName::SendFileMessage, TaskOutput::Sent(m)) => self.send_file_message = Some(m),
            (TaskName::SendConsoleMessage, TaskOutput::Relayed(v)) => {
                self.send_console_message = Some(v)
            }
            (TaskName::WaitForText, TaskOutput::Matched(e)) => self.wait_for_text = Some(e),
            (TaskName::Read, TaskOutput::Printed(n)) => self.read = Some(n),
            (task, _) => {
                return Err(GraphError::UnexpectedOutput {
                    task,
                    output: label,
                });
            }
        }
        Ok(())
    }

    /// A copy holding only the slots of `tasks`.
    pub fn view(&self, tasks: &[TaskName]) -> Pipe {
        let mut view = Pipe::default();
        for &task in tasks {
            match task {
                TaskName::CheckArgs => view.check_args = self.check_args.clone(),
                TaskName::Groups => view.groups = self.groups.clone(),
                TaskName::GroupId => view.group_id = self.group_id.clone(),
                TaskName::Channels => view.channels = self.channels.clone(),
                TaskName::ChannelId => view.channel_id = self.channel_id.clone(),
                TaskName::SendMessage => view.send_message = self.send_message.clone(),
                TaskName::Pin => view.pin = self.pin.clone(),
                TaskName::UploadFile => view.upload_file = self.upload_file.clone(),
                TaskName::SendFileMessage => {
                    view.send_file_message = self.send_file_message.clone()
                }
                TaskName::SendConsoleMessage => {
                    view.send_console_message = self.send_console_message.clone()
                }
                TaskName::WaitForText => view.wait_for_text = self.wait_for_text.clone(),
                TaskName::Read => view.read = self.read,
            }
        }
        view
    }
}
