//! Realtime (RTM) session over a WebSocket.
//!
//! A session is opened with [`RealtimeSession::start`] (handshake through
//! `rtm.start`, then connect) and consumed by one of two modes:
//!
//! - [`RealtimeSession::wait_for_text`] races an inbound message filter
//!   against a timer and resolves on whichever finishes first.
//! - [`RealtimeSession::read`] prints every message posted to one destination
//!   until the remote side closes the connection.
//!
//! Only text frames carry events. Binary, ping and pong frames are ignored,
//! as are text frames that do not decode as an event.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use slackline_core::{DestinationId, Error, Result, RtmEvent};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::client::ApiClient;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of a realtime session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Matched,
    TimedOut,
    Closed,
    Error,
}

/// One decoded inbound frame.
enum Frame {
    Event(RtmEvent),
    Ignored,
    Closed,
}

/// A live realtime connection.
pub struct RealtimeSession {
    socket: Socket,
    state: SessionState,
}

impl RealtimeSession {
    /// Handshake via `rtm.start` and connect to the returned URL.
    pub async fn start(client: &ApiClient) -> Result<Self> {
        let url = client.rtm_start().await?;
        Self::connect(&url).await
    }

    /// Connect to a session URL.
    pub async fn connect(url: &str) -> Result<Self> {
        debug!(state = ?SessionState::Connecting, "Connecting realtime session");
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| Error::Realtime(format!("failed to connect: {e}")))?;

        info!("Realtime session open");
        Ok(Self {
            socket,
            state: SessionState::Open,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Block until a `message` event with exactly `target` as its text arrives.
    ///
    /// The connection is closed once on match or timeout. A remote close
    /// before either fails with [`Error::ConnectionClosed`].
    pub async fn wait_for_text(mut self, target: &str, timeout: Duration) -> Result<RtmEvent> {
        let raced = tokio::select! {
            found = self.next_match(|event| event.is_message_with_text(target)) => Some(found),
            _ = tokio::time::sleep(timeout) => None,
        };

        let Some(outcome) = raced else {
            debug!(?timeout, "Timed out waiting for text");
            self.close(SessionState::TimedOut).await;
            return Err(Error::Timeout {
                timeout_secs: timeout.as_secs(),
            });
        };

        match outcome {
            Ok(Some(event)) => {
                info!(text = %target, channel = ?event.channel, "Matched awaited text");
                self.close(SessionState::Matched).await;
                Ok(event)
            }
            Ok(None) => {
                self.state = SessionState::Closed;
                Err(Error::ConnectionClosed)
            }
            Err(e) => {
                self.state = SessionState::Error;
                Err(e)
            }
        }
    }

    /// Print the text of every message posted to `channel` to `out`, one line
    /// each, until the remote side closes. Returns the number of lines printed.
    pub async fn read<W>(mut self, channel: &DestinationId, out: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let mut printed = 0;
        loop {
            let event = match self
                .next_match(|event| event.is_message_in(channel.as_str()))
                .await
            {
                Ok(Some(event)) => event,
                Ok(None) => {
                    self.state = SessionState::Closed;
                    info!(printed, "Realtime session closed by remote side");
                    return Ok(printed);
                }
                Err(e) => {
                    self.state = SessionState::Error;
                    return Err(e);
                }
            };

            let line = format!("{}\n", event.text.unwrap_or_default());
            out.write_all(line.as_bytes())
                .await
                .map_err(|e| Error::Realtime(format!("failed to write output: {e}")))?;
            out.flush()
                .await
                .map_err(|e| Error::Realtime(format!("failed to write output: {e}")))?;
            printed += 1;
        }
    }

    /// Next event satisfying `accept`; `None` once the connection is closed.
    async fn next_match<F>(&mut self, accept: F) -> Result<Option<RtmEvent>>
    where
        F: Fn(&RtmEvent) -> bool,
    {
        loop {
            match self.next_frame().await? {
                Frame::Event(event) if accept(&event) => return Ok(Some(event)),
                Frame::Event(event) => debug!(kind = %event.kind, "Skipping realtime event"),
                Frame::Ignored => {}
                Frame::Closed => return Ok(None),
            }
        }
    }

    async fn next_frame(&mut self) -> Result<Frame> {
        let Some(message) = self.socket.next().await else {
            return Ok(Frame::Closed);
        };

        match message {
            Ok(message) => Ok(decode_frame(message)),
            Err(
                WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake),
            ) => Ok(Frame::Closed),
            Err(e) => Err(Error::Realtime(e.to_string())),
        }
    }

    async fn close(&mut self, state: SessionState) {
        self.state = state;
        if let Err(e) = self.socket.close(None).await {
            debug!(error = %e, "Realtime close handshake failed");
        }
    }
}

fn decode_frame(message: WsMessage) -> Frame {
    match message {
        WsMessage::Text(text) => match serde_json::from_str::<RtmEvent>(text.as_str()) {
            Ok(event) => {
                debug!(kind = %event.kind, "Realtime event");
                Frame::Event(event)
            }
            Err(e) => {
                warn!(error = %e, "Ignoring undecodable realtime frame");
                Frame::Ignored
            }
        },
        WsMessage::Close(_) => Frame::Closed,
        WsMessage::Binary(_) | WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {
            Frame::Ignored
        }
    }
}
