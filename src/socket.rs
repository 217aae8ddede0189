//! Socket transport seam and its `tokio-tungstenite` implementation.
//!
//! A [`SocketTransport`] behaves like a browser socket constructor: `open`
//! returns immediately, and the connection's lifecycle arrives afterwards as
//! [`SocketEvent`]s on the returned [`SocketLink`]. Outbound traffic goes the
//! other way as [`SocketCommand`]s.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

use crate::error::ChannelError;

/// Lifecycle and data events, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open,
    /// Raw text payload, not yet parsed.
    Message(String),
    /// Transport-level error. Does not by itself end the connection.
    Error(String),
    /// Always the last event on a link.
    Close,
}

/// Requests from the connection owner to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketCommand {
    Send(String),
    Close,
}

/// Both directions of one opened connection.
#[derive(Debug)]
pub struct SocketLink {
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
    pub commands: mpsc::UnboundedSender<SocketCommand>,
}

pub trait SocketTransport: Send + Sync {
    /// Start connecting to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures detectable before any I/O (bad
    /// URL, no runtime). Handshake failures arrive as `Error` + `Close`.
    fn open(&self, url: &str) -> Result<SocketLink, ChannelError>;
}

// =============================================================================
// TUNGSTENITE
// =============================================================================

/// [`SocketTransport`] over `tokio-tungstenite`. Must be used inside a tokio
/// runtime; each connection runs on its own spawned task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl SocketTransport for TungsteniteTransport {
    fn open(&self, url: &str) -> Result<SocketLink, ChannelError> {
        let request = url
            .into_client_request()
            .map_err(|e| ChannelError::InvalidUrl { url: url.to_owned(), reason: e.to_string() })?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        runtime.spawn(run_connection(request, event_tx, command_rx));

        Ok(SocketLink { events: event_rx, commands: command_tx })
    }
}

/// Connect, then shuttle frames both ways until either side closes.
async fn run_connection(
    request: Request,
    events: mpsc::UnboundedSender<SocketEvent>,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let _ = events.send(SocketEvent::Error(ChannelError::Connect(e.to_string()).to_string()));
            let _ = events.send(SocketEvent::Close);
            return;
        }
    };
    let _ = events.send(SocketEvent::Open);

    let (mut write, mut read) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SocketEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let _ = events.send(SocketEvent::Message(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(SocketEvent::Error(e.to_string()));
                    break;
                }
            },
            command = commands.recv(), if !closing => match command {
                Some(SocketCommand::Send(text)) => {
                    if let Err(e) = write.send(Message::text(text)).await {
                        let _ = events.send(SocketEvent::Error(e.to_string()));
                    }
                }
                Some(SocketCommand::Close) | None => {
                    closing = true;
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::debug!(error = %e, "close frame not sent");
                        break;
                    }
                }
            },
        }
    }

    let _ = events.send(SocketEvent::Close);
}

#[cfg(test)]
#[path = "socket_test.rs"]
mod tests;
