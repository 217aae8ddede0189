//! Channel dispatcher: one authenticated real-time connection per `open`.
//!
//! ARCHITECTURE
//! ============
//! `open` runs the session gate, resolves the socket URL, asks the
//! [`SocketTransport`] to connect, and spawns a pump task that turns
//! [`SocketEvent`]s into caller callbacks in arrival order.
//!
//! Per-connection states: `Connecting -> Open -> Closed`. Errors may fire any
//! number of times without a transition; `on_close` fires exactly once.
//! There is no reconnection: callers re-`open` if they want one.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::config::SessionConfig;
use crate::endpoint;
use crate::error::ChannelError;
use crate::session::SessionPolicy;
use crate::socket::{SocketCommand, SocketEvent, SocketTransport};

// =============================================================================
// TYPES
// =============================================================================

/// Real-time endpoints exposed by the backend. Both require a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEndpoint {
    Topic,
    Realtime,
}

impl ChannelEndpoint {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Realtime => "realtime",
        }
    }
}

/// Inbound message shape. `kind`/`action` are routing keys for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelFrame<T = Value> {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

type OpenCallback = Box<dyn FnMut(&ChannelHandle) + Send>;
type MessageCallback<T> = Box<dyn FnMut(ChannelFrame<T>) + Send>;
type ErrorCallback = Box<dyn FnMut(String) + Send>;
type CloseCallback = Box<dyn FnMut() + Send>;

/// Optional lifecycle callbacks, each independent of the others.
pub struct ChannelCallbacks<T = Value> {
    on_open: Option<OpenCallback>,
    on_message: Option<MessageCallback<T>>,
    on_error: Option<ErrorCallback>,
    on_close: Option<CloseCallback>,
}

impl<T> Default for ChannelCallbacks<T> {
    fn default() -> Self {
        Self { on_open: None, on_message: None, on_error: None, on_close: None }
    }
}

impl<T> ChannelCallbacks<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_open(mut self, f: impl FnMut(&ChannelHandle) + Send + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_message(mut self, f: impl FnMut(ChannelFrame<T>) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(String) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_close(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    fn emit_error(&mut self, description: String) {
        if let Some(f) = self.on_error.as_mut() {
            f(description);
        }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Caller-owned handle to one connection. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    commands: mpsc::UnboundedSender<SocketCommand>,
    state: watch::Receiver<ConnectionState>,
}

impl ChannelHandle {
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Queue a raw text payload. Returns `false` once the connection is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.commands.send(SocketCommand::Send(text.into())).is_ok()
    }

    /// Serialize and queue a frame.
    pub fn publish<S: Serialize>(&self, frame: &ChannelFrame<S>) -> bool {
        if let Ok(json) = serde_json::to_string(frame) { self.send_text(json) } else { false }
    }

    /// Ask the transport to close. `on_close` fires when it has.
    pub fn close(&self) {
        let _ = self.commands.send(SocketCommand::Close);
    }

    /// Wait until the connection reaches [`ConnectionState::Closed`].
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

pub struct ChannelDispatcher<S> {
    policy: SessionPolicy,
    config: Arc<SessionConfig>,
    transport: S,
}

impl<S: SocketTransport> ChannelDispatcher<S> {
    pub fn new(policy: SessionPolicy, config: Arc<SessionConfig>, transport: S) -> Self {
        Self { policy, config, transport }
    }

    /// Open a connection to `endpoint`, or return `None` if it could not be
    /// started (no credential, or a synchronous establishment failure
    /// reported through `on_error`).
    pub fn open<T>(&self, endpoint: ChannelEndpoint, mut callbacks: ChannelCallbacks<T>) -> Option<ChannelHandle>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let Some(credential) = self.policy.current_credential() else {
            tracing::warn!(endpoint = endpoint.as_str(), "no credential for real-time channel");
            self.policy.on_auth_failure();
            return None;
        };

        match self.start(endpoint, &credential) {
            Ok(Started { events, handle, state }) => {
                let commands = handle.commands.downgrade();
                tokio::spawn(pump(events, state, commands, callbacks));
                Some(handle)
            }
            Err(e) => {
                tracing::error!(endpoint = endpoint.as_str(), error = %e, "failed to open real-time channel");
                callbacks.emit_error(e.to_string());
                None
            }
        }
    }

    fn start(&self, endpoint: ChannelEndpoint, credential: &str) -> Result<Started, ChannelError> {
        let url = endpoint::resolve_socket(&self.config, endpoint.as_str(), credential)?;
        tokio::runtime::Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;

        let link = self.transport.open(&url)?;
        tracing::debug!(endpoint = endpoint.as_str(), "real-time channel connecting");

        let (state, state_rx) = watch::channel(ConnectionState::Connecting);
        let handle = ChannelHandle { commands: link.commands, state: state_rx };
        Ok(Started { events: link.events, handle, state })
    }
}

/// A link the transport accepted, not yet handed to the pump.
struct Started {
    events: mpsc::UnboundedReceiver<SocketEvent>,
    handle: ChannelHandle,
    state: watch::Sender<ConnectionState>,
}

/// Deliver transport events to callbacks until the link closes.
///
/// The pump only holds a weak command sender: once the caller drops every
/// handle, the transport sees its command channel end and closes.
async fn pump<T: DeserializeOwned>(
    mut events: mpsc::UnboundedReceiver<SocketEvent>,
    state: watch::Sender<ConnectionState>,
    commands: mpsc::WeakUnboundedSender<SocketCommand>,
    mut callbacks: ChannelCallbacks<T>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SocketEvent::Open => {
                state.send_replace(ConnectionState::Open);
                match commands.upgrade() {
                    Some(commands) => {
                        if let Some(f) = callbacks.on_open.as_mut() {
                            f(&ChannelHandle { commands, state: state.subscribe() });
                        }
                    }
                    None => tracing::debug!("channel opened after every handle was dropped"),
                }
            }
            SocketEvent::Message(raw) => match serde_json::from_str::<ChannelFrame<T>>(&raw) {
                Ok(frame) => {
                    if let Some(f) = callbacks.on_message.as_mut() {
                        f(frame);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "malformed real-time frame");
                    callbacks.emit_error(e.to_string());
                }
            },
            SocketEvent::Error(description) => callbacks.emit_error(description),
            SocketEvent::Close => break,
        }
    }

    state.send_replace(ConnectionState::Closed);
    tracing::debug!("real-time channel closed");
    if let Some(f) = callbacks.on_close.as_mut() {
        f();
    }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
