//! Fakes and fixtures shared by the unit tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use crate::channel::{ChannelCallbacks, ChannelFrame, ConnectionState};
use crate::error::{ChannelError, TransportError};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::session::{MemoryCredentialStore, MemoryNavigator, SessionPolicy};
use crate::socket::{SocketCommand, SocketEvent, SocketLink, SocketTransport};

/// Serve `app` on an ephemeral localhost port; returns `http://127.0.0.1:PORT`.
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    format!("http://{addr}")
}

/// Policy over in-memory store and navigator, returned alongside both.
pub fn memory_policy(
    token: Option<&str>,
    location: &str,
) -> (SessionPolicy, Arc<MemoryCredentialStore>, Arc<MemoryNavigator>) {
    let store = Arc::new(MemoryCredentialStore::new(token.map(str::to_owned)));
    let nav = Arc::new(MemoryNavigator::at(location));
    (SessionPolicy::new(store.clone(), nav.clone()), store, nav)
}

// =============================================================================
// HTTP
// =============================================================================

/// Records every request and answers with one canned outcome.
pub struct RecordingTransport {
    outcome: Result<HttpResponse, String>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn reply(status: u16, body: Value) -> Self {
        Self::reply_raw(status, &body.to_string())
    }

    pub fn reply_raw(status: u16, body: &str) -> Self {
        Self { outcome: Ok(HttpResponse { status, body: body.to_owned() }), requests: Mutex::new(Vec::new()) }
    }

    pub fn fail(message: &str) -> Self {
        Self { outcome: Err(message.to_owned()), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests mutex").clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().expect("requests mutex").push(request);
        self.outcome.clone().map_err(TransportError)
    }
}

#[async_trait::async_trait]
impl<T: HttpTransport> HttpTransport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.as_ref().send(request).await
    }
}

// =============================================================================
// SOCKET
// =============================================================================

/// The test's end of a fake connection.
pub struct FakeSocket {
    pub url: String,
    pub events: mpsc::UnboundedSender<SocketEvent>,
    pub commands: mpsc::UnboundedReceiver<SocketCommand>,
}

/// Socket transport whose connections are driven by the test.
#[derive(Default)]
pub struct FakeSocketTransport {
    refuse: bool,
    opened: Mutex<Vec<FakeSocket>>,
    attempts: Mutex<usize>,
}

impl FakeSocketTransport {
    /// A transport whose `open` fails synchronously.
    pub fn refusing() -> Self {
        Self { refuse: true, ..Self::default() }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("attempts mutex")
    }

    /// Take the most recently opened connection.
    pub fn take_last(&self) -> FakeSocket {
        self.opened.lock().expect("opened mutex").pop().expect("no socket opened")
    }
}

impl SocketTransport for FakeSocketTransport {
    fn open(&self, url: &str) -> Result<SocketLink, ChannelError> {
        *self.attempts.lock().expect("attempts mutex") += 1;
        if self.refuse {
            return Err(ChannelError::InvalidUrl { url: url.to_owned(), reason: "refused by fake".to_owned() });
        }
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        self.opened.lock().expect("opened mutex").push(FakeSocket {
            url: url.to_owned(),
            events: event_tx,
            commands: command_rx,
        });
        Ok(SocketLink { events: event_rx, commands: command_tx })
    }
}

impl<T: SocketTransport> SocketTransport for Arc<T> {
    fn open(&self, url: &str) -> Result<SocketLink, ChannelError> {
        self.as_ref().open(url)
    }
}

// =============================================================================
// CALLBACK RECORDING
// =============================================================================

/// One observed callback invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    /// `on_open`, with the handle's state at that moment.
    Open(ConnectionState),
    Message(ChannelFrame<Value>),
    Error(String),
    Close,
}

/// Callbacks that forward every invocation to the returned receiver.
pub fn recording_callbacks() -> (ChannelCallbacks<Value>, mpsc::UnboundedReceiver<Observed>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (open_tx, msg_tx, err_tx, close_tx) = (tx.clone(), tx.clone(), tx.clone(), tx);
    let callbacks = ChannelCallbacks::new()
        .on_open(move |h| {
            let _ = open_tx.send(Observed::Open(h.state()));
        })
        .on_message(move |f| {
            let _ = msg_tx.send(Observed::Message(f));
        })
        .on_error(move |e| {
            let _ = err_tx.send(Observed::Error(e));
        })
        .on_close(move || {
            let _ = close_tx.send(Observed::Close);
        });
    (callbacks, rx)
}

/// Next observed callback, failing the test after one second.
pub async fn next_observed(rx: &mut mpsc::UnboundedReceiver<Observed>) -> Observed {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("callback timed out")
        .expect("callback channel closed")
}

/// Assert no callback fires within a short window. A closed channel counts
/// as quiet: the callbacks were dropped without firing.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Observed>) {
    match timeout(Duration::from_millis(80), rx.recv()).await {
        Err(_) | Ok(None) => {}
        Ok(Some(observed)) => panic!("unexpected callback {observed:?}"),
    }
}
