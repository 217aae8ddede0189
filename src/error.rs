//! Error types for configuration, transports, and dispatch.
//!
//! Policy rejections and backend error statuses are NOT errors here: they come
//! back as [`crate::envelope::Envelope`] values. Only transport, decode and
//! config failures travel through `Result::Err`.

// =============================================================================
// CONFIG
// =============================================================================

/// Errors produced while reading [`crate::config::SessionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable required by the selected environment is not set.
    #[error("missing config: env var {var} not set")]
    MissingVar { var: String },

    /// A variable is set but its value is not understood.
    #[error("invalid config value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// The HTTP transport could not complete the exchange.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Failures surfaced to the caller of [`crate::request::RequestDispatcher`].
///
/// Everything else (missing credential, 4xx/5xx from the backend) is reported
/// through the envelope's `status`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Network-level failure: connection refused, TLS, reset, ...
    #[error("http request failed: {0}")]
    Transport(#[from] TransportError),

    /// The response body was not the JSON shape the dispatcher expects.
    #[error("response body decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The session config cannot address the endpoint.
    #[error("request not addressable: {0}")]
    Config(#[from] ConfigError),
}

impl DispatchError {
    /// Grepable code for logs and UI error reporting.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Decode(_) => "E_DECODE",
            Self::Config(_) => "E_CONFIG",
        }
    }
}

// =============================================================================
// CHANNEL
// =============================================================================

/// Failures establishing a real-time connection.
///
/// These are never returned to callers of
/// [`crate::channel::ChannelDispatcher::open`]; they are stringified into the
/// `on_error` callback.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// No socket base URL was configured.
    #[error("socket base URL is not configured (set PUBLIC_WS_URL)")]
    MissingSocketUrl,

    /// The resolved URL is not a valid websocket request target.
    #[error("invalid socket URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// `open` was called outside a tokio runtime.
    #[error("no async runtime available to drive the socket")]
    NoRuntime,

    /// The handshake with the server failed.
    #[error("websocket connect failed: {0}")]
    Connect(String),
}
