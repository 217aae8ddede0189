//! # apigate
//!
//! Client-side request/session layer for the pub/sub backend. Every HTTP call
//! and every real-time connection goes through one [`SessionPolicy`]: bearer
//! credentials are attached, public endpoints pass without one, responses are
//! normalized into an [`Envelope`], and authentication failures tear the
//! session down and navigate to the login route.
//!
//! The browser-side collaborators (credential cell, navigation) and both
//! transports are traits, so the same dispatch logic runs against `reqwest`
//! and `tokio-tungstenite` in production and in-memory fakes in tests.

pub mod channel;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod http;
pub mod models;
pub mod request;
pub mod session;
pub mod socket;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

pub use channel::{ChannelCallbacks, ChannelDispatcher, ChannelEndpoint, ChannelFrame, ChannelHandle, ConnectionState};
pub use config::{Environment, SessionConfig};
pub use endpoint::PathParam;
pub use envelope::Envelope;
pub use error::{ChannelError, ConfigError, DispatchError, TransportError};
pub use http::{HttpTransport, Method, ReqwestTransport};
pub use request::{ApiCall, RequestDispatcher};
pub use session::{CredentialStore, MemoryCredentialStore, MemoryNavigator, Navigator, SessionPolicy};
pub use socket::{SocketTransport, TungsteniteTransport};

/// Both dispatchers wired to one session policy and one config.
pub struct Session<H = ReqwestTransport, S = TungsteniteTransport> {
    policy: SessionPolicy,
    requests: RequestDispatcher<H>,
    channels: ChannelDispatcher<S>,
}

impl Session {
    /// Production wiring: `reqwest` for HTTP, `tokio-tungstenite` for sockets.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, TransportError> {
        let http = ReqwestTransport::new(config.dev_proxy_url.clone())?;
        Ok(Self::with_transports(config, store, navigator, http, TungsteniteTransport))
    }
}

impl<H: HttpTransport, S: SocketTransport> Session<H, S> {
    pub fn with_transports(
        config: SessionConfig,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        http: H,
        socket: S,
    ) -> Self {
        let config = Arc::new(config);
        let policy = SessionPolicy::new(store, navigator);
        Self {
            requests: RequestDispatcher::new(policy.clone(), config.clone(), http),
            channels: ChannelDispatcher::new(policy.clone(), config, socket),
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    #[must_use]
    pub fn requests(&self) -> &RequestDispatcher<H> {
        &self.requests
    }

    #[must_use]
    pub fn channels(&self) -> &ChannelDispatcher<S> {
        &self.channels
    }
}
