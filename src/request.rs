//! Request dispatcher: one authenticated HTTP call, one normalized envelope.
//!
//! OUTCOMES
//! ========
//! - `Ok(Envelope)` for success, backend errors, and policy rejections.
//!   Callers branch on `status`.
//! - `Err(DispatchError)` only for transport failures, undecodable bodies,
//!   and a deployed config with no API base URL. These are logged here and
//!   propagated unchanged.
//!
//! Success bodies are trusted to already be `{status, message, data}` and are
//! passed through as-is. Error bodies are only mined for `message`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::endpoint::{self, PathParam};
use crate::envelope::Envelope;
use crate::error::{ConfigError, DispatchError};
use crate::http::{CONTENT_TYPE_JSON, HttpRequest, HttpTransport, Method};
use crate::session::SessionPolicy;

/// Placeholder sent in the `Authorization` header when no credential exists.
pub const ABSENT_CREDENTIAL: &str = "undefined";

/// Backend 401: the session expired or was revoked.
const UNAUTHORIZED: u16 = 401;

// =============================================================================
// CALL DESCRIPTION
// =============================================================================

/// Endpoint, method, optional JSON body, optional trailing path parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    pub param: Option<PathParam>,
}

impl ApiCall {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, method: Method) -> Self {
        Self { endpoint: endpoint.into(), method, body: None, param: None }
    }

    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Method::Get)
    }

    #[must_use]
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Method::Post)
    }

    #[must_use]
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Method::Put)
    }

    #[must_use]
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, Method::Delete)
    }

    /// Attach a JSON body. Ignored for `GET`.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn param(mut self, param: impl Into<PathParam>) -> Self {
        self.param = Some(param.into());
        self
    }
}

// =============================================================================
// DISPATCHER
// =============================================================================

pub struct RequestDispatcher<H> {
    policy: SessionPolicy,
    config: Arc<SessionConfig>,
    transport: H,
}

impl<H: HttpTransport> RequestDispatcher<H> {
    pub fn new(policy: SessionPolicy, config: Arc<SessionConfig>, transport: H) -> Self {
        Self { policy, config, transport }
    }

    #[must_use]
    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Run one call through the session gate and the transport.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] on network failure, when a response body is
    /// not the expected JSON, or when the config cannot address the endpoint.
    /// Backend error statuses are NOT errors.
    pub async fn dispatch<T: DeserializeOwned>(&self, call: ApiCall) -> Result<Envelope<T>, DispatchError> {
        let endpoint = call.endpoint.clone();
        self.dispatch_inner(call).await.inspect_err(|e| {
            tracing::error!(%endpoint, code = e.error_code(), error = %e, "error during request");
        })
    }

    /// `GET endpoint` shorthand.
    ///
    /// # Errors
    ///
    /// See [`RequestDispatcher::dispatch`].
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Envelope<T>, DispatchError> {
        self.dispatch(ApiCall::get(endpoint)).await
    }

    async fn dispatch_inner<T: DeserializeOwned>(&self, call: ApiCall) -> Result<Envelope<T>, DispatchError> {
        let credential = self.policy.current_credential();

        if credential.is_none() && self.policy.requires_credential(&call.endpoint) {
            tracing::warn!(endpoint = %call.endpoint, "protected endpoint without credential");
            self.policy.on_auth_failure();
            return Ok(Envelope::missing_credential());
        }

        let request = build_request(&self.config, &call, credential.as_deref())?;
        let response = self.transport.send(request).await?;

        if !response.ok() {
            let body: Value = response.json()?;
            let message = body.get("message").and_then(Value::as_str).map(str::to_owned);

            if response.status == UNAUTHORIZED && !self.policy.on_login_route() {
                self.policy.on_auth_failure();
                return Ok(Envelope::failure(UNAUTHORIZED, message));
            }

            tracing::debug!(endpoint = %call.endpoint, status = response.status, "backend returned error status");
            return Ok(Envelope::failure(response.status, message));
        }

        Ok(response.json()?)
    }
}

/// Assemble the transport request for a call that passed the session gate.
fn build_request(config: &SessionConfig, call: &ApiCall, credential: Option<&str>) -> Result<HttpRequest, ConfigError> {
    let url = endpoint::resolve_http(config, &call.endpoint, call.param.as_ref())?;
    let body = match (call.method, &call.body) {
        (Method::Get, _) | (_, None) => None,
        (_, Some(body)) => Some(body.to_string()),
    };

    Ok(HttpRequest {
        method: call.method,
        url,
        headers: vec![
            ("Content-Type".to_owned(), CONTENT_TYPE_JSON.to_owned()),
            ("Authorization".to_owned(), format!("Bearer {}", credential.unwrap_or(ABSENT_CREDENTIAL))),
        ],
        body,
    })
}

#[cfg(test)]
#[path = "request_test.rs"]
mod tests;
