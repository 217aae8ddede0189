//! Endpoint resolution and public/protected classification.
//!
//! Pure functions only: nothing here reads the credential store or touches
//! the network.

use std::fmt;

use crate::config::{Environment, SessionConfig};
use crate::error::{ChannelError, ConfigError};

/// Endpoints reachable without a credential.
pub const PUBLIC_ENDPOINTS: [&str; 3] = ["ping", "pubsub/", "auth/login"];

/// Any endpoint containing this marker addresses a shared (public) resource.
pub const SHARED_MARKER: &str = "shared";

/// Query parameter carrying the credential on socket URLs.
pub const SOCKET_AUTH_PARAM: &str = "authorization";

// =============================================================================
// PATH PARAMETER
// =============================================================================

/// Positional parameter appended as the last path segment.
///
/// `Id(0)` is a real parameter: presence is decided by `Option`, never by
/// the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParam {
    Id(i64),
    Name(String),
}

impl fmt::Display for PathParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for PathParam {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<i32> for PathParam {
    fn from(id: i32) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<u32> for PathParam {
    fn from(id: u32) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<&str> for PathParam {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for PathParam {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// `true` when the endpoint needs no credential.
#[must_use]
pub fn is_public(endpoint: &str) -> bool {
    PUBLIC_ENDPOINTS.contains(&endpoint) || endpoint.contains(SHARED_MARKER)
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve an HTTP endpoint to the URL the transport should call.
///
/// Development mode yields a relative `/api/...` path; deployed mode prefixes
/// the configured API base URL.
///
/// # Errors
///
/// Returns [`ConfigError::MissingVar`] for `PUBLIC_API_URL` when deployed mode
/// has no API base URL.
pub fn resolve_http(config: &SessionConfig, endpoint: &str, param: Option<&PathParam>) -> Result<String, ConfigError> {
    let path = match param {
        Some(param) => format!("/api/{endpoint}/{param}"),
        None => format!("/api/{endpoint}"),
    };
    match config.environment {
        Environment::Development => Ok(path),
        Environment::Deployed => {
            let base = config.api_base_url.as_deref().ok_or_else(|| ConfigError::MissingVar { var: "PUBLIC_API_URL".into() })?;
            Ok(format!("{base}{path}"))
        }
    }
}

/// Resolve a socket endpoint. Identical in every environment mode.
///
/// # Errors
///
/// Returns [`ChannelError::MissingSocketUrl`] if no socket base URL is set.
pub fn resolve_socket(config: &SessionConfig, endpoint: &str, credential: &str) -> Result<String, ChannelError> {
    let base = config.socket_base_url.as_deref().ok_or(ChannelError::MissingSocketUrl)?;
    Ok(format!("{base}/{endpoint}?{SOCKET_AUTH_PARAM}={credential}"))
}

/// Link to a shared resource on the same origin as `location`.
///
/// Only the serialized origin of `location` is kept: userinfo, path, query
/// and fragment are dropped, the host is lowercased and a default port is
/// elided. Returns `None` when `location` is not an absolute URL with a
/// tuple origin (relative paths, `data:` and the like).
#[must_use]
pub fn shared_url(location: &str, shared_id: &str) -> Option<String> {
    let origin = reqwest::Url::parse(location).ok()?.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/shared/{shared_id}", origin.ascii_serialization()))
}

#[cfg(test)]
#[path = "endpoint_test.rs"]
mod tests;
