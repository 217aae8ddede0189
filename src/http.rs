//! HTTP transport seam and its `reqwest` implementation.
//!
//! The dispatcher builds an [`HttpRequest`] and hands it to an
//! [`HttpTransport`]. Tests substitute a recording fake; production uses
//! [`ReqwestTransport`].

use crate::error::TransportError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Methods the dispatcher supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

/// A fully built request, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL, or a `/api/...` path in development mode.
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body. Always `None` for `GET`.
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code plus unparsed body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// `true` for 2xx statuses.
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the body is not valid JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Sends one request and returns the raw response.
///
/// Non-2xx statuses are successful exchanges, not errors.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by `reqwest`.
///
/// Relative paths (development mode) are sent to `origin`, the dev proxy
/// that forwards `/api` to the backend. Timeouts are reqwest's defaults.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    origin: String,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built (TLS init).
    pub fn new(origin: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, origin: origin.into().trim_end_matches('/').to_owned() })
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') { format!("{}{url}", self.origin) } else { url.to_owned() }
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.absolute(&request.url);
        let mut builder = self.http.request(request.method.into(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(method = request.method.as_str(), %url, status, "http exchange complete");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
