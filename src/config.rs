//! Session configuration parsed from environment variables.
//!
//! Variables:
//! - `APP_ENV`: `production` selects deployed mode; `development` (default)
//!   selects relative `/api` paths served through the dev proxy.
//! - `PUBLIC_API_URL`: HTTP base URL, required in deployed mode.
//! - `PUBLIC_WS_URL`: socket base URL, used in every mode.
//! - `DEV_PROXY_URL`: origin that relative development paths are sent to.

use crate::error::ConfigError;

pub const DEFAULT_DEV_PROXY_URL: &str = "http://127.0.0.1:5173";

/// Which endpoint resolution mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Relative `/api/...` paths; a local proxy forwards them to the backend.
    #[default]
    Development,
    /// Absolute URLs built from `PUBLIC_API_URL`.
    Deployed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub environment: Environment,
    /// `None` only in development mode.
    pub api_base_url: Option<String>,
    pub socket_base_url: Option<String>,
    pub dev_proxy_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            api_base_url: None,
            socket_base_url: None,
            dev_proxy_url: DEFAULT_DEV_PROXY_URL.to_owned(),
        }
    }
}

impl SessionConfig {
    /// Development-mode config with a socket base URL.
    #[must_use]
    pub fn development(socket_base_url: impl Into<String>) -> Self {
        Self { socket_base_url: Some(trim_base(&socket_base_url.into())), ..Self::default() }
    }

    /// Deployed-mode config with explicit base URLs.
    #[must_use]
    pub fn deployed(api_base_url: impl Into<String>, socket_base_url: impl Into<String>) -> Self {
        Self {
            environment: Environment::Deployed,
            api_base_url: Some(trim_base(&api_base_url.into())),
            socket_base_url: Some(trim_base(&socket_base_url.into())),
            ..Self::default()
        }
    }

    /// Load `.env` (if present) and build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `APP_ENV` is unrecognized or deployed mode lacks
    /// `PUBLIC_API_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = parse_environment(lookup("APP_ENV").as_deref())?;

        let api_base_url = non_empty(lookup("PUBLIC_API_URL")).map(|v| trim_base(&v));
        if environment == Environment::Deployed && api_base_url.is_none() {
            return Err(ConfigError::MissingVar { var: "PUBLIC_API_URL".into() });
        }

        let socket_base_url = non_empty(lookup("PUBLIC_WS_URL")).map(|v| trim_base(&v));
        let dev_proxy_url = non_empty(lookup("DEV_PROXY_URL"))
            .map_or_else(|| DEFAULT_DEV_PROXY_URL.to_owned(), |v| trim_base(&v));

        Ok(Self { environment, api_base_url, socket_base_url, dev_proxy_url })
    }
}

fn parse_environment(raw: Option<&str>) -> Result<Environment, ConfigError> {
    match raw.map(str::trim).unwrap_or("development") {
        "" | "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Deployed),
        other => Err(ConfigError::InvalidValue { var: "APP_ENV".into(), value: other.to_owned() }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
