//! The uniform result shape of every HTTP dispatch.

use serde::{Deserialize, Serialize};

/// Status used when a protected call is rejected for lack of a credential.
pub const MISSING_CREDENTIAL_STATUS: u16 = 401;

/// Message used when a protected call is rejected for lack of a credential.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Token não informado";

/// `{status, message, data}` as returned by the backend on success and
/// fabricated by the dispatcher on every failure path.
///
/// `data` is only populated on success. `message` is `None` when the backend
/// omitted it, so callers must handle that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Failure envelope with no data.
    #[must_use]
    pub fn failure(status: u16, message: Option<String>) -> Self {
        Self { status, message, data: None }
    }

    /// Fabricated result for a protected call made without a credential.
    #[must_use]
    pub fn missing_credential() -> Self {
        Self::failure(MISSING_CREDENTIAL_STATUS, Some(MISSING_CREDENTIAL_MESSAGE.to_owned()))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Message text, or `""` when the backend sent none.
    #[must_use]
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;
