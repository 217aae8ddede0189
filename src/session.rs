//! Session policy shared by the HTTP and socket dispatchers.
//!
//! DESIGN
//! ======
//! The credential cell and navigation are injected capabilities rather than
//! globals, so both dispatchers can run against in-memory fakes. All policy
//! side effects are idempotent: removing an absent credential or redirecting
//! twice is harmless.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::endpoint;

/// Route the user is sent to when the session is missing or expired.
pub const LOGIN_ROUTE: &str = "/login";

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Persisted single-slot credential storage.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn remove(&self);
}

/// Application navigation (current location + redirect).
pub trait Navigator: Send + Sync {
    /// Current location, e.g. `"/topics/3"` or a full URL.
    fn location(&self) -> String;
    fn redirect_to(&self, path: &str);
}

// =============================================================================
// IN-MEMORY IMPLEMENTATIONS
// =============================================================================

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local credential cell.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
    removals: Mutex<usize>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self { token: Mutex::new(token), removals: Mutex::new(0) }
    }

    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()))
    }

    /// Store a credential obtained from a login exchange.
    pub fn set(&self, token: impl Into<String>) {
        *lock(&self.token) = Some(token.into());
    }

    /// Number of `remove` calls so far.
    #[must_use]
    pub fn removals(&self) -> usize {
        *lock(&self.removals)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    fn remove(&self) {
        *lock(&self.token) = None;
        *lock(&self.removals) += 1;
    }
}

/// Navigator that records redirects and updates its location.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    location: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn at(location: impl Into<String>) -> Self {
        Self { location: Mutex::new(location.into()), redirects: Mutex::new(Vec::new()) }
    }

    /// Every path passed to `redirect_to`, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        lock(&self.redirects).clone()
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> String {
        lock(&self.location).clone()
    }

    fn redirect_to(&self, path: &str) {
        *lock(&self.location) = path.to_owned();
        lock(&self.redirects).push(path.to_owned());
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Decides whether a call needs a credential and performs session teardown.
#[derive(Clone)]
pub struct SessionPolicy {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionPolicy {
    pub fn new(store: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    #[must_use]
    pub fn requires_credential(&self, endpoint: &str) -> bool {
        !endpoint::is_public(endpoint)
    }

    #[must_use]
    pub fn current_credential(&self) -> Option<String> {
        self.store.get()
    }

    #[must_use]
    pub fn on_login_route(&self) -> bool {
        self.navigator.location().contains(LOGIN_ROUTE)
    }

    /// Drop the credential and send the user to the login route.
    pub fn on_auth_failure(&self) {
        tracing::info!(route = LOGIN_ROUTE, "session rejected; clearing credential");
        self.teardown();
    }

    /// Explicit user logout. Same side effect as an auth failure.
    pub fn logout(&self) {
        tracing::info!(route = LOGIN_ROUTE, "logout");
        self.teardown();
    }

    /// Gate for private pages: `true` if a credential is stored, otherwise
    /// redirect to login and return `false`.
    pub fn guard(&self) -> bool {
        if self.store.get().is_some() {
            return true;
        }
        tracing::debug!(route = LOGIN_ROUTE, "private route without credential");
        self.navigator.redirect_to(LOGIN_ROUTE);
        false
    }

    fn teardown(&self) {
        self.store.remove();
        self.navigator.redirect_to(LOGIN_ROUTE);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
