//! Application state shared across request handlers.

use std::sync::Arc;

use crate::service::{AccountService, AuthGate, EventService};

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor. The
/// services inside were wired explicitly by `main` (or a test fixture);
/// there is no ambient container.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    events: EventService,
    accounts: AccountService,
    auth: AuthGate,
}

impl AppState {
    /// Create a new application state.
    pub fn new(events: EventService, accounts: AccountService, auth: AuthGate) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                events,
                accounts,
                auth,
            }),
        }
    }

    /// Get the event lifecycle service.
    pub fn events(&self) -> &EventService {
        &self.inner.events
    }

    /// Get the account service.
    pub fn accounts(&self) -> &AccountService {
        &self.inner.accounts
    }

    /// Get the authentication gate.
    pub fn auth(&self) -> &AuthGate {
        &self.inner.auth
    }
}
