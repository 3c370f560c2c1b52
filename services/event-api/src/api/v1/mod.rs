//! API v1 routes.

mod auth;
mod events;

use axum::Router;

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/events", events::routes())
        .nest("/auth", auth::routes())
}
