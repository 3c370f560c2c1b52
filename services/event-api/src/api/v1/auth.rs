//! Authentication and identity endpoints.
//!
//! Endpoints:
//! - POST /v1/auth/token - Exchange email/password for a bearer token
//! - GET  /v1/auth/whoami - Get the identity behind the presented token

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::domain::AccountRole;
use crate::service::AuthError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(token))
        .route("/whoami", get(whoami))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoAmIResponse {
    account_id: String,
    email: String,
    roles: BTreeSet<AccountRole>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Exchange account credentials for an opaque bearer token.
///
/// POST /v1/auth/token
async fn token(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state
        .auth()
        .issue_token(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                ApiError::unauthorized("invalid_credentials", "Invalid email or password")
                    .with_request_id(ctx.request_id.as_str())
            }
            AuthError::Store(e) => {
                tracing::error!(error = %e, request_id = %ctx.request_id, "Failed to issue token");
                ApiError::internal("internal_error", "Failed to issue token")
                    .with_request_id(ctx.request_id.as_str())
            }
        })?;

    Ok(Json(TokenResponse {
        expires_in: issued.expires_in(),
        access_token: issued.access_token,
        token_type: "Bearer",
    }))
}

/// Identity behind the presented bearer token; 401 for anonymous callers.
///
/// GET /v1/auth/whoami
async fn whoami(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let Some(account) = state.auth().current_account(ctx.bearer_token.as_deref()).await else {
        return Err(ApiError::unauthorized(
            "unauthorized",
            "Missing or invalid Authorization token",
        )
        .with_request_id(ctx.request_id.as_str()));
    };

    Ok(Json(WhoAmIResponse {
        account_id: account.id.to_string(),
        email: account.email,
        roles: account.roles,
    }))
}
