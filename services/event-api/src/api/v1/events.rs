//! Event API endpoints.
//!
//! Provides create, read, update, and paged listing of events.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use evently_id::EventId;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::domain::{Account, Event, EventDraft};
use crate::service::{EventService, EventServiceError};
use crate::state::AppState;
use crate::store::PageRequest;

/// Create event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/{event_id}", get(get_event).put(update_event))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Paging query parameters, 0-based.
#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<u32>,
    size: Option<u32>,
}

/// A single event, plus whether the current caller may update it. Clients
/// use `updatable` to decide whether to offer the edit affordance.
#[derive(Debug, Serialize)]
struct EventResponse {
    #[serde(flatten)]
    event: Event,
    updatable: bool,
}

impl EventResponse {
    fn new(event: Event, caller: Option<&Account>) -> Self {
        let updatable = EventService::can_modify(&event, caller);
        Self { event, updatable }
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn map_service_error(error: EventServiceError, request_id: &str) -> ApiError {
    match error {
        EventServiceError::Validation(details) => {
            ApiError::bad_request("invalid_event", "Event validation failed")
                .with_details(details)
                .with_request_id(request_id)
        }
        EventServiceError::NotFound => ApiError::not_found("event_not_found", "Event not found")
            .with_request_id(request_id),
        EventServiceError::Forbidden => ApiError::forbidden(
            "forbidden",
            "Only the event manager may modify this event",
        )
        .with_request_id(request_id),
        EventServiceError::Store(e) => {
            tracing::error!(error = %e, request_id = %request_id, "Event store operation failed");
            ApiError::internal("internal_error", "Event store operation failed")
                .with_request_id(request_id)
        }
    }
}

fn parse_event_id(raw: &str, request_id: &str) -> Result<EventId, ApiError> {
    EventId::parse(raw).map_err(|_| {
        ApiError::bad_request("invalid_event_id", "Invalid event ID format")
            .with_request_id(request_id)
    })
}

/// Create a new event.
///
/// POST /v1/events
async fn create_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(draft): Json<EventDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = state.auth().current_account(ctx.bearer_token.as_deref()).await;

    let event = state
        .events()
        .create_event(&draft, caller.as_ref())
        .await
        .map_err(|e| map_service_error(e, &ctx.request_id))?;

    let location = format!("/v1/events/{}", event.id);
    let body = EventResponse::new(event, caller.as_ref());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(body),
    ))
}

/// List events, newest first.
///
/// GET /v1/events
async fn list_events(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = state.auth().current_account(ctx.bearer_token.as_deref()).await;

    let request = PageRequest::new(
        query.page.unwrap_or(0),
        query.size.unwrap_or(PageRequest::DEFAULT_SIZE),
    );

    let page = state
        .events()
        .list_events(request)
        .await
        .map_err(|e| map_service_error(e, &ctx.request_id))?;

    Ok(Json(page.map(|event| EventResponse::new(event, caller.as_ref()))))
}

/// Get a single event by ID.
///
/// GET /v1/events/{event_id}
async fn get_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_event_id(&event_id, &ctx.request_id)?;
    let caller = state.auth().current_account(ctx.bearer_token.as_deref()).await;

    let event = state
        .events()
        .get_event(id)
        .await
        .map_err(|e| map_service_error(e, &ctx.request_id))?;

    Ok(Json(EventResponse::new(event, caller.as_ref())))
}

/// Update an event. Only the manager may update a managed event.
///
/// PUT /v1/events/{event_id}
async fn update_event(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(event_id): Path<String>,
    Json(draft): Json<EventDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_event_id(&event_id, &ctx.request_id)?;
    let caller = state.auth().current_account(ctx.bearer_token.as_deref()).await;

    let event = state
        .events()
        .update_event(id, &draft, caller.as_ref())
        .await
        .map_err(|e| map_service_error(e, &ctx.request_id))?;

    Ok(Json(EventResponse::new(event, caller.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_response_flattens_event_fields() {
        let event = Event::new_draft(EventId::new(), None, Utc::now());
        let response = EventResponse::new(event.clone(), None);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], serde_json::json!(event.id));
        assert_eq!(value["eventStatus"], "DRAFT");
        assert_eq!(value["updatable"], false);
    }

    #[test]
    fn test_list_query_deserializes() {
        let query: ListQuery = serde_json::from_str(r#"{"page": 2, "size": 10}"#).unwrap();
        assert_eq!(query.page, Some(2));
        assert_eq!(query.size, Some(10));
    }
}
