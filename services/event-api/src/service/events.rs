//! Event lifecycle service.
//!
//! Orchestrates create/read/update/list against the event store, enforcing
//! draft validation and ownership. Stateless: every operation stands alone
//! and the store is the only shared resource.

use std::sync::Arc;

use chrono::Utc;
use evently_id::EventId;
use thiserror::Error;

use crate::domain::{validate, Account, Event, EventDraft, FieldError};
use crate::store::{EventStore, Page, PageRequest, StoreError};

/// Lifecycle operation errors, surfaced verbatim to the presentation layer.
#[derive(Debug, Error)]
pub enum EventServiceError {
    /// The draft failed domain validation; nothing was persisted.
    #[error("event validation failed")]
    Validation(Vec<FieldError>),

    /// The target event does not exist.
    #[error("event not found")]
    NotFound,

    /// The event has a manager and the caller is not it.
    #[error("caller is not the event manager")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The event lifecycle service.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Validates the draft and persists a new `Draft`-status event with a
    /// freshly assigned id. The caller (if any) becomes the manager;
    /// anonymous creation leaves the event unmanaged.
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        caller: Option<&Account>,
    ) -> Result<Event, EventServiceError> {
        let errors = validate(draft);
        if !errors.is_empty() {
            return Err(EventServiceError::Validation(errors));
        }

        let mut event = Event::new_draft(EventId::new(), caller.map(|a| a.id), Utc::now());
        event.apply_draft(draft);
        event.recompute_flags();

        Ok(self.store.save(event).await?)
    }

    pub async fn get_event(&self, id: EventId) -> Result<Event, EventServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(EventServiceError::NotFound)
    }

    /// Applies the draft's mapped fields onto the stored event, preserving
    /// id, status, manager, and creation time. Failure order: `NotFound`,
    /// then `Validation`, then `Forbidden`.
    pub async fn update_event(
        &self,
        id: EventId,
        draft: &EventDraft,
        caller: Option<&Account>,
    ) -> Result<Event, EventServiceError> {
        let Some(mut event) = self.store.find_by_id(id).await? else {
            return Err(EventServiceError::NotFound);
        };

        let errors = validate(draft);
        if !errors.is_empty() {
            return Err(EventServiceError::Validation(errors));
        }

        // An event without a manager is updatable by anyone; see DESIGN.md.
        if event.manager.is_some() && !Self::can_modify(&event, caller) {
            return Err(EventServiceError::Forbidden);
        }

        event.apply_draft(draft);
        event.recompute_flags();
        event.updated_at = Utc::now();

        Ok(self.store.save(event).await?)
    }

    pub async fn list_events(
        &self,
        request: PageRequest,
    ) -> Result<Page<Event>, EventServiceError> {
        Ok(self.store.find_all_paged(request).await?)
    }

    /// Store reachability, for the readiness probe.
    pub async fn store_health(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }

    /// True iff the event has a manager and it is the caller. The
    /// presentation layer uses this to decide whether to expose the update
    /// affordance.
    pub fn can_modify(event: &Event, caller: Option<&Account>) -> bool {
        match (event.manager, caller) {
            (Some(manager), Some(caller)) => manager == caller.id,
            _ => false,
        }
    }
}
