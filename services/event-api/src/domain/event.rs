//! Event model and derived-state rules.

use chrono::{DateTime, Utc};
use evently_id::{AccountId, EventId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an event. New events always start as `Draft`;
/// the later states exist for stored records only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    BeganEnrollment,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::BeganEnrollment => "BEGAN_ENROLLMENT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(EventStatus::Draft),
            "PUBLISHED" => Some(EventStatus::Published),
            "BEGAN_ENROLLMENT" => Some(EventStatus::BeganEnrollment),
            _ => None,
        }
    }
}

/// A stored event.
///
/// `free` and `offline` are derived: they are recomputed from the price and
/// location fields on every create and update, and callers cannot supply
/// them ([`EventDraft`] has no such fields).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub begin_enrollment_date_time: DateTime<Utc>,
    pub close_enrollment_date_time: DateTime<Utc>,
    pub begin_event_date_time: DateTime<Utc>,
    pub end_event_date_time: DateTime<Utc>,
    pub location: Option<String>,
    pub base_price: i64,
    pub max_price: i64,
    pub limit_of_enrollment: i64,
    pub free: bool,
    pub offline: bool,
    #[serde(rename = "eventStatus")]
    pub status: EventStatus,
    /// Owning account. `None` means unmanaged (legacy records); set once at
    /// creation and never changed by updates.
    pub manager: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// An empty `Draft`-status shell; the lifecycle service fills it via
    /// [`Event::apply_draft`] after validation.
    pub fn new_draft(id: EventId, manager: Option<AccountId>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            begin_enrollment_date_time: now,
            close_enrollment_date_time: now,
            begin_event_date_time: now,
            end_event_date_time: now,
            location: None,
            base_price: 0,
            max_price: 0,
            limit_of_enrollment: 0,
            free: false,
            offline: false,
            status: EventStatus::Draft,
            manager,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copies the draft's mapped fields onto this event. Identity and
    /// ownership (`id`, `status`, `manager`, `created_at`) are untouched.
    pub fn apply_draft(&mut self, draft: &EventDraft) {
        if let Some(name) = &draft.name {
            self.name = name.clone();
        }
        if let Some(description) = &draft.description {
            self.description = description.clone();
        }
        if let Some(begin) = draft.begin_enrollment_date_time {
            self.begin_enrollment_date_time = begin;
        }
        if let Some(close) = draft.close_enrollment_date_time {
            self.close_enrollment_date_time = close;
        }
        if let Some(begin) = draft.begin_event_date_time {
            self.begin_event_date_time = begin;
        }
        if let Some(end) = draft.end_event_date_time {
            self.end_event_date_time = end;
        }
        self.location = draft.location.clone();
        if let Some(base_price) = draft.base_price {
            self.base_price = base_price;
        }
        if let Some(max_price) = draft.max_price {
            self.max_price = max_price;
        }
        if let Some(limit) = draft.limit_of_enrollment {
            self.limit_of_enrollment = limit;
        }
    }

    /// Recomputes `free` and `offline` from the price and location fields.
    /// Idempotent: applying twice yields the same result.
    pub fn recompute_flags(&mut self) {
        self.free = self.base_price == 0 && self.max_price == 0;
        self.offline = self
            .location
            .as_deref()
            .is_some_and(|location| !location.trim().is_empty());
    }
}

/// Caller-submitted event data, prior to validation.
///
/// Every field is optional at the serde layer so that a missing field
/// surfaces as a structured [`FieldError`](super::FieldError) from
/// [`validate`](super::validate) instead of a deserialization failure.
/// Unknown payload members (`id`, `free`, `eventStatus`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub begin_enrollment_date_time: Option<DateTime<Utc>>,
    pub close_enrollment_date_time: Option<DateTime<Utc>>,
    pub begin_event_date_time: Option<DateTime<Utc>>,
    pub end_event_date_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub base_price: Option<i64>,
    pub max_price: Option<i64>,
    pub limit_of_enrollment: Option<i64>,
}
