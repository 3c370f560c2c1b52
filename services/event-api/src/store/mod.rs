//! Store layer: the external collaborators the services talk to.
//!
//! Each store is a trait with two adapters: `memory` for tests and
//! single-process deployments, `postgres` for the real thing. Services
//! receive stores as explicit constructor arguments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evently_id::{AccountId, EventId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Account, Event};

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("duplicate record: {0}")]
    Conflict(String),

    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// Migration directory not found in the current environment.
    #[error("migration directory not found; tried {tried}. Last error: {last_error}. Run from the repo root or services/event-api.")]
    MigrationDirNotFound { tried: String, last_error: String },

    /// A stored record could not be decoded into its domain type.
    #[error("failed to decode stored record: {0}")]
    Decode(String),

    /// An in-memory store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A page request, 0-based. Size is clamped to `1..=MAX_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size());
        let total_pages = total_elements.div_ceil(size) as u32;
        Self {
            items,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Event persistence.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts or replaces the record keyed by `event.id`.
    async fn save(&self, event: Event) -> Result<Event, StoreError>;

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// Newest first; event ids are ULIDs, so id order is creation order.
    async fn find_all_paged(&self, request: PageRequest) -> Result<Page<Event>, StoreError>;

    /// Used by the readiness probe.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account. Duplicate email yields [`StoreError::Conflict`].
    async fn save(&self, account: Account) -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;
}

/// A stored access token. Only the SHA-256 hash of the token is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    pub token_hash: String,
    pub account_id: AccountId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Access-token persistence.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, record: AccessTokenRecord) -> Result<(), StoreError>;

    async fn find_by_hash(&self, token_hash: &str)
        -> Result<Option<AccessTokenRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0).size(), 1);
        assert_eq!(PageRequest::new(0, 1000).size(), PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::default().size(), PageRequest::DEFAULT_SIZE);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest::new(2, 10).offset(), 20);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
    }

    #[test]
    fn test_page_counts() {
        let request = PageRequest::new(0, 10);
        let page = Page::new(vec![0; 10], request, 30);
        assert_eq!(page.total_pages, 3);

        let page = Page::new(vec![0; 10], request, 31);
        assert_eq!(page.total_pages, 4);

        let page: Page<i32> = Page::new(Vec::new(), request, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2), 2);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["totalElements"], 2);
        assert_eq!(value["totalPages"], 1);
        assert_eq!(value["items"], serde_json::json!([1, 2]));
    }
}
