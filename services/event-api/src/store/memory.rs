//! In-memory store adapters.
//!
//! Used by the test suite and by the `memory` backend mode. Thread-safe via
//! `RwLock`; a poisoned lock surfaces as [`StoreError::LockPoisoned`]
//! instead of panicking the request handler.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use evently_id::{AccountId, EventId};

use crate::domain::{Account, Event};
use crate::store::{
    AccessTokenRecord, AccountStore, EventStore, Page, PageRequest, StoreError, TokenStore,
};

#[derive(Default)]
struct EventShelf {
    by_id: HashMap<EventId, Event>,
    /// Insertion order; listing walks this in reverse for newest-first.
    order: Vec<EventId>,
}

/// In-memory [`EventStore`].
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    shelf: Arc<RwLock<EventShelf>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn save(&self, event: Event) -> Result<Event, StoreError> {
        let mut shelf = self.shelf.write().map_err(|_| StoreError::LockPoisoned)?;
        if !shelf.by_id.contains_key(&event.id) {
            shelf.order.push(event.id);
        }
        shelf.by_id.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let shelf = self.shelf.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(shelf.by_id.get(&id).cloned())
    }

    async fn find_all_paged(&self, request: PageRequest) -> Result<Page<Event>, StoreError> {
        let shelf = self.shelf.read().map_err(|_| StoreError::LockPoisoned)?;
        let total = shelf.order.len() as u64;
        let items: Vec<Event> = shelf
            .order
            .iter()
            .rev()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .filter_map(|id| shelf.by_id.get(id).cloned())
            .collect();
        Ok(Page::new(items, request, total))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory [`AccountStore`].
#[derive(Clone, Default)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn save(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| StoreError::LockPoisoned)?;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(account.email));
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(accounts.get(&id).cloned())
    }
}

/// In-memory [`TokenStore`], keyed by token hash.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, AccessTokenRecord>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert(&self, record: AccessTokenRecord) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().map_err(|_| StoreError::LockPoisoned)?;
        tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<AccessTokenRecord>, StoreError> {
        let tokens = self.tokens.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tokens.get(token_hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    use crate::domain::{AccountRole, EventStatus};

    fn sample_event(name: &str) -> Event {
        let mut event = Event::new_draft(EventId::new(), None, Utc::now());
        event.name = name.to_string();
        event
    }

    fn sample_account(email: &str) -> Account {
        Account {
            id: AccountId::new(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
            roles: BTreeSet::from([AccountRole::User]),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_save_and_find() {
        let store = InMemoryEventStore::new();
        let event = sample_event("one");

        let saved = store.save(event.clone()).await.unwrap();
        assert_eq!(saved, event);

        let found = store.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(found.name, "one");
        assert_eq!(found.status, EventStatus::Draft);
    }

    #[tokio::test]
    async fn test_event_save_replaces_existing() {
        let store = InMemoryEventStore::new();
        let mut event = sample_event("before");
        store.save(event.clone()).await.unwrap();

        event.name = "after".to_string();
        store.save(event.clone()).await.unwrap();

        let found = store.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(found.name, "after");

        let page = store.find_all_paged(PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_paged() {
        let store = InMemoryEventStore::new();
        for i in 0..30 {
            store.save(sample_event(&format!("event {i}"))).await.unwrap();
        }

        let page = store
            .find_all_paged(PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_elements, 30);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].name, "event 29");

        let last = store
            .find_all_paged(PageRequest::new(2, 10))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 10);
        assert_eq!(last.items[9].name, "event 0");

        let past_end = store
            .find_all_paged(PageRequest::new(3, 10))
            .await
            .unwrap();
        assert!(past_end.items.is_empty());
    }

    #[tokio::test]
    async fn test_account_duplicate_email_conflicts() {
        let store = InMemoryAccountStore::new();
        store.save(sample_account("a@evently.dev")).await.unwrap();

        let result = store.save(sample_account("a@evently.dev")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_account_lookup_by_email_and_id() {
        let store = InMemoryAccountStore::new();
        let account = store.save(sample_account("a@evently.dev")).await.unwrap();

        let by_email = store.find_by_email("a@evently.dev").await.unwrap().unwrap();
        assert_eq!(by_email.id, account.id);

        let by_id = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@evently.dev");

        assert!(store.find_by_email("b@evently.dev").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_roundtrip() {
        let store = InMemoryTokenStore::new();
        let record = AccessTokenRecord {
            token_hash: "abc123".to_string(),
            account_id: AccountId::new(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
        };

        store.insert(record.clone()).await.unwrap();

        let found = store.find_by_hash("abc123").await.unwrap().unwrap();
        assert_eq!(found, record);
        assert!(store.find_by_hash("missing").await.unwrap().is_none());
    }
}
