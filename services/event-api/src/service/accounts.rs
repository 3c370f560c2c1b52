//! Account management.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use evently_id::AccountId;

use crate::domain::{Account, AccountRole};
use crate::service::auth::hash_password;
use crate::store::{AccountStore, StoreError};

/// Creates and looks up accounts. The plain password is digested here and
/// never stored.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Persists a new account. A duplicate email surfaces the store's
    /// conflict error.
    pub async fn save_account(
        &self,
        email: &str,
        password: &str,
        roles: BTreeSet<AccountRole>,
    ) -> Result<Account, StoreError> {
        let account = Account {
            id: AccountId::new(),
            email: email.to_string(),
            password_hash: hash_password(password),
            roles,
            created_at: Utc::now(),
        };
        self.store.save(account).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.store.find_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::memory::InMemoryAccountStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(InMemoryAccountStore::new()))
    }

    #[tokio::test]
    async fn test_save_account_digests_password() {
        let service = service();

        let account = service
            .save_account(
                "joonyeop@email.com",
                "1234",
                BTreeSet::from([AccountRole::Admin, AccountRole::User]),
            )
            .await
            .unwrap();

        assert_ne!(account.password_hash, "1234");
        assert_eq!(account.password_hash, hash_password("1234"));
        assert!(account.roles.contains(&AccountRole::Admin));
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let service = service();
        service
            .save_account(
                "joonyeop@email.com",
                "1234",
                BTreeSet::from([AccountRole::User]),
            )
            .await
            .unwrap();

        let found = service.find_by_email("joonyeop@email.com").await.unwrap();
        assert_eq!(found.unwrap().email, "joonyeop@email.com");

        let missing = service.find_by_email("random@email.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let service = service();
        let roles = BTreeSet::from([AccountRole::User]);
        service
            .save_account("joonyeop@email.com", "1234", roles.clone())
            .await
            .unwrap();

        let result = service
            .save_account("joonyeop@email.com", "5678", roles)
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }
}
