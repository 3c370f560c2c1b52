//! Token generation, hashing, and the authentication gate.
//!
//! Tokens are opaque bearer credentials: `evy_at_<32 random bytes base64>`,
//! stored hashed (SHA-256) in the token store. Resolving a credential never
//! errors toward the caller: absent, malformed, unknown, or expired tokens
//! all resolve to anonymous, and the lifecycle service decides per
//! operation whether anonymous is acceptable.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::Account;
use crate::store::{AccessTokenRecord, AccountStore, StoreError, TokenStore};

/// Access token prefix.
pub const ACCESS_TOKEN_PREFIX: &str = "evy_at_";

/// Access token lifetime.
pub const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Token bytes (32 bytes = 256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// Generate a new access token.
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    let encoded = URL_SAFE_NO_PAD.encode(bytes);
    format!("{ACCESS_TOKEN_PREFIX}{encoded}")
}

/// Hash a token for storage using SHA-256, as a hex string.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Hash a password for storage using SHA-256, as a hex string.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    format!("{:x}", digest)
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; indistinguishable to the caller.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A freshly issued token. The plaintext token leaves the gate exactly
/// once, here.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Seconds until expiry, for the token response body.
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Resolves bearer credentials to accounts and issues new credentials.
#[derive(Clone)]
pub struct AuthGate {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<dyn TokenStore>,
}

impl AuthGate {
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { accounts, tokens }
    }

    /// Verifies the password against the stored digest and issues a bearer
    /// token for the account.
    pub async fn issue_token(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if hash_password(password) != account.password_hash {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_access_token();
        let now = Utc::now();
        let expires_at = now + Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS);

        self.tokens
            .insert(AccessTokenRecord {
                token_hash: hash_token(&token),
                account_id: account.id,
                issued_at: now,
                expires_at,
            })
            .await?;

        Ok(IssuedToken {
            access_token: token,
            expires_at,
        })
    }

    /// Resolves the request's bearer token to an account. Anything short of
    /// a valid, unexpired token for an existing account is anonymous.
    pub async fn current_account(&self, bearer_token: Option<&str>) -> Option<Account> {
        let token = bearer_token?;
        if !token.starts_with(ACCESS_TOKEN_PREFIX) {
            return None;
        }

        let record = match self.tokens.find_by_hash(&hash_token(token)).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::error!(error = %e, "Failed to look up access token");
                return None;
            }
        };

        if record.expires_at < Utc::now() {
            return None;
        }

        match self.accounts.find_by_id(record.account_id).await {
            Ok(account) => account,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load account for access token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::domain::AccountRole;
    use crate::service::AccountService;
    use crate::store::memory::{InMemoryAccountStore, InMemoryTokenStore};

    fn gate_with_account() -> (AuthGate, AccountService) {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let tokens = Arc::new(InMemoryTokenStore::new());
        let gate = AuthGate::new(accounts.clone(), tokens.clone());
        let service = AccountService::new(accounts);
        (gate, service)
    }

    async fn seed(service: &AccountService) {
        service
            .save_account(
                "joonyeop@email.com",
                "1234",
                BTreeSet::from([AccountRole::User]),
            )
            .await
            .unwrap();
    }

    #[test]
    fn test_access_token_format() {
        let token = generate_access_token();
        assert!(token.starts_with(ACCESS_TOKEN_PREFIX));
        assert!(token.len() > ACCESS_TOKEN_PREFIX.len() + 40); // base64 of 32 bytes
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_access_token(), generate_access_token());
    }

    #[test]
    fn test_hash_token_deterministic() {
        let token = "test_token_123";
        assert_eq!(hash_token(token), hash_token(token));
        assert_ne!(hash_token("token1"), hash_token("token2"));
    }

    #[tokio::test]
    async fn test_issue_and_resolve_roundtrip() {
        let (gate, accounts) = gate_with_account();
        seed(&accounts).await;

        let issued = gate.issue_token("joonyeop@email.com", "1234").await.unwrap();
        assert!(issued.access_token.starts_with(ACCESS_TOKEN_PREFIX));
        assert!(issued.expires_in() > 0);

        let account = gate
            .current_account(Some(&issued.access_token))
            .await
            .unwrap();
        assert_eq!(account.email, "joonyeop@email.com");
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let (gate, accounts) = gate_with_account();
        seed(&accounts).await;

        let result = gate.issue_token("joonyeop@email.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let (gate, _accounts) = gate_with_account();

        let result = gate.issue_token("random@email.com", "1234").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_garbage_token_resolves_to_anonymous() {
        let (gate, accounts) = gate_with_account();
        seed(&accounts).await;

        assert!(gate.current_account(None).await.is_none());
        assert!(gate.current_account(Some("not-a-token")).await.is_none());
        assert!(gate
            .current_account(Some("evy_at_unknowntoken"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_token_resolves_to_anonymous() {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let tokens = Arc::new(InMemoryTokenStore::new());
        let gate = AuthGate::new(accounts.clone(), tokens.clone());
        let service = AccountService::new(accounts);
        let account = service
            .save_account("a@evently.dev", "pw", BTreeSet::from([AccountRole::User]))
            .await
            .unwrap();

        let token = generate_access_token();
        use crate::store::TokenStore as _;
        tokens
            .insert(AccessTokenRecord {
                token_hash: hash_token(&token),
                account_id: account.id,
                issued_at: Utc::now() - Duration::hours(48),
                expires_at: Utc::now() - Duration::hours(24),
            })
            .await
            .unwrap();

        assert!(gate.current_account(Some(&token)).await.is_none());
    }
}
