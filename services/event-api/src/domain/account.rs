//! Account model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use evently_id::AccountId;
use serde::{Deserialize, Serialize};

/// Role attached to an account.
///
/// `Admin` exists for bootstrap seed data only; no admin-gated operation
/// ships in the current feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    Admin,
    User,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "ADMIN",
            AccountRole::User => "USER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(AccountRole::Admin),
            "USER" => Some(AccountRole::User),
            _ => None,
        }
    }
}

/// A registered account.
///
/// Deliberately not `Serialize`: the password digest must never reach a
/// response body. Presentation types pick the fields they expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Unique; doubles as the username.
    pub email: String,
    /// SHA-256 hex digest of the password. The plain credential is only
    /// handled inside the account service and the auth gate.
    pub password_hash: String,
    pub roles: BTreeSet<AccountRole>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&AccountRole::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(serde_json::to_string(&AccountRole::User).unwrap(), "\"USER\"");
    }

    #[test]
    fn test_role_str_roundtrip() {
        for role in [AccountRole::Admin, AccountRole::User] {
            assert_eq!(AccountRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(AccountRole::from_str("ROOT"), None);
    }
}
