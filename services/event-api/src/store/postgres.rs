//! Postgres store adapters.
//!
//! SQLx with runtime-bound queries and hand-written row mappings; the
//! macros feature stays off so builds never need a live database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evently_id::{AccountId, EventId};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

use crate::domain::{Account, AccountRole, Event, EventStatus};
use crate::store::{
    AccessTokenRecord, AccountStore, EventStore, Page, PageRequest, StoreError, TokenStore,
};

/// Database configuration.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// Database connection URL.
    pub database_url: String,

    /// Maximum number of connections in the pool.
    pub max_connections: u32,

    /// Minimum number of idle connections.
    pub min_connections: u32,

    /// Connection acquire timeout.
    pub acquire_timeout: Duration,

    /// Idle connection timeout.
    pub idle_timeout: Duration,

    /// Maximum lifetime of a connection.
    pub max_lifetime: Duration,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/evently".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PgConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/evently".to_string());

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        Self {
            database_url,
            max_connections,
            min_connections,
            ..Default::default()
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Create a new database connection pool.
    pub async fn connect(config: &PgConfig) -> Result<Self, StoreError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(&config.database_url)
            .await
            .map_err(StoreError::Connect)?;

        info!("Database connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// Note: In production, migrations should be run via a separate
    /// migration tool or as part of deployment. This method uses runtime
    /// migration loading.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations");

        let candidates = [
            std::path::PathBuf::from("./migrations"),
            std::path::PathBuf::from("services/event-api/migrations"),
            std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations"),
        ];

        let mut last_error: Option<sqlx::migrate::MigrateError> = None;
        for dir in &candidates {
            match sqlx::migrate::Migrator::new(dir.clone()).await {
                Ok(migrator) => {
                    info!(migrations_dir = %dir.display(), "Loaded migrations");
                    migrator
                        .run(&self.pool)
                        .await
                        .map_err(StoreError::Migration)?;
                    info!("Database migrations complete");
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        let tried = candidates
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Err(StoreError::MigrationDirNotFound {
            tried,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Check if the database is reachable.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }

    pub fn event_store(&self) -> PgEventStore {
        PgEventStore {
            pool: self.pool.clone(),
        }
    }

    pub fn account_store(&self) -> PgAccountStore {
        PgAccountStore {
            pool: self.pool.clone(),
        }
    }

    pub fn token_store(&self) -> PgTokenStore {
        PgTokenStore {
            pool: self.pool.clone(),
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

// =============================================================================
// Events
// =============================================================================

/// Postgres-backed [`EventStore`].
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn save(&self, event: Event) -> Result<Event, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events (
                event_id, name, description,
                begin_enrollment_date_time, close_enrollment_date_time,
                begin_event_date_time, end_event_date_time,
                location, base_price, max_price, limit_of_enrollment,
                free, offline, event_status, manager_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (event_id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                begin_enrollment_date_time = EXCLUDED.begin_enrollment_date_time,
                close_enrollment_date_time = EXCLUDED.close_enrollment_date_time,
                begin_event_date_time = EXCLUDED.begin_event_date_time,
                end_event_date_time = EXCLUDED.end_event_date_time,
                location = EXCLUDED.location,
                base_price = EXCLUDED.base_price,
                max_price = EXCLUDED.max_price,
                limit_of_enrollment = EXCLUDED.limit_of_enrollment,
                free = EXCLUDED.free,
                offline = EXCLUDED.offline,
                event_status = EXCLUDED.event_status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.begin_enrollment_date_time)
        .bind(event.close_enrollment_date_time)
        .bind(event.begin_event_date_time)
        .bind(event.end_event_date_time)
        .bind(&event.location)
        .bind(event.base_price)
        .bind(event.max_price)
        .bind(event.limit_of_enrollment)
        .bind(event.free)
        .bind(event.offline)
        .bind(event.status.as_str())
        .bind(event.manager.map(|id| id.to_string()))
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, name, description,
                   begin_enrollment_date_time, close_enrollment_date_time,
                   begin_event_date_time, end_event_date_time,
                   location, base_price, max_price, limit_of_enrollment,
                   free, offline, event_status, manager_id, created_at, updated_at
            FROM events
            WHERE event_id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.map(Event::try_from).transpose()
    }

    async fn find_all_paged(&self, request: PageRequest) -> Result<Page<Event>, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Query)?;

        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, name, description,
                   begin_enrollment_date_time, close_enrollment_date_time,
                   begin_event_date_time, end_event_date_time,
                   location, base_price, max_price, limit_of_enrollment,
                   free, offline, event_status, manager_id, created_at, updated_at
            FROM events
            ORDER BY event_id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(request.size()))
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        let items = rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, request, total as u64))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Query)?;
        Ok(())
    }
}

/// Row from the events table.
struct EventRow {
    event_id: String,
    name: String,
    description: String,
    begin_enrollment_date_time: DateTime<Utc>,
    close_enrollment_date_time: DateTime<Utc>,
    begin_event_date_time: DateTime<Utc>,
    end_event_date_time: DateTime<Utc>,
    location: Option<String>,
    base_price: i64,
    max_price: i64,
    limit_of_enrollment: i64,
    free: bool,
    offline: bool,
    event_status: String,
    manager_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            event_id: row.try_get("event_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            begin_enrollment_date_time: row.try_get("begin_enrollment_date_time")?,
            close_enrollment_date_time: row.try_get("close_enrollment_date_time")?,
            begin_event_date_time: row.try_get("begin_event_date_time")?,
            end_event_date_time: row.try_get("end_event_date_time")?,
            location: row.try_get("location")?,
            base_price: row.try_get("base_price")?,
            max_price: row.try_get("max_price")?,
            limit_of_enrollment: row.try_get("limit_of_enrollment")?,
            free: row.try_get("free")?,
            offline: row.try_get("offline")?,
            event_status: row.try_get("event_status")?,
            manager_id: row.try_get("manager_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = EventId::parse(&row.event_id)
            .map_err(|e| StoreError::Decode(format!("event_id '{}': {e}", row.event_id)))?;
        let status = EventStatus::from_str(&row.event_status).ok_or_else(|| {
            StoreError::Decode(format!("unknown event_status '{}'", row.event_status))
        })?;
        let manager = row
            .manager_id
            .as_deref()
            .map(AccountId::parse)
            .transpose()
            .map_err(|e| StoreError::Decode(format!("manager_id: {e}")))?;

        Ok(Event {
            id,
            name: row.name,
            description: row.description,
            begin_enrollment_date_time: row.begin_enrollment_date_time,
            close_enrollment_date_time: row.close_enrollment_date_time,
            begin_event_date_time: row.begin_event_date_time,
            end_event_date_time: row.end_event_date_time,
            location: row.location,
            base_price: row.base_price,
            max_price: row.max_price,
            limit_of_enrollment: row.limit_of_enrollment,
            free: row.free,
            offline: row.offline,
            status,
            manager,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Postgres-backed [`AccountStore`].
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn save(&self, account: Account) -> Result<Account, StoreError> {
        let roles = serde_json::to_value(&account.roles)?;

        sqlx::query(
            r#"
            INSERT INTO accounts (account_id, email, password_hash, roles, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&roles)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(account.email.clone())
            } else {
                StoreError::Query(e)
            }
        })?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT account_id, email, password_hash, roles, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT account_id, email, password_hash, roles, created_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.map(Account::try_from).transpose()
    }
}

/// Row from the accounts table.
struct AccountRow {
    account_id: String,
    email: String,
    password_hash: String,
    roles: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            account_id: row.try_get("account_id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            roles: row.try_get("roles")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let id = AccountId::parse(&row.account_id)
            .map_err(|e| StoreError::Decode(format!("account_id '{}': {e}", row.account_id)))?;
        let roles: std::collections::BTreeSet<AccountRole> = serde_json::from_value(row.roles)?;

        Ok(Account {
            id,
            email: row.email,
            password_hash: row.password_hash,
            roles,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Access tokens
// =============================================================================

/// Postgres-backed [`TokenStore`].
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert(&self, record: AccessTokenRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens (token_hash, account_id, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.token_hash)
        .bind(record.account_id.to_string())
        .bind(record.issued_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<AccessTokenRecord>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token_hash, account_id, issued_at, expires_at
            FROM access_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Query)?;

        row.map(|row| {
            let account_id = AccountId::parse(&row.account_id)
                .map_err(|e| StoreError::Decode(format!("account_id: {e}")))?;
            Ok(AccessTokenRecord {
                token_hash: row.token_hash,
                account_id,
                issued_at: row.issued_at,
                expires_at: row.expires_at,
            })
        })
        .transpose()
    }
}

/// Row from the access_tokens table.
struct TokenRow {
    token_hash: String,
    account_id: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for TokenRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            token_hash: row.try_get("token_hash")?,
            account_id: row.try_get("account_id")?,
            issued_at: row.try_get("issued_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pg_config_defaults() {
        let config = PgConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
    }
}
