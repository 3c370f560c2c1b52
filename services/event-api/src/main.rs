//! evently event API server.
//!
//! Serves the event-enrollment REST API: event lifecycle operations with
//! account-based authentication and ownership-based authorization.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use evently_api::{
    api,
    config::{Config, StoreBackend},
    domain::AccountRole,
    service::{AccountService, AuthGate, EventService},
    state::AppState,
    store::{
        memory::{InMemoryAccountStore, InMemoryEventStore, InMemoryTokenStore},
        postgres::PgDatabase,
        AccountStore, EventStore, StoreError, TokenStore,
    },
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to EVENTLY_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting evently event API");
    info!(listen_addr = %config.listen_addr, "Configuration loaded");

    // Wire the store backend
    let (event_store, account_store, token_store): (
        Arc<dyn EventStore>,
        Arc<dyn AccountStore>,
        Arc<dyn TokenStore>,
    ) = match config.store {
        StoreBackend::Memory => {
            info!("Using in-memory stores");
            (
                Arc::new(InMemoryEventStore::new()),
                Arc::new(InMemoryAccountStore::new()),
                Arc::new(InMemoryTokenStore::new()),
            )
        }
        StoreBackend::Postgres => {
            let db = PgDatabase::connect(&config.database).await?;

            // Run migrations in dev mode
            if config.dev_mode {
                info!("Running database migrations (dev mode)");
                db.run_migrations().await?;
            }

            (
                Arc::new(db.event_store()),
                Arc::new(db.account_store()),
                Arc::new(db.token_store()),
            )
        }
    };

    // Explicit constructor wiring; no ambient container.
    let events = EventService::new(event_store);
    let accounts = AccountService::new(account_store.clone());
    let auth = AuthGate::new(account_store, token_store);

    // Seed a bootstrap account in dev mode
    if config.dev_mode {
        let roles = BTreeSet::from([AccountRole::Admin, AccountRole::User]);
        match accounts
            .save_account(&config.seed_email, &config.seed_password, roles)
            .await
        {
            Ok(account) => info!(email = %account.email, "Seeded bootstrap account"),
            Err(StoreError::Conflict(_)) => {
                debug!(email = %config.seed_email, "Bootstrap account already exists")
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Create application state
    let state = AppState::new(events, accounts, auth);

    // Build and run the server
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Event API shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received shutdown signal");
}
