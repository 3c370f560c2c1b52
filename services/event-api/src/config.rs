use std::net::SocketAddr;

use anyhow::{bail, Result};

use crate::store::postgres::PgConfig;

/// Which store adapters to wire at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreBackend,
    pub seed_email: String,
    pub seed_password: String,
    pub database: PgConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("EVENTLY_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = std::env::var("EVENTLY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let dev_mode = std::env::var("EVENTLY_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let store = match std::env::var("EVENTLY_STORE").as_deref() {
            Err(_) | Ok("postgres") => StoreBackend::Postgres,
            Ok("memory") => StoreBackend::Memory,
            Ok(other) => bail!("unknown EVENTLY_STORE '{other}' (expected 'postgres' or 'memory')"),
        };

        let seed_email = std::env::var("EVENTLY_SEED_EMAIL")
            .unwrap_or_else(|_| "admin@evently.dev".to_string());
        let seed_password =
            std::env::var("EVENTLY_SEED_PASSWORD").unwrap_or_else(|_| "evently".to_string());

        let database = PgConfig::from_env();

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            seed_email,
            seed_password,
            database,
        })
    }
}
