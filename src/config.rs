use anyhow::{Context, Result};
use std::env;

/// Default session lifetime, matching the 24-hour server policy.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// Default size of the bounded durable-write worker pool.
pub const DEFAULT_PERSIST_WORKERS: usize = 6;

/// The server's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The address the HTTP listener binds to.
    pub bind_addr: String,
    /// Session lifetime in hours.
    pub session_ttl_hours: i64,
    /// Number of concurrent durable-store workers.
    pub persist_workers: usize,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| DEFAULT_SESSION_TTL_HOURS.to_string())
                .parse()
                .context("Invalid SESSION_TTL_HOURS")?,
            persist_workers: env::var("PERSIST_WORKERS")
                .unwrap_or_else(|_| DEFAULT_PERSIST_WORKERS.to_string())
                .parse()
                .context("Invalid PERSIST_WORKERS")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: "127.0.0.1:3000".to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            persist_workers: DEFAULT_PERSIST_WORKERS,
        }
    }
}
