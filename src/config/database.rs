use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use super::env_parse;
use crate::core::{AppError, Result};

/// MySQL settings, used only with `LEDGER_BACKEND=mysql`
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    /// Connections kept open
    pub pool_size: u32,
    pub max_connections: u32,
    /// How long a submission waits for a connection before failing
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            pool_size: env_parse("DATABASE_POOL_SIZE", 5)?,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 20)?,
            acquire_timeout_secs: env_parse("DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?,
        })
    }

    /// Connect the pool; append transactions hold a row lock, so connections
    /// are checked before reuse rather than discovered dead mid-transaction
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| AppError::Configuration("DATABASE_URL not set".to_string()))?;

        let pool = MySqlPoolOptions::new()
            .min_connections(self.pool_size)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(10 * 60))
            .test_before_acquire(true)
            .connect(url)
            .await?;

        Ok(pool)
    }
}
