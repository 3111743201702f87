use crate::core::{AppError, Result, SchoolClock};
use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or blank
pub(crate) fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e| {
            AppError::Configuration(format!("Invalid {} '{}': {}", name, raw, e))
        }),
        _ => Ok(default),
    }
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub ledger: LedgerConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Whole-hour UTC offset of the school, used for overdue evaluation
    pub school_utc_offset_hours: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::Configuration(format!("Invalid LOG_FORMAT: {}", other))),
        }
    }
}

/// Where ledger entries, enrollments and fee plans live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    Mysql,
    Memory,
}

impl FromStr for LedgerBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Configuration(format!(
                "Invalid LEDGER_BACKEND: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    /// JSON seed for the in-memory catalog
    pub catalog_seed_file: Option<String>,
}

/// How charges are confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationMode {
    /// Provider authorizes at submission
    Immediate,
    /// Provider confirms later on `POST /payments/callback`
    Callback,
}

impl FromStr for ConfirmationMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "callback" => Ok(Self::Callback),
            other => Err(AppError::Configuration(format!(
                "Invalid PAYMENT_CONFIRMATION: {}",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub confirmation: ConfirmationMode,
    pub callback_secret: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("confirmation", &self.confirmation)
            .field("callback_secret", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
                log_format: env::var("LOG_FORMAT")
                    .unwrap_or_else(|_| "pretty".to_string())
                    .parse()?,
                school_utc_offset_hours: env_parse("SCHOOL_UTC_OFFSET_HOURS", 0)?,
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            ledger: LedgerConfig {
                backend: env::var("LEDGER_BACKEND")
                    .unwrap_or_else(|_| "mysql".to_string())
                    .parse()?,
                catalog_seed_file: env::var("CATALOG_SEED_FILE")
                    .ok()
                    .filter(|path| !path.trim().is_empty()),
            },
            provider: ProviderConfig {
                confirmation: env::var("PAYMENT_CONFIRMATION")
                    .unwrap_or_else(|_| "callback".to_string())
                    .parse()?,
                callback_secret: env::var("PROVIDER_CALLBACK_SECRET").map_err(|_| {
                    AppError::Configuration("PROVIDER_CALLBACK_SECRET not set".to_string())
                })?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ledger.backend == LedgerBackend::Mysql && self.database.url.is_none() {
            return Err(AppError::Configuration(
                "DATABASE_URL is required with LEDGER_BACKEND=mysql".to_string(),
            ));
        }

        if self.database.pool_size > self.database.max_connections {
            return Err(AppError::Configuration(
                "DATABASE_POOL_SIZE cannot exceed DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }

        if self.provider.callback_secret.len() < 16 {
            return Err(AppError::Configuration(
                "PROVIDER_CALLBACK_SECRET must be at least 16 characters".to_string(),
            ));
        }

        if self.school_clock().is_none() {
            return Err(AppError::Configuration(format!(
                "SCHOOL_UTC_OFFSET_HOURS out of range: {}",
                self.app.school_utc_offset_hours
            )));
        }

        if self.server.workers == 0 {
            return Err(AppError::Configuration(
                "SERVER_WORKERS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Clock for the configured school offset
    pub fn school_clock(&self) -> Option<SchoolClock> {
        SchoolClock::from_utc_offset_hours(self.app.school_utc_offset_hours)
    }
}
