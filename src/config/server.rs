use super::env_parse;
use crate::core::Result;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Seconds in-flight submissions get to finish on shutdown
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            workers: num_cpus::get(),
            shutdown_timeout_secs: 30,
        }
    }

    /// `SERVER_HOST`, `SERVER_PORT`, `SERVER_WORKERS`, `SERVER_SHUTDOWN_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::new("0.0.0.0", 8080);
        Ok(Self {
            host: env_parse("SERVER_HOST", defaults.host)?,
            port: env_parse("SERVER_PORT", defaults.port)?,
            workers: env_parse("SERVER_WORKERS", defaults.workers)?,
            shutdown_timeout_secs: env_parse(
                "SERVER_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout_secs,
            )?,
        })
    }

    pub fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
