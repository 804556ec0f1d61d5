//! Worker configuration
//!
//! Built once at startup and handed to the dispatcher and job runner. Nothing
//! below `main` reads the environment.

use fixwidth_common::{FixwidthError, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::reassembler::DEFAULT_MAX_LINE_BYTES;
use crate::storage::config::DEFAULT_PROCESSED_BUCKET;
use crate::storage::StorageConfig;

// ============================================================================
// Worker Configuration Constants
// ============================================================================

/// Default backend API base URL for local development.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

/// Default notification channel the backend publishes job ids on.
pub const DEFAULT_CHANNEL: &str = "ingest_jobs";

pub const DEFAULT_PG_HOST: &str = "localhost";
pub const DEFAULT_PG_PORT: u16 = 5432;
pub const DEFAULT_PG_DATABASE: &str = "validation_db";
pub const DEFAULT_PG_USER: &str = "postgres";
pub const DEFAULT_PG_PASSWORD: &str = "password";

/// Default timeout for metadata and status requests in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default pause after a failed notification receive in seconds.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 1;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub backend_url: String,
    pub database_url: String,
    pub channel: String,
    pub storage: StorageConfig,
    /// Longest accepted logical line; longer lines become row errors
    pub max_line_bytes: usize,
    pub http_timeout_secs: u64,
    pub reconnect_delay_secs: u64,
}

/// Command line values that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub database_url: Option<String>,
    pub channel: Option<String>,
}

impl WorkerConfig {
    /// Load `.env` and read the environment
    ///
    /// Not validated yet; see [`WorkerConfig::with_overrides`].
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Apply command line overrides, then validate the result
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(url) = overrides.backend_url {
            self.backend_url = url;
        }
        if let Some(url) = overrides.database_url {
            self.database_url = url;
        }
        if let Some(channel) = overrides.channel {
            self.channel = channel;
        }

        self.validate()?;
        Ok(self)
    }

    /// Read settings from environment variables, with local defaults
    ///
    /// `DATABASE_URL` wins over the individual `PG*` variables.
    pub fn from_env() -> Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => format!(
                "postgres://{}:{}@{}:{}/{}",
                env_or("PGUSER", DEFAULT_PG_USER),
                env_or("PGPASSWORD", DEFAULT_PG_PASSWORD),
                env_or("PGHOST", DEFAULT_PG_HOST),
                env_parse_or("PGPORT", DEFAULT_PG_PORT)?,
                env_or("PGDATABASE", DEFAULT_PG_DATABASE),
            ),
        };

        Ok(Self {
            backend_url: env_or("BACKEND_URL", DEFAULT_BACKEND_URL),
            database_url,
            channel: env_or("INGEST_CHANNEL", DEFAULT_CHANNEL),
            storage: StorageConfig::from_env()?,
            max_line_bytes: env_parse_or("INGEST_MAX_LINE_BYTES", DEFAULT_MAX_LINE_BYTES)?,
            http_timeout_secs: env_parse_or("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            reconnect_delay_secs: env_parse_or(
                "RECONNECT_DELAY_SECS",
                DEFAULT_RECONNECT_DELAY_SECS,
            )?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(FixwidthError::config(format!(
                "Backend URL must be http(s), got '{}'",
                self.backend_url
            )));
        }

        if self.channel.trim().is_empty() {
            return Err(FixwidthError::config("Notification channel cannot be empty"));
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(FixwidthError::config("Output bucket cannot be empty"));
        }

        if self.max_line_bytes == 0 {
            return Err(FixwidthError::config("Maximum line length must be greater than 0"));
        }

        if self.http_timeout_secs == 0 {
            return Err(FixwidthError::config("HTTP timeout must be greater than 0"));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            database_url: format!(
                "postgres://{}:{}@{}:{}/{}",
                DEFAULT_PG_USER, DEFAULT_PG_PASSWORD, DEFAULT_PG_HOST, DEFAULT_PG_PORT, DEFAULT_PG_DATABASE
            ),
            channel: DEFAULT_CHANNEL.to_string(),
            storage: StorageConfig::for_minio("http://localhost:9000", DEFAULT_PROCESSED_BUCKET),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
        }
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse `key` when set; an unparseable value is an error, not a default
pub(crate) fn env_parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| FixwidthError::invalid_value(key, raw)),
        Err(_) => Ok(default),
    }
}
