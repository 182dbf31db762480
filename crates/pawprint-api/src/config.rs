//! Server configuration read from the environment.

use axum::http::HeaderValue;
use tracing::warn;

use pawprint_core::defaults::{SERVER_HOST, SERVER_PORT};
use pawprint_core::{Error, Result};

/// Origins allowed by CORS when `ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Apply pending migrations at startup.
    pub run_migrations: bool,
    /// Comma-separated list, as given.
    pub allowed_origins: String,
}

impl ApiConfig {
    /// Read `DATABASE_URL`, `HOST`, `PORT`, `RUN_MIGRATIONS` and
    /// `ALLOWED_ORIGINS`. Only `DATABASE_URL` is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".to_string()))?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", raw)))?,
            None => SERVER_PORT,
        };

        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| SERVER_HOST.to_string()),
            port,
            run_migrations,
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed CORS origins. Invalid entries are skipped with a warning.
    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Invalid CORS origin '{}': {}", trimmed, e);
                        None
                    }
                }
            })
            .collect()
    }
}
