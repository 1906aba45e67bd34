//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// API server configuration.
///
/// Component-level settings (Gemini, GitHub OAuth, encryption key) are read
/// by the respective crates' own `from_env` constructors at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Postgres connection URL.
    pub database_url: String,
    /// Frontend origin for CORS and OAuth redirects.
    pub frontend_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PRISM_API_ADDR` | Server bind address | `127.0.0.1:8000` |
    /// | `DATABASE_URL` | Postgres connection URL | (required) |
    /// | `FRONTEND_URL` | Frontend origin | `http://localhost:5173` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("PRISM_API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Self {
            addr,
            database_url,
            frontend_url,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PRISM_API_ADDR format")]
    InvalidAddr,

    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,
}
