/// Configuration management for Engagement Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Which store implementation backs the service
    pub store: StoreBackend,
    /// Database configuration, present for the postgres backend
    pub database: Option<DatabaseConfig>,
    /// JSON seed for the memory backend
    pub seed_file: Option<PathBuf>,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Mount /api/v1/admin routes
    pub admin_enabled: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" | "inmemory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let app = AppConfig {
            env: var("APP_ENV").unwrap_or_else(|| "development".to_string()),
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            http_port: var("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8010), // engagement-service default HTTP port
            admin_enabled: var("ENGAGEMENT_ADMIN_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        };

        let store = match var("STORE_BACKEND") {
            Some(raw) => raw.parse::<StoreBackend>().context("Invalid STORE_BACKEND")?,
            None => StoreBackend::Postgres,
        };

        let database = match store {
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: var("DB_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: var("DB_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            }),
            StoreBackend::Memory => None,
        };

        Ok(Config {
            app,
            store,
            database,
            seed_file: var("SEED_FILE").map(PathBuf::from),
        })
    }
}
