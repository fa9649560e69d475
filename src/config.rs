//! Process configuration read from the environment.
//!
//! Environment variables:
//!   DATABASE_URL                  Postgres connection string (required)
//!   DATABASE_POOL_SIZE            max pool connections (default: 10)
//!   DATABASE_CONNECT_TIMEOUT_SECS acquire timeout (default: 30)
//!   BIND_ADDR                     listen address (default: 0.0.0.0:8000)
//!   JWT_SECRET                    bearer token HMAC secret (required)
//!   AGGREGATE_CACHE_TTL_SECS      aggregate cache TTL (default: 300)
//!   SEED_DATA_JSON                seed document imported at startup (optional)
//!   RUN_MIGRATIONS                apply migrations at startup (default: true)
//!   LOG_FORMAT                    `json` or `pretty` (default: json)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::database::DatabaseConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub cache_ttl: Duration,
    pub seed_data_json: Option<PathBuf>,
    pub run_migrations: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let mut database = DatabaseConfig::new(required("DATABASE_URL")?);
        if let Some(size) = parse(get("DATABASE_POOL_SIZE"), "DATABASE_POOL_SIZE")? {
            database.max_connections = size;
        }
        if let Some(secs) = parse(
            get("DATABASE_CONNECT_TIMEOUT_SECS"),
            "DATABASE_CONNECT_TIMEOUT_SECS",
        )? {
            database.connection_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            database,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".into()),
            jwt_secret: required("JWT_SECRET")?,
            cache_ttl: Duration::from_secs(
                parse(get("AGGREGATE_CACHE_TTL_SECS"), "AGGREGATE_CACHE_TTL_SECS")?.unwrap_or(300),
            ),
            seed_data_json: get("SEED_DATA_JSON").map(PathBuf::from),
            run_migrations: parse(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS")?.unwrap_or(true),
            log_format: parse(get("LOG_FORMAT"), "LOG_FORMAT")?.unwrap_or_default(),
        })
    }
}

fn parse<T: FromStr>(value: Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value: v })
        })
        .transpose()
}
