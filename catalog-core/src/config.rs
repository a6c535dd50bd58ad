//! Database configuration.
//!
//! Values come from an optional TOML file (`[database]` table) and are then
//! overridden by environment variables. A `.env` file in the working directory
//! is loaded first so local development can keep `DATABASE_URL` there.

use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 2;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(1800);

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no database URL configured (set DATABASE_URL or [database].url)")]
    MissingDatabaseUrl,

    #[error("invalid database URL: {source}")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported database URL scheme `{0}` (expected postgres)")]
    UnsupportedScheme(String),

    #[error("invalid duration for {key}: {source}")]
    InvalidDuration {
        key: &'static str,
        #[source]
        source: humantime::DurationError,
    },

    #[error("invalid number for {key}: `{value}`")]
    InvalidNumber { key: &'static str, value: String },

    #[error(
        "min_connections ({min}) must not exceed max_connections ({max})"
    )]
    PoolBounds { min: u32, max: u32 },
}

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub database: FileDatabaseConfig,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileDatabaseConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout: Option<String>,
    pub idle_timeout: Option<String>,
    pub max_lifetime: Option<String>,
}

impl FileConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

/// Environment overrides, captured as raw strings and validated on compose.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub database_url: Option<String>,
    pub max_connections: Option<String>,
    pub min_connections: Option<String>,
    pub acquire_timeout: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            database_url: non_empty_var("DATABASE_URL"),
            max_connections: non_empty_var("DB_MAX_CONNECTIONS"),
            min_connections: non_empty_var("DB_MIN_CONNECTIONS"),
            acquire_timeout: non_empty_var("DB_ACQUIRE_TIMEOUT"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Effective connection settings for the Postgres pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    /// Settings with pool defaults for the given URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_lifetime: DEFAULT_MAX_LIFETIME,
        }
    }

    /// Load `.env`, the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        if let Ok(env_path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", env_path.display());
        }

        let file = match path {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };

        Self::compose(file.database, EnvConfig::gather())
    }

    /// Merge file values with environment overrides; env wins.
    pub fn compose(
        file: FileDatabaseConfig,
        env: EnvConfig,
    ) -> Result<Self, ConfigLoadError> {
        let url = env
            .database_url
            .or(file.url.filter(|value| !value.trim().is_empty()))
            .ok_or(ConfigLoadError::MissingDatabaseUrl)?;
        validate_url(&url)?;

        let max_connections = match env.max_connections {
            Some(raw) => parse_u32("DB_MAX_CONNECTIONS", &raw)?,
            None => file.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };
        let min_connections = match env.min_connections {
            Some(raw) => parse_u32("DB_MIN_CONNECTIONS", &raw)?,
            None => file.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS),
        };
        if min_connections > max_connections {
            return Err(ConfigLoadError::PoolBounds {
                min: min_connections,
                max: max_connections,
            });
        }

        let acquire_timeout = match env.acquire_timeout.or(file.acquire_timeout)
        {
            Some(raw) => parse_duration("acquire_timeout", &raw)?,
            None => DEFAULT_ACQUIRE_TIMEOUT,
        };
        let idle_timeout = match file.idle_timeout {
            Some(raw) => parse_duration("idle_timeout", &raw)?,
            None => DEFAULT_IDLE_TIMEOUT,
        };
        let max_lifetime = match file.max_lifetime {
            Some(raw) => parse_duration("max_lifetime", &raw)?,
            None => DEFAULT_MAX_LIFETIME,
        };

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout,
            idle_timeout,
            max_lifetime,
        })
    }
}

fn validate_url(raw: &str) -> Result<(), ConfigLoadError> {
    let parsed = Url::parse(raw)
        .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(ConfigLoadError::UnsupportedScheme(other.to_string())),
    }
}

fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ConfigLoadError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigLoadError::InvalidNumber {
            key,
            value: raw.to_string(),
        })
}

fn parse_duration(
    key: &'static str,
    raw: &str,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim())
        .map_err(|source| ConfigLoadError::InvalidDuration { key, source })
}
