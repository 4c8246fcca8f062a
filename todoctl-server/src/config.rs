//! Server configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `SECRET`: shared secret for `/stats` (unset = every call rejected)
//! - `TODOS_PATH`: todo document location (default: data/todos.json)
//! - `HOST` / `PORT`: bind address (default: 0.0.0.0:3000)
//! - `DATABASE_URL`, or `DATABASE_HOST` / `DATABASE_PORT` / `DATABASE_USER` /
//!   `DATABASE_PASSWORD` / `DATABASE_NAME`
//! - `DATABASE_RETRY_SECONDS`: reconnect delay (default: 30, `0` = one attempt)
//! - `REQUEST_TIMEOUT_SECONDS`: per-request timeout (default: 30)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

const DEFAULT_TODOS_PATH: &str = "data/todos.json";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_PORT: u16 = 5432;
const DEFAULT_RETRY_SECS: u64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// How the counter store reacts to a failed connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPolicy {
    /// Keep retrying after `delay` until a connection succeeds.
    Retry { delay: Duration },
    /// Make exactly one attempt at start-up.
    Once,
}

/// Postgres connection parameters
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Url(String),
    Params {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
    },
}

impl std::fmt::Debug for DatabaseConfig {
    // Keep credentials out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(_) => f.debug_tuple("Url").field(&"<redacted>").finish(),
            Self::Params {
                host,
                port,
                user,
                database,
                ..
            } => f
                .debug_struct("Params")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("database", database)
                .finish_non_exhaustive(),
        }
    }
}

impl DatabaseConfig {
    /// Build sqlx connect options.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            Self::Url(url) => url.parse(),
            Self::Params {
                host,
                port,
                user,
                password,
                database,
            } => {
                let mut options = PgConnectOptions::new().host(host).port(*port);
                if let Some(user) = user {
                    options = options.username(user);
                }
                if let Some(password) = password {
                    options = options.password(password);
                }
                if let Some(database) = database {
                    options = options.database(database);
                }
                Ok(options)
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub todos_path: PathBuf,
    pub secret: Option<String>,
    pub database: DatabaseConfig,
    pub connect_policy: ConnectPolicy,
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Create config from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.parse().map_err(|_| ConfigError::Invalid {
            key: "HOST",
            value: host.clone(),
        })?;
        let port = parse_or("PORT", var("PORT"), DEFAULT_PORT)?;

        let database = match var("DATABASE_URL") {
            Some(url) => DatabaseConfig::Url(url),
            None => DatabaseConfig::Params {
                host: var("DATABASE_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or("DATABASE_PORT", var("DATABASE_PORT"), DEFAULT_DATABASE_PORT)?,
                user: var("DATABASE_USER"),
                password: var("DATABASE_PASSWORD"),
                database: var("DATABASE_NAME"),
            },
        };

        let retry_secs = parse_or(
            "DATABASE_RETRY_SECONDS",
            var("DATABASE_RETRY_SECONDS"),
            DEFAULT_RETRY_SECS,
        )?;
        let connect_policy = if retry_secs == 0 {
            ConnectPolicy::Once
        } else {
            ConnectPolicy::Retry {
                delay: Duration::from_secs(retry_secs),
            }
        };

        let timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECONDS",
            var("REQUEST_TIMEOUT_SECONDS"),
            DEFAULT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            todos_path: var("TODOS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TODOS_PATH)),
            secret: var("SECRET"),
            database,
            connect_policy,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid { key, value })
        }
        None => Ok(default),
    }
}
