//! Counter store - a single Postgres row incremented atomically
//!
//! The store owns one shared pool capped at a single connection. Its
//! lifecycle is explicit:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!                     |
//!                     v
//!                   Failed -> Connecting -> ...
//! ```
//!
//! Connection attempts never take the process down. Until a connection
//! succeeds, `increment` fails with `NotConnected`.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::migrations;
use crate::config::ConnectPolicy;

/// Default time allowed for one connection attempt.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Counter store error type
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("database connection does not exist")]
    NotConnected,

    #[error("counter row is missing")]
    MissingRow,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Observable lifecycle state of the counter connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Lifecycle state, owning the pool once connected
#[derive(Debug)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected(PgPool),
    Failed { reason: String },
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            Self::Disconnected => ConnectionStatus::Disconnected,
            Self::Connecting => ConnectionStatus::Connecting,
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Failed { .. } => ConnectionStatus::Failed,
        }
    }
}

/// Relational counter with a lazily established connection
pub struct CounterStore {
    options: PgConnectOptions,
    connect_timeout: Duration,
    state: RwLock<ConnectionState>,
}

impl CounterStore {
    /// Create a disconnected store. No I/O happens until `connect`.
    pub fn new(options: PgConnectOptions) -> Self {
        Self {
            options,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Current lifecycle state
    pub async fn status(&self) -> ConnectionStatus {
        self.state.read().await.status()
    }

    /// Reason for the last failed attempt, if the store is `Failed`.
    pub async fn failure_reason(&self) -> Option<String> {
        match &*self.state.read().await {
            ConnectionState::Failed { reason } => Some(reason.clone()),
            _ => None,
        }
    }

    /// Make one connection attempt and initialize the schema.
    ///
    /// When already connected, the existing pool keeps serving until the
    /// replacement is ready. A failed attempt leaves an existing
    /// connection in place.
    pub async fn connect(&self) -> Result<(), CounterError> {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, ConnectionState::Connected(_)) {
                *state = ConnectionState::Connecting;
            }
        }

        let result = self.establish().await;

        let mut state = self.state.write().await;
        match result {
            Ok(pool) => {
                let previous = std::mem::replace(&mut *state, ConnectionState::Connected(pool));
                drop(state);
                if let ConnectionState::Connected(old) = previous {
                    old.close().await;
                }
                tracing::info!("Database connection established");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "Database connection failed, the `/increment` endpoint will not work: {}",
                    e
                );
                if !matches!(*state, ConnectionState::Connected(_)) {
                    *state = ConnectionState::Failed {
                        reason: e.to_string(),
                    };
                }
                Err(CounterError::Database(e))
            }
        }
    }

    async fn establish(&self) -> Result<PgPool, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.connect_timeout)
            .connect_with(self.options.clone())
            .await?;

        if let Err(e) = migrations::run(&pool).await {
            pool.close().await;
            return Err(e);
        }
        Ok(pool)
    }

    /// Run connection attempts on a background task.
    ///
    /// With `ConnectPolicy::Retry` the task sleeps `delay` between failed
    /// attempts and exits after the first success. With
    /// `ConnectPolicy::Once` it exits after a single attempt.
    pub fn spawn_supervisor(self: &Arc<Self>, policy: ConnectPolicy) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if store.connect().await.is_ok() {
                    break;
                }
                match policy {
                    ConnectPolicy::Once => {
                        tracing::warn!("Database connection will not be retried");
                        break;
                    }
                    ConnectPolicy::Retry { delay } => {
                        tracing::info!("Retrying database connection in {}s", delay.as_secs());
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        })
    }

    /// Atomically add one to the counter and return the new value.
    pub async fn increment(&self) -> Result<i64, CounterError> {
        let pool = self.pool().await?;

        let value: Option<Option<i32>> =
            sqlx::query_scalar("UPDATE counter SET value = value + 1 RETURNING value")
                .fetch_optional(&pool)
                .await?;

        value
            .flatten()
            .map(i64::from)
            .ok_or(CounterError::MissingRow)
    }

    /// Clone of the shared pool, or `NotConnected`.
    pub async fn pool(&self) -> Result<PgPool, CounterError> {
        match &*self.state.read().await {
            ConnectionState::Connected(pool) => Ok(pool.clone()),
            _ => Err(CounterError::NotConnected),
        }
    }

    /// Close the pool and return to `Disconnected`.
    pub async fn close(&self) {
        let previous = std::mem::replace(
            &mut *self.state.write().await,
            ConnectionState::Disconnected,
        );
        if let ConnectionState::Connected(pool) = previous {
            pool.close().await;
        }
    }
}
