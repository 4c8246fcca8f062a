//! todoctl-server: HTTP service over two stores
//!
//! - Todos: CRUD over a JSON document on disk
//! - Counter: a single Postgres row with atomic increment
//! - Stats: todo count behind a shared secret

pub mod config;
pub mod http;
pub mod models;
pub mod store;

pub use config::{ConfigError, ConnectPolicy, DatabaseConfig, ServerConfig};
pub use http::{build_router, run_server, ApiError, AppState, ServerError};
pub use models::Todo;
pub use store::{CounterError, CounterStore, StoreError, TodoStore};
