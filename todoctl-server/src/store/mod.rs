//! Persistence layer
//!
//! Two stores with different consistency disciplines:
//! - `todos`: whole-document JSON file, reloaded and rewritten on every call
//! - `counter`: single Postgres row, incremented by one atomic statement

pub mod counter;
pub mod migrations;
pub mod todos;

pub use counter::{ConnectionState, ConnectionStatus, CounterError, CounterStore};
pub use todos::{StoreError, TodoStore};
