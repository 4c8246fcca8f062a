//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS
//! - Tracing and timeout middleware
//! - Background database connection supervisor
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::ServerConfig;
use crate::store::{CounterStore, TodoStore};

/// Shared application state
pub struct AppState {
    pub todos: TodoStore,
    pub counter: Arc<CounterStore>,
    /// Shared secret for `/stats`; `None` rejects every request
    pub secret: Option<String>,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::todos::router())
        .merge(routes::stats::router())
        .merge(routes::counter::router())
        .layer(middleware)
        .with_state(Arc::new(state))
}

/// Run the HTTP server.
///
/// The counter connection is established in the background; the server
/// accepts requests immediately and `/increment` answers 503 until the
/// database is reachable.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let options = config.database.connect_options()?;
    let counter = Arc::new(CounterStore::new(options));
    let supervisor = counter.spawn_supervisor(config.connect_policy);

    let todos = TodoStore::new(config.todos_path.clone());
    tracing::info!(todos = %todos.path().display(), "Todo document configured");
    if config.secret.is_none() {
        tracing::warn!("SECRET is not set, /stats will reject every request");
    }

    let state = AppState {
        todos,
        counter: Arc::clone(&counter),
        secret: config.secret.clone(),
    };
    let app = build_router(state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.abort();
    counter.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid database configuration: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgConnectOptions;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(temp: &TempDir) -> Router {
        let state = AppState {
            todos: TodoStore::new(temp.path().join("todos.json")),
            counter: Arc::new(CounterStore::new(PgConnectOptions::new())),
            secret: Some("s3cret".into()),
        };
        build_router(state, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let temp = TempDir::new().unwrap();
        let response = test_router(&temp)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let temp = TempDir::new().unwrap();
        let response = test_router(&temp)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
