//! Liveness endpoint

use axum::{routing::get, Router};

/// GET /healthz
///
/// Touches neither store.
async fn healthz() -> &'static str {
    "OK"
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/healthz", get(healthz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_returns_ok() {
        assert_eq!(healthz().await, "OK");
    }
}
