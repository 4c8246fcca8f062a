//! Stats endpoint, guarded by the shared secret

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{StatsParams, StatsResponse};

/// GET /stats?secret=S - number of todos
async fn stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    authorize(state.secret.as_deref(), params.secret.as_deref())?;

    Ok(Json(StatsResponse {
        count: state.todos.count().await,
    }))
}

/// An unset configured secret rejects everything.
fn authorize(configured: Option<&str>, given: Option<&str>) -> Result<(), ApiError> {
    match (configured, given) {
        (Some(expected), Some(given)) if !given.is_empty() && expected == given => Ok(()),
        _ => {
            tracing::debug!("Rejected /stats request with invalid secret");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Stats routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(stats))
}
