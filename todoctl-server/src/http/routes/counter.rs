//! Counter endpoint

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::CounterResponse;

/// POST /increment - atomically bump the counter
async fn increment(State(state): State<Arc<AppState>>) -> Result<Json<CounterResponse>, ApiError> {
    let value = state.counter.increment().await?;
    Ok(Json(CounterResponse { value }))
}

/// Counter routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/increment", post(increment))
}
