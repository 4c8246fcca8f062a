//! Todo endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::{Content, TodoId};
use crate::http::server::AppState;
use crate::models::{DeletedResponse, Todo};

/// GET /todos - list all todos in document order
async fn list_todos(State(state): State<Arc<AppState>>) -> Json<Vec<Todo>> {
    Json(state.todos.get_all().await)
}

/// GET /todos/{id}
async fn get_todo(
    State(state): State<Arc<AppState>>,
    TodoId(id): TodoId,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.get(id).await?))
}

/// POST /todos - create with the next free id
async fn create_todo(
    State(state): State<Arc<AppState>>,
    Content(content): Content,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.create(content).await?))
}

/// PUT /todos/{id} - replace content
async fn update_todo(
    State(state): State<Arc<AppState>>,
    TodoId(id): TodoId,
    Content(content): Content,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.todos.update(id, content).await?))
}

/// DELETE /todos/{id}
async fn delete_todo(
    State(state): State<Arc<AppState>>,
    TodoId(id): TodoId,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = state.todos.delete(id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// Todo routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}
