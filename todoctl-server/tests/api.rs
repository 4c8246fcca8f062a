use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgConnectOptions;
use tempfile::TempDir;
use todoctl_server::{build_router, AppState, CounterStore, TodoStore};
use tower::ServiceExt;

const SECRET: &str = "s3cret";

struct TestApp {
    _temp: TempDir,
    store: TodoStore,
    router: Router,
}

impl TestApp {
    /// Router over a document seeded with two notes and an unconnected counter.
    async fn seeded() -> Self {
        let temp = TempDir::new().unwrap();
        let store = TodoStore::new(temp.path().join("data").join("todos.json"));
        store.create("First note".into()).await.unwrap();
        store.create("Second note".into()).await.unwrap();

        let state = AppState {
            todos: store.clone(),
            counter: Arc::new(CounterStore::new(PgConnectOptions::new())),
            secret: Some(SECRET.into()),
        };

        Self {
            _temp: temp,
            store,
            router: build_router(state, Duration::from_secs(30)),
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

#[tokio::test]
async fn healthz_is_plain_ok() {
    let app = TestApp::seeded().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn lists_all_todos() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("GET", "/todos", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 1, "content": "First note"},
            {"id": 2, "content": "Second note"},
        ])
    );
}

#[tokio::test]
async fn fetches_one_todo() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("GET", "/todos/2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 2, "content": "Second note"}));
}

#[tokio::test]
async fn crud_flow() {
    let app = TestApp::seeded().await;

    let (status, body) = app
        .send("POST", "/todos", Some(json!({"content": "Hello world"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 3, "content": "Hello world"}));

    let (status, body) = app
        .send("PUT", "/todos/3", Some(json!({"content": "Hello universe"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 3, "content": "Hello universe"}));
    assert_eq!(app.store.get(3).await.unwrap().content, "Hello universe");

    let (status, body) = app.send("DELETE", "/todos/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"deleted": true}));

    let (status, _) = app.send("GET", "/todos/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.count().await, 2);
}

#[tokio::test]
async fn missing_todo_is_not_found() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("GET", "/todos/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = app
        .send("PUT", "/todos/99", Some(json!({"content": "x"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", "/todos/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("GET", "/todos/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn content_is_coerced_or_rejected() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("POST", "/todos", Some(json!({"content": 42}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 3, "content": "42"}));

    let (status, body) = app.send("POST", "/todos", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(app.store.count().await, 3);
}

#[tokio::test]
async fn stats_requires_secret() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("GET", "/stats?secret=wrong", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("count").is_none());

    let (status, _) = app.send("GET", "/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("GET", "/stats?secret=s3cret", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2}));
}

#[tokio::test]
async fn increment_without_database_is_unavailable() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send("POST", "/increment", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "unavailable");
}
