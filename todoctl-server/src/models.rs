//! Request/response models for the todoctl HTTP API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A todo item as stored in the document and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub content: String,
}

/// Validation error for request bodies
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a string, number or boolean")]
    InvalidType { field: &'static str },
}

/// Body for POST /todos and PUT /todos/{id}
#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: Value,
}

impl ContentRequest {
    /// Coerce `content` to text.
    ///
    /// Strings pass through; numbers and booleans use their JSON text form.
    pub fn into_content(self) -> Result<String, ValidationError> {
        match self.content {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Err(ValidationError::Missing { field: "content" }),
            Value::Array(_) | Value::Object(_) => {
                Err(ValidationError::InvalidType { field: "content" })
            }
        }
    }
}

/// Response for DELETE /todos/{id}
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// Query for GET /stats
#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub secret: Option<String>,
}

/// Response for GET /stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub count: usize,
}

/// Response for POST /increment
#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub value: i64,
}
