//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;

use super::error::ApiError;
use crate::models::ContentRequest;

/// Extract an integer todo id from the path
pub struct TodoId(pub i64);

impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest {
                message: e.body_text(),
            })?;

        let id = raw.trim().parse::<i64>().map_err(|_| ApiError::BadRequest {
            message: format!("invalid todo id '{}'", raw),
        })?;

        Ok(Self(id))
    }
}

/// Extract and coerce the `content` field of a JSON body
pub struct Content(pub String);

impl<S> FromRequest<S> for Content
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body): Json<ContentRequest> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest {
                message: e.body_text(),
            })?;

        Ok(Self(body.into_content()?))
    }
}
