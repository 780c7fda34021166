//! Integer id path segment extractor
//!
//! Wraps `axum::extract::Path<i64>` so a non-integer or out-of-range id is
//! answered with the API's JSON 400 rather than axum's plain-text rejection.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use swole_types::message;

pub struct PathId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(PathId(id)),
            Err(rejection) => {
                tracing::debug!("Rejected path id: {}", rejection.body_text());
                Err(ApiError::BadRequest(message::INVALID_ID.to_string()))
            }
        }
    }
}
