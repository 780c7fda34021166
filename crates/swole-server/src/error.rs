//! HTTP error type
//!
//! Bodies are the same JSON-encoded message strings the success paths use,
//! only the status code distinguishes the failure kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use swole_types::{message, MissingField};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MissingField> for ApiError {
    fn from(e: MissingField) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                message::INTERNAL_ERROR.to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
        };

        (status, Json(message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_keeps_message() {
        let (status, body) = body_of(ApiError::Conflict(message::USERNAME_TAKEN.into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, message::USERNAME_TAKEN);
    }

    #[tokio::test]
    async fn test_internal_hides_cause() {
        let (status, body) =
            body_of(ApiError::Internal(anyhow::anyhow!("disk on fire"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, message::INTERNAL_ERROR);
    }

    #[test]
    fn test_missing_field_is_bad_request() {
        let err: ApiError = MissingField("title").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Error: title is required");
    }
}
