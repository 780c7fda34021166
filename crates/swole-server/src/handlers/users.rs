//! User handlers

use crate::error::{ApiError, ApiResult};
use crate::extractors::{JsonBody, PathId};
use crate::services::{Registration, Verification};
use crate::AppState;
use axum::{extract::State, Json};
use swole_types::{message, CredentialsRequest, User};
use tracing::info;

pub async fn add(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> ApiResult<Json<&'static str>> {
    let credentials = req.validate()?;

    match state
        .accounts
        .register(&credentials.username, &credentials.password)
        .await?
    {
        Registration::Created(_) => Ok(Json(message::USER_CREATED)),
        Registration::UsernameTaken => Err(ApiError::Conflict(message::USERNAME_TAKEN.into())),
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CredentialsRequest>,
) -> ApiResult<Json<&'static str>> {
    let credentials = req.validate()?;

    match state
        .accounts
        .authenticate(&credentials.username, &credentials.password)
        .await?
    {
        Verification::Verified => Ok(Json(message::USER_VERIFIED)),
        Verification::UnknownUser => Err(ApiError::NotFound(message::USER_NOT_VERIFIED.into())),
        Verification::WrongPassword => {
            Err(ApiError::Unauthorized(message::PASSWORD_NOT_VERIFIED.into()))
        }
    }
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.list_users().await?))
}

pub async fn get(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<Json<User>> {
    state
        .db
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(message::USER_NOT_FOUND.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<Json<&'static str>> {
    if !state.db.delete_user(id).await? {
        return Err(ApiError::NotFound(message::USER_NOT_FOUND.into()));
    }

    info!("Deleted user {} and their workouts", id);
    Ok(Json(message::USER_DELETED))
}
