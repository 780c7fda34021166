//! Workout handlers

use crate::error::{ApiError, ApiResult};
use crate::extractors::{JsonBody, PathId};
use crate::AppState;
use axum::{extract::State, Json};
use swole_types::{message, Workout, WorkoutPatch, WorkoutRequest};
use tracing::{debug, info};

pub async fn add(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<WorkoutRequest>,
) -> ApiResult<Json<&'static str>> {
    let workout = req.validate()?;

    if !state.db.user_exists(workout.user_id).await? {
        return Err(ApiError::NotFound(message::USER_NOT_FOUND.into()));
    }

    let id = state.db.create_workout(&workout).await?;
    info!("Created workout {} for user {}", id, workout.user_id);

    Ok(Json(message::WORKOUT_CREATED))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Workout>>> {
    Ok(Json(state.db.list_workouts().await?))
}

pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(patch): JsonBody<WorkoutPatch>,
) -> ApiResult<Json<&'static str>> {
    if patch.is_empty() {
        debug!("Empty update for workout {}", id);
    }

    match state.db.update_workout(id, &patch).await? {
        Some(_) => Ok(Json(message::WORKOUT_UPDATED)),
        None => Err(ApiError::NotFound(message::WORKOUT_NOT_FOUND.into())),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<Json<&'static str>> {
    if !state.db.delete_workout(id).await? {
        return Err(ApiError::NotFound(message::WORKOUT_NOT_FOUND.into()));
    }

    info!("Deleted workout {}", id);
    Ok(Json(message::WORKOUT_DELETED))
}
