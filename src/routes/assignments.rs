use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    middleware::auth::CurrentProfile,
    models::assignment::NewAssignment,
    services::assignments::AssignmentService,
    AppState,
};

use super::{api_error, created, to_json, ApiError, ApiResult};

pub async fn create_assignment(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Json(body): Json<NewAssignment>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let assignment = AssignmentService::create(&state.db, &me, &body)
        .await
        .map_err(api_error)?;
    created(to_json(assignment))
}

pub async fn promotion_assignments(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(promotion): Path<String>,
) -> ApiResult {
    let assignments = AssignmentService::for_promotion(&state.db, &me, &promotion)
        .await
        .map_err(api_error)?;
    to_json(assignments)
}

pub async fn teacher_assignments(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(teacher_id): Path<Uuid>,
) -> ApiResult {
    let assignments = AssignmentService::for_teacher(&state.db, &me, teacher_id)
        .await
        .map_err(api_error)?;
    to_json(assignments)
}
