use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    middleware::auth::CurrentProfile,
    models::assignment::{GradeSubmissionRequest, SubmitAssignmentRequest},
    services::submissions::SubmissionService,
    AppState,
};

use super::{api_error, created, to_json, ApiError, ApiResult};

pub async fn submit_work(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(assignment_id): Path<Uuid>,
    Json(body): Json<SubmitAssignmentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let submission =
        SubmissionService::submit(&state.db, &me, assignment_id, body.files, body.comments)
            .await
            .map_err(api_error)?;
    created(to_json(submission))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult {
    let submissions = SubmissionService::list_for_assignment(&state.db, &me, assignment_id)
        .await
        .map_err(api_error)?;
    to_json(submissions)
}

pub async fn grade_submission(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(submission_id): Path<Uuid>,
    Json(body): Json<GradeSubmissionRequest>,
) -> ApiResult {
    let submission =
        SubmissionService::grade(&state.db, &me, submission_id, body.grade, body.feedback)
            .await
            .map_err(api_error)?;
    to_json(submission)
}
