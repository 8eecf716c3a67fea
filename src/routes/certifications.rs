use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    middleware::auth::CurrentProfile, services::certifications::CertificationService, AppState,
};

use super::{api_error, created, to_json, ApiError, ApiResult};

/// The catalogue is visible to every signed-in profile.
pub async fn list_certifications(
    State(state): State<AppState>,
    CurrentProfile(_me): CurrentProfile,
) -> ApiResult {
    let certs = CertificationService::list_certifications(&state.db)
        .await
        .map_err(api_error)?;
    to_json(certs)
}

pub async fn enroll(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(certification_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let enrollment = CertificationService::enroll(&state.db, &me, certification_id)
        .await
        .map_err(api_error)?;
    created(to_json(enrollment))
}

/// POST /enrollments/{id}/lessons: one more lesson completed.
pub async fn complete_lesson(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(enrollment_id): Path<Uuid>,
) -> ApiResult {
    let enrollment = CertificationService::complete_lesson(&state.db, &me, enrollment_id)
        .await
        .map_err(api_error)?;
    to_json(enrollment)
}
