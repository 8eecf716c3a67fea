use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{
    middleware::auth::CurrentProfile, models::grade::RecordGradeRequest,
    services::grades::GradeService, AppState,
};

use super::{api_error, created, to_json, ApiError};

pub async fn record_grade(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Json(body): Json<RecordGradeRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let grade = GradeService::record(
        &state.db,
        &me,
        body.student_id,
        body.course_id,
        body.value,
        &body.grade_type,
        body.date_obtained,
    )
    .await
    .map_err(api_error)?;
    created(to_json(grade))
}
