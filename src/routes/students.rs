use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    middleware::auth::CurrentProfile,
    services::{
        attendance::AttendanceService, certifications::CertificationService,
        grades::GradeService, requests::RequestService,
    },
    AppState,
};

use super::{api_error, to_json, ApiResult};

pub async fn grade_report(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(student_id): Path<Uuid>,
) -> ApiResult {
    let report = GradeService::report(&state.db, &me, student_id)
        .await
        .map_err(api_error)?;
    to_json(report)
}

pub async fn absences(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(student_id): Path<Uuid>,
) -> ApiResult {
    let absences = AttendanceService::student_absences(&state.db, &me, student_id)
        .await
        .map_err(api_error)?;
    to_json(absences)
}

pub async fn requests(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(student_id): Path<Uuid>,
) -> ApiResult {
    let requests = RequestService::list_for_student(&state.db, &me, student_id)
        .await
        .map_err(api_error)?;
    to_json(requests)
}

pub async fn enrollments(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(student_id): Path<Uuid>,
) -> ApiResult {
    let enrollments = CertificationService::enrollments_for_student(&state.db, &me, student_id)
        .await
        .map_err(api_error)?;
    to_json(enrollments)
}
