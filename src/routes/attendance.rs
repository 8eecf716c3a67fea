use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::auth::CurrentProfile,
    models::attendance::{
        AnnotateRequest, JustifyRequest, MarkAllRequest, MarkRequest, OpenAttendanceRequest,
    },
    services::attendance::AttendanceService,
    AppState,
};

use super::{api_error, created, to_json, ApiError, ApiResult};

/// POST /attendance: open the record of one occurrence.
pub async fn open_record(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Json(body): Json<OpenAttendanceRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let record = AttendanceService::open(&state.db, &me, body.occurrence_id)
        .await
        .map_err(api_error)?;
    created(to_json(record))
}

pub async fn get_record(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let record = AttendanceService::get(&state.db, &me, id)
        .await
        .map_err(api_error)?;
    to_json(record)
}

/// GET /occurrences/{id}/attendance: `null` until the record is opened.
pub async fn record_for_occurrence(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(occurrence_id): Path<Uuid>,
) -> ApiResult {
    let record = AttendanceService::for_occurrence(&state.db, &me, occurrence_id)
        .await
        .map_err(api_error)?;
    to_json(record)
}

pub async fn mark_student(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<MarkRequest>,
) -> ApiResult {
    let record = AttendanceService::mark(
        &state.db,
        &me,
        id,
        student_id,
        body.is_present,
        body.is_late,
        body.notes,
    )
    .await
    .map_err(api_error)?;
    to_json(record)
}

pub async fn mark_all(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(id): Path<Uuid>,
    Json(body): Json<MarkAllRequest>,
) -> ApiResult {
    let record = AttendanceService::mark_all(&state.db, &me, id, body.is_present)
        .await
        .map_err(api_error)?;
    to_json(record)
}

pub async fn annotate(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<AnnotateRequest>,
) -> ApiResult {
    let record = AttendanceService::annotate(&state.db, &me, id, student_id, body.notes)
        .await
        .map_err(api_error)?;
    to_json(record)
}

/// PUT /attendance/{id}/entries/{student_id}/justification: excuse a recorded absence.
pub async fn justify_absence(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<JustifyRequest>,
) -> ApiResult {
    let justification = AttendanceService::justify(&state.db, &me, id, student_id, &body.reason)
        .await
        .map_err(api_error)?;
    to_json(justification)
}

/// POST /attendance/{id}/submit: freeze the record and return its summary.
pub async fn submit_record(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let summary = AttendanceService::submit(&state.db, &me, id)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({ "record_id": id, "summary": summary })))
}
