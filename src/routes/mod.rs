pub mod assignments;
pub mod attendance;
pub mod certifications;
pub mod grades;
pub mod health;
pub mod metrics;
pub mod profiles;
pub mod requests;
pub mod students;
pub mod submissions;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::{error::EngineError, services::metrics::record_failure};

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult = Result<Json<Value>, ApiError>;

/// Render an engine failure as `{error, code, retryable}` with a matching status.
pub fn api_error(err: EngineError) -> ApiError {
    record_failure(&err);
    let status = match &err {
        EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::InvalidTransition(_)
        | EngineError::AlreadySubmitted
        | EngineError::DuplicateSubmission
        | EngineError::AlreadyEnrolled => StatusCode::CONFLICT,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::CollaboratorUnavailable(_) => {
            warn!("collaborator unavailable: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let mut body = json!({
        "error": err.to_string(),
        "code": err.code(),
        "retryable": err.is_retryable(),
    });
    if let EngineError::Unauthorized(reason) = &err {
        body["reason"] = json!(reason.as_str());
    }
    (status, Json(body))
}

pub(crate) fn to_json<T: Serialize>(value: T) -> ApiResult {
    serde_json::to_value(value).map(Json).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

pub(crate) fn created(res: ApiResult) -> Result<(StatusCode, Json<Value>), ApiError> {
    res.map(|body| (StatusCode::CREATED, body))
}
