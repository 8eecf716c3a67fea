use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    middleware::auth::CurrentProfile,
    models::request::{AdvanceRequestBody, RequestListQuery, SubmitRequestBody},
    services::requests::RequestService,
    AppState,
};

use super::{api_error, created, to_json, ApiError, ApiResult};

pub async fn submit_request(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Json(body): Json<SubmitRequestBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request =
        RequestService::submit(&state.db, &me, &body.kind, &body.subject, &body.description)
            .await
            .map_err(api_error)?;
    created(to_json(request))
}

/// GET /requests: admin queue, optionally filtered by `?status=`.
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Query(query): Query<RequestListQuery>,
) -> ApiResult {
    let requests = RequestService::list_all(&state.db, &me, query.status.as_deref())
        .await
        .map_err(api_error)?;
    to_json(requests)
}

pub async fn get_request(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(id): Path<Uuid>,
) -> ApiResult {
    let request = RequestService::get(&state.db, &me, id)
        .await
        .map_err(api_error)?;
    to_json(request)
}

pub async fn advance_request(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(id): Path<Uuid>,
    Json(body): Json<AdvanceRequestBody>,
) -> ApiResult {
    let request =
        RequestService::advance(&state.db, &me, id, &body.status, body.response.as_deref())
            .await
            .map_err(api_error)?;
    to_json(request)
}
