use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    middleware::auth::CurrentProfile,
    models::profile::{NewProfile, RoleKind},
    services::{profiles::ProfileService, schedule::ScheduleService},
    AppState,
};

use super::{api_error, created, to_json, ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ProfileListQuery {
    pub role: Option<String>,
}

pub async fn me(CurrentProfile(me): CurrentProfile) -> ApiResult {
    to_json(me)
}

pub async fn list_profiles(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Query(query): Query<ProfileListQuery>,
) -> ApiResult {
    let role = query
        .role
        .as_deref()
        .map(str::parse::<RoleKind>)
        .transpose()
        .map_err(api_error)?;
    let profiles = ProfileService::list(&state.db, &me, role)
        .await
        .map_err(api_error)?;
    to_json(profiles)
}

pub async fn create_profile(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Json(body): Json<NewProfile>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let profile = ProfileService::create(&state.db, &me, &body)
        .await
        .map_err(api_error)?;
    created(to_json(profile))
}

pub async fn promotion_roster(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(promotion): Path<String>,
) -> ApiResult {
    let students = ProfileService::roster(&state.db, &me, &promotion)
        .await
        .map_err(api_error)?;
    to_json(students)
}

pub async fn promotion_schedule(
    State(state): State<AppState>,
    CurrentProfile(me): CurrentProfile,
    Path(promotion): Path<String>,
) -> ApiResult {
    let items = ScheduleService::for_promotion(&state.db, &me, &promotion)
        .await
        .map_err(api_error)?;
    to_json(items)
}
