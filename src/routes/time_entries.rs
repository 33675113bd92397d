use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use super::invalidate_dashboard;
use crate::{
    AppState,
    db::models::{
        api::{ApiResponse, ResponseMeta},
        time_entry::{
            CreateTimeEntryRequest, ReviewTimeEntryRequest, TimeEntryListQuery, TimesheetQuery, UpdateTimeEntryRequest,
        },
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::{TasksService, TimeEntriesService},
};

pub async fn get_time_entries(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<TimeEntryListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let entries = TimeEntriesService::list(&mut conn, &ctx, &query)?;
    let meta = ResponseMeta {
        total_count: Some(entries.len() as i64),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success_with_meta(entries, "Time entries retrieved successfully", meta)))
}

pub async fn create_time_entry(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Json(payload): Json<CreateTimeEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let entry = TimeEntriesService::create(&mut conn, &ctx, &payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(entry, "Time entry created successfully"))))
}

pub async fn update_time_entry(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<UpdateTimeEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let entry = TimeEntriesService::update(&mut conn, &ctx, entry_id, &payload)?;
    Ok(Json(ApiResponse::success(entry, "Time entry updated successfully")))
}

pub async fn delete_time_entry(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    TimeEntriesService::delete(&mut conn, &ctx, entry_id)?;
    Ok(Json(ApiResponse::<()>::ok("Time entry deleted successfully")))
}

pub async fn submit_time_entry(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(entry_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let entry = TimeEntriesService::submit(&mut conn, &ctx, entry_id)?;
    Ok(Json(ApiResponse::success(entry, "Time entry submitted")))
}

/// Approval changes the actual cost shown on the project dashboard.
pub async fn review_time_entry(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<ReviewTimeEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let (entry, project_id) = {
        let mut conn = state.db.get()?;
        let entry = TimeEntriesService::review(&mut conn, &ctx, entry_id, payload.approve)?;
        let project_id = TasksService::find(&mut conn, &ctx, entry.task_id)?.project_id;
        (entry, project_id)
    };
    invalidate_dashboard(&state, project_id).await;
    let message = if payload.approve { "Time entry approved" } else { "Time entry rejected" };
    Ok(Json(ApiResponse::success(entry, message)))
}

pub async fn get_timesheet(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<TimesheetQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let timesheet = TimeEntriesService::timesheet(&mut conn, &ctx, &query)?;
    Ok(Json(ApiResponse::success(timesheet, "Timesheet retrieved successfully")))
}
