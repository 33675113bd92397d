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
        issue::{CreateIssueRequest, IssueListQuery, IssueTransitionRequest, UpdateIssueRequest},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::IssuesService,
};

pub async fn get_issues(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Query(query): Query<IssueListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let issues = IssuesService::list(&mut conn, &ctx, project_id, &query)?;
    let meta = ResponseMeta {
        total_count: Some(issues.len() as i64),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success_with_meta(issues, "Issues retrieved successfully", meta)))
}

pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateIssueRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let issue = {
        let mut conn = state.db.get()?;
        IssuesService::create(&mut conn, &ctx, &state.notifier, project_id, &payload)?
    };
    invalidate_dashboard(&state, project_id).await;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(issue, "Issue created successfully"))))
}

pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let issue = IssuesService::get(&mut conn, &ctx, project_id, issue_id)?;
    Ok(Json(ApiResponse::success(issue, "Issue retrieved successfully")))
}

pub async fn update_issue(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateIssueRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let issue = {
        let mut conn = state.db.get()?;
        IssuesService::update(&mut conn, &ctx, &state.notifier, project_id, issue_id, &payload)?
    };
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::success(issue, "Issue updated successfully")))
}

pub async fn transition_issue(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<IssueTransitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let issue = {
        let mut conn = state.db.get()?;
        IssuesService::transition(&mut conn, &ctx, project_id, issue_id, &payload)?
    };
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::success(issue, "Issue status changed")))
}

pub async fn delete_issue(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, issue_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    {
        let mut conn = state.db.get()?;
        IssuesService::delete(&mut conn, &ctx, project_id, issue_id)?;
    }
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::<()>::ok("Issue deleted successfully")))
}
