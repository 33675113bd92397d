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
        project::{CreateProjectRequest, ProjectListQuery, UpdateProjectRequest},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::ProjectsService,
};

pub async fn get_projects(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let (list, pagination) = ProjectsService::list(&mut conn, &ctx, &query)?;
    let meta = ResponseMeta {
        total_count: Some(list.total_count),
        pagination: Some(pagination),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success_with_meta(list, "Projects retrieved successfully", meta)))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let project = ProjectsService::create(&mut conn, &ctx, &payload)?;
    tracing::info!(project_id = %project.id, code = %project.code, "Project created");
    Ok((StatusCode::CREATED, Json(ApiResponse::created(project, "Project created successfully"))))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let project = ProjectsService::get(&mut conn, &ctx, project_id)?;
    Ok(Json(ApiResponse::success(project, "Project retrieved successfully")))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let project = {
        let mut conn = state.db.get()?;
        ProjectsService::update(&mut conn, &ctx, project_id, &payload)?
    };
    invalidate_dashboard(&state, project.id).await;
    Ok(Json(ApiResponse::success(project, "Project updated successfully")))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    {
        let mut conn = state.db.get()?;
        ProjectsService::delete(&mut conn, &ctx, project_id)?;
    }
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::<()>::ok("Project deleted successfully")))
}
