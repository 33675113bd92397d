use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    db::models::{
        api::ApiResponse,
        resource::{CreateAssignmentRequest, CreateResourceRequest, ResourceListQuery, UpdateResourceRequest, UtilizationQuery},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::ResourcesService,
};

pub async fn get_resources(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<ResourceListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let resources = ResourcesService::list(&mut conn, &ctx, &query)?;
    Ok(Json(ApiResponse::success(resources, "Resources retrieved successfully")))
}

pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Json(payload): Json<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let resource = ResourcesService::create(&mut conn, &ctx, &payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(resource, "Resource created successfully"))))
}

pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let resource = ResourcesService::get(&mut conn, &ctx, resource_id)?;
    Ok(Json(ApiResponse::success(resource, "Resource retrieved successfully")))
}

pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(resource_id): Path<Uuid>,
    Json(payload): Json<UpdateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let resource = ResourcesService::update(&mut conn, &ctx, resource_id, &payload)?;
    Ok(Json(ApiResponse::success(resource, "Resource updated successfully")))
}

pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    ResourcesService::delete(&mut conn, &ctx, resource_id)?;
    Ok(Json(ApiResponse::<()>::ok("Resource deleted successfully")))
}

pub async fn get_assignments(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let assignments = ResourcesService::list_assignments(&mut conn, &ctx, task_id)?;
    Ok(Json(ApiResponse::success(assignments, "Assignments retrieved successfully")))
}

pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let assignment = ResourcesService::assign(&mut conn, &ctx, task_id, &payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(assignment, "Resource assigned successfully"))))
}

pub async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((task_id, assignment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    ResourcesService::unassign(&mut conn, &ctx, task_id, assignment_id)?;
    Ok(Json(ApiResponse::<()>::ok("Assignment removed successfully")))
}

pub async fn get_utilization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<UtilizationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let utilization = ResourcesService::utilization(&mut conn, &ctx, &query)?;
    Ok(Json(ApiResponse::success(utilization, "Utilization computed")))
}

pub async fn get_resource_utilization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(resource_id): Path<Uuid>,
    Query(query): Query<UtilizationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let utilization = ResourcesService::utilization_for(&mut conn, &ctx, resource_id, &query)?;
    Ok(Json(ApiResponse::success(utilization, "Utilization computed")))
}
