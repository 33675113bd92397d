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
        task::{CreateDependencyRequest, CreateTaskRequest, MoveTaskRequest, TaskListQuery, UpdateTaskRequest},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::TasksService,
};

pub async fn get_tasks(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let tasks = TasksService::list(&mut conn, &ctx, project_id, &query)?;
    let meta = ResponseMeta {
        total_count: Some(tasks.len() as i64),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success_with_meta(tasks, "Tasks retrieved successfully", meta)))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let task = {
        let mut conn = state.db.get()?;
        TasksService::create(&mut conn, &ctx, project_id, &payload)?
    };
    invalidate_dashboard(&state, task.project_id).await;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(task, "Task created successfully"))))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let task = TasksService::get(&mut conn, &ctx, task_id)?;
    Ok(Json(ApiResponse::success(task, "Task retrieved successfully")))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let task = {
        let mut conn = state.db.get()?;
        TasksService::update(&mut conn, &ctx, task_id, &payload)?
    };
    invalidate_dashboard(&state, task.project_id).await;
    Ok(Json(ApiResponse::success(task, "Task updated successfully")))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let project_id = {
        let mut conn = state.db.get()?;
        let task = TasksService::find(&mut conn, &ctx, task_id)?;
        TasksService::delete(&mut conn, &ctx, task.id)?;
        task.project_id
    };
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::<()>::ok("Task deleted successfully")))
}

pub async fn move_task(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<MoveTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let task = {
        let mut conn = state.db.get()?;
        TasksService::move_task(&mut conn, &ctx, task_id, &payload)?
    };
    invalidate_dashboard(&state, task.project_id).await;
    Ok(Json(ApiResponse::success(task, "Task moved successfully")))
}

pub async fn get_dependencies(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let dependencies = TasksService::list_dependencies(&mut conn, &ctx, project_id)?;
    Ok(Json(ApiResponse::success(dependencies, "Dependencies retrieved successfully")))
}

pub async fn create_dependency(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateDependencyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let dependency = {
        let mut conn = state.db.get()?;
        TasksService::add_dependency(&mut conn, &ctx, project_id, &payload)?
    };
    invalidate_dashboard(&state, project_id).await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(dependency, "Dependency created successfully")),
    ))
}

pub async fn delete_dependency(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, dependency_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    {
        let mut conn = state.db.get()?;
        TasksService::remove_dependency(&mut conn, &ctx, project_id, dependency_id)?;
    }
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::<()>::ok("Dependency deleted successfully")))
}

pub async fn get_gantt(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let chart = TasksService::gantt(&mut conn, &ctx, project_id)?;
    Ok(Json(ApiResponse::success(chart, "Gantt chart computed")))
}

pub async fn get_kanban(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let board = TasksService::kanban(&mut conn, &ctx, project_id)?;
    Ok(Json(ApiResponse::success(board, "Kanban board retrieved successfully")))
}
