use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use super::invalidate_dashboard;
use crate::{
    AppState,
    db::models::{api::ApiResponse, import_export::ImportBundleRequest},
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::ImportExportService,
};

fn csv_attachment(file_name: String, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        body,
    )
}

pub async fn export_tasks(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let csv = ImportExportService::export_tasks_csv(&mut conn, &ctx, project_id)?;
    Ok(csv_attachment(format!("tasks-{}.csv", project_id), csv))
}

/// Body is the CSV document itself.
pub async fn import_tasks(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let result = {
        let mut conn = state.db.get()?;
        ImportExportService::import_tasks_csv(&mut conn, &ctx, project_id, &body)?
    };
    tracing::info!(project_id = %project_id, imported = result.imported, "Tasks imported");
    invalidate_dashboard(&state, project_id).await;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(result, "Tasks imported successfully"))))
}

pub async fn export_risks(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let csv = ImportExportService::export_risks_csv(&mut conn, &ctx, project_id)?;
    Ok(csv_attachment(format!("risks-{}.csv", project_id), csv))
}

pub async fn export_bundle(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let bundle = ImportExportService::export_bundle(&mut conn, &ctx, project_id)?;
    Ok(Json(ApiResponse::success(bundle, "Project exported successfully")))
}

pub async fn import_bundle(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Json(payload): Json<ImportBundleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let result = ImportExportService::import_bundle(&mut conn, &ctx, &payload)?;
    tracing::info!(project_id = %result.project.id, tasks = result.tasks, "Project bundle imported");
    Ok((StatusCode::CREATED, Json(ApiResponse::created(result, "Project imported successfully"))))
}
