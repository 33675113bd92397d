use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState, db::models::api::ApiResponse, error::AppError, middleware::auth::AuthUserInfo,
    services::DashboardService,
};

pub async fn get_organization_dashboard(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let dashboard = DashboardService::organization(&mut conn, &ctx, Utc::now().date_naive())?;
    Ok(Json(ApiResponse::success(dashboard, "Dashboard retrieved successfully")))
}

pub async fn get_project_dashboard(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let dashboard = DashboardService::project_cached(&state, &ctx, project_id).await?;
    Ok(Json(ApiResponse::success(dashboard, "Dashboard retrieved successfully")))
}
