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
        api::ApiResponse,
        risk::{CreateRiskRequest, RiskListQuery, UpdateRiskRequest},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::RisksService,
};

pub async fn get_risks(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Query(query): Query<RiskListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let risks = RisksService::list(&mut conn, &ctx, project_id, &query)?;
    Ok(Json(ApiResponse::success(risks, "Risks retrieved successfully")))
}

pub async fn get_risk_matrix(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let matrix = RisksService::matrix(&mut conn, &ctx, project_id)?;
    Ok(Json(ApiResponse::success(matrix, "Risk matrix computed")))
}

pub async fn create_risk(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateRiskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let risk = {
        let mut conn = state.db.get()?;
        RisksService::create(&mut conn, &ctx, &state.notifier, project_id, &payload)?
    };
    invalidate_dashboard(&state, project_id).await;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(risk, "Risk created successfully"))))
}

pub async fn get_risk(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, risk_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let risk = RisksService::get(&mut conn, &ctx, project_id, risk_id)?;
    Ok(Json(ApiResponse::success(risk, "Risk retrieved successfully")))
}

pub async fn update_risk(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, risk_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateRiskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let risk = {
        let mut conn = state.db.get()?;
        RisksService::update(&mut conn, &ctx, &state.notifier, project_id, risk_id, &payload)?
    };
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::success(risk, "Risk updated successfully")))
}

pub async fn delete_risk(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, risk_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    {
        let mut conn = state.db.get()?;
        RisksService::delete(&mut conn, &ctx, project_id, risk_id)?;
    }
    invalidate_dashboard(&state, project_id).await;
    Ok(Json(ApiResponse::<()>::ok("Risk deleted successfully")))
}
