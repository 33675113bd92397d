use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    db::models::{
        api::{ApiResponse, ResponseMeta},
        organization::{AddMemberRequest, CreateOrganizationRequest, UpdateMemberRoleRequest, UpdateOrganizationRequest},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::{MembersService, OrganizationsService},
    validation::ValidatedJson,
};

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let organization = OrganizationsService::create(&mut conn, auth_info.user.id, &payload)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(organization, "Organization created successfully")),
    ))
}

pub async fn get_current_organization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let organization = OrganizationsService::current(&mut conn, &ctx)?;
    Ok(Json(ApiResponse::success(organization, "Organization retrieved successfully")))
}

pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let organization = OrganizationsService::update(&mut conn, &ctx, &payload)?;
    Ok(Json(ApiResponse::success(organization, "Organization updated successfully")))
}

pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    OrganizationsService::delete(&mut conn, &ctx)?;
    tracing::info!(organization_id = %ctx.organization_id, user_id = %ctx.user_id, "Organization deleted");
    Ok(Json(ApiResponse::<()>::ok("Organization deleted successfully")))
}

pub async fn get_members(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let members = MembersService::list(&mut conn, &ctx)?;
    let meta = ResponseMeta {
        total_count: Some(members.len() as i64),
        ..Default::default()
    };
    Ok(Json(ApiResponse::success_with_meta(members, "Members retrieved successfully", meta)))
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let member = MembersService::add(&mut conn, &ctx, &payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(member, "Member added successfully"))))
}

pub async fn update_member_role(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateMemberRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let member = MembersService::change_role(&mut conn, &ctx, user_id, payload.role)?;
    Ok(Json(ApiResponse::success(member, "Member role updated successfully")))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    MembersService::remove(&mut conn, &ctx, user_id)?;
    Ok(Json(ApiResponse::<()>::ok("Member removed successfully")))
}
