use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState, cache,
    db::{
        models::{
            api::{ApiResponse, error_codes},
            auth::{
                LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest, SwitchOrganizationRequest,
                UpdateProfileRequest,
            },
        },
        repositories::users::UsersRepo,
    },
    error::AppError,
    middleware::auth::{AuthUserInfo, remaining_ttl},
    services::AccountService,
    validation::ValidatedJson,
};

pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let user = AccountService::register(&mut conn, &payload, state.config.bcrypt_cost)?;
    tracing::info!(user_id = %user.id, "User registered");
    let tokens = AccountService::issue_tokens(&state.auth_service, user)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(tokens, "User registered successfully")),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let user = AccountService::verify_credentials(&mut conn, &payload)?;
    let tokens = AccountService::issue_tokens(&state.auth_service, user)?;
    Ok(Json(ApiResponse::success(tokens, "Login successful")))
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = state.auth_service.verify_refresh_token(&payload.refresh_token)?;
    let prefix = &state.config.redis_channel_prefix;

    if cache::is_token_revoked(&state.redis, prefix, &claims.jti).await? {
        tracing::warn!(user_id = %claims.sub, code = error_codes::AUTH_TOKEN_REVOKED, "Revoked refresh token presented");
        return Err(AppError::auth("Refresh token has been revoked"));
    }
    cache::revoke_token(&state.redis, prefix, &claims.jti, remaining_ttl(claims.exp)).await?;

    let user = {
        let mut conn = state.db.get()?;
        UsersRepo::find_by_id(&mut conn, claims.sub)?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::auth("User not found or inactive"))?
    };
    let tokens = AccountService::issue_tokens(&state.auth_service, user)?;
    Ok(Json(ApiResponse::success(tokens, "Token refreshed")))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    payload: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let prefix = &state.config.redis_channel_prefix;
    cache::revoke_token(&state.redis, prefix, &auth_info.jti, remaining_ttl(auth_info.exp)).await?;

    if let Some(refresh_token) = payload.and_then(|Json(body)| body.refresh_token) {
        let claims = state.auth_service.verify_refresh_token(&refresh_token)?;
        if claims.sub != auth_info.user.id {
            return Err(AppError::forbidden("Refresh token belongs to another user"));
        }
        cache::revoke_token(&state.redis, prefix, &claims.jti, remaining_ttl(claims.exp)).await?;
    }

    tracing::info!(user_id = %auth_info.user.id, "User logged out");
    Ok(Json(ApiResponse::<()>::ok("Logged out")))
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let profile = AccountService::profile(&mut conn, auth_info.user.id)?;
    Ok(Json(ApiResponse::success(profile, "Profile retrieved successfully")))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let profile = AccountService::update_profile(&mut conn, auth_info.user.id, &payload)?;
    Ok(Json(ApiResponse::success(profile, "Profile updated successfully")))
}

pub async fn switch_organization(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Json(payload): Json<SwitchOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let profile = AccountService::switch_organization(&mut conn, auth_info.user.id, payload.organization_id)?;
    Ok(Json(ApiResponse::success(profile, "Organization switched")))
}
