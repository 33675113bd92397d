use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    AppState,
    billing::{RateTable, rate_sync::sync_once},
    db::{
        models::{
            api::ApiResponse,
            exchange_rate::{ConversionResult, ConvertQuery},
        },
        repositories::exchange_rates::ExchangeRateRepo,
    },
    error::AppError,
    middleware::{auth::AuthUserInfo, rbac::Permission},
    utils::normalize_currency,
};

pub async fn get_rates(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    auth_info.require(Permission::ViewAll)?;
    let mut conn = state.db.get()?;
    let rates = ExchangeRateRepo::list_for_base(&mut conn, &state.config.exchange_rate_base_currency)?;
    Ok(Json(ApiResponse::success(rates, "Exchange rates retrieved successfully")))
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<ConvertQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth_info.require(Permission::ViewAll)?;
    let base = &state.config.exchange_rate_base_currency;
    let rows = {
        let mut conn = state.db.get()?;
        ExchangeRateRepo::list_for_base(&mut conn, base)?
    };
    let table = RateTable::from_rows(base, &rows);

    let from = normalize_currency(&query.from);
    let to = normalize_currency(&query.to);
    let converted = table.convert(query.amount, &from, &to)?;
    Ok(Json(ApiResponse::success(
        ConversionResult {
            amount: query.amount,
            from,
            to,
            converted,
        },
        "Amount converted",
    )))
}

/// Owners and admins only.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.require(Permission::ManageOrganization)?;
    tracing::info!(user_id = %ctx.user_id, "Manual exchange rate sync requested");
    let result = sync_once(&state.db, state.rate_provider.as_ref(), &state.config.exchange_rate_base_currency).await?;
    Ok(Json(ApiResponse::success(result, "Exchange rates synchronized")))
}
