use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    billing::{BillingPeriod, PricingMode, RateTable, pricing::ConvertedTotal},
    db::{models::api::ApiResponse, repositories::exchange_rates::ExchangeRateRepo},
    error::AppError,
    middleware::{auth::AuthUserInfo, rbac::Permission},
    utils::normalize_currency,
};

#[derive(Deserialize)]
pub struct QuoteQuery {
    pub seats: u32,
    #[serde(default)]
    pub period: BillingPeriod,
    #[serde(default)]
    pub mode: PricingMode,
    /// Optional currency to convert the total into.
    pub currency: Option<String>,
}

pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(query): Query<QuoteQuery>,
) -> Result<impl IntoResponse, AppError> {
    auth_info.require(Permission::ViewBilling)?;
    let mut quote = state.pricing.quote(query.seats, query.mode, query.period)?;

    if let Some(target) = query.currency.as_deref().map(normalize_currency) {
        if target != quote.currency {
            let base = &state.config.exchange_rate_base_currency;
            let rows = {
                let mut conn = state.db.get()?;
                ExchangeRateRepo::list_for_base(&mut conn, base)?
            };
            let table = RateTable::from_rows(base, &rows);
            quote.converted = Some(ConvertedTotal {
                total: table.convert(quote.total, &quote.currency, &target)?,
                currency: target,
            });
        }
    }

    Ok(Json(ApiResponse::success(quote, "Quote calculated")))
}
