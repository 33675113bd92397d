use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::exchange_rates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExchangeRate {
    pub base_currency: String,
    pub quote_currency: String,
    pub rate: f64,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ConvertQuery {
    pub amount: rust_decimal::Decimal,
    pub from: String,
    pub to: String,
}

#[derive(Serialize)]
pub struct ConversionResult {
    pub amount: rust_decimal::Decimal,
    pub from: String,
    pub to: String,
    pub converted: rust_decimal::Decimal,
}

#[derive(Serialize)]
pub struct SyncResult {
    pub base_currency: String,
    pub updated: usize,
    pub fetched_at: DateTime<Utc>,
}
