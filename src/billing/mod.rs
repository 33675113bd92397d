pub mod exchange;
pub mod pricing;
pub mod rate_sync;

pub use exchange::RateTable;
pub use pricing::{BillingPeriod, PriceTier, PricingMode, PricingPlan, Quote};
pub use rate_sync::{HttpRateProvider, RateProvider, RateSyncScheduler};

use thiserror::Error;

use crate::{db::models::api::error_codes, error::AppError};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BillingError {
    #[error("seat count must be at least 1")]
    NoSeats,
    #[error("pricing tiers are invalid: {0}")]
    InvalidTiers(String),
    #[error("no exchange rate available for {from} -> {to}")]
    RateUnavailable { from: String, to: String },
    #[error("exchange rate provider failed: {0}")]
    Provider(String),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NoSeats => {
                AppError::validation_field(err.to_string(), "seats", "OUT_OF_RANGE")
            }
            BillingError::InvalidTiers(_) => AppError::Config(err.to_string()),
            BillingError::RateUnavailable { .. } => AppError::validation_field(
                err.to_string(),
                "currency",
                error_codes::RATE_UNAVAILABLE,
            ),
            BillingError::Provider(message) => AppError::External(message),
        }
    }
}
