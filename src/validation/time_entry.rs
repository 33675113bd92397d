use chrono::{NaiveDate, Utc};

use crate::error::AppError;

pub const MAX_DAILY_HOURS: f64 = 24.0;

/// Hours must be positive, at most a day, and on a quarter-hour boundary.
pub fn validate_hours(hours: f64) -> Result<(), AppError> {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_DAILY_HOURS {
        return Err(AppError::validation_field(
            "Hours must be greater than 0 and at most 24",
            "hours",
            "OUT_OF_RANGE",
        ));
    }
    let quarters = hours * 4.0;
    if (quarters - quarters.round()).abs() > 1e-9 {
        return Err(AppError::validation_field(
            "Hours must be recorded in quarter-hour increments",
            "hours",
            "INVALID_INCREMENT",
        ));
    }
    Ok(())
}

pub fn validate_work_date(date: NaiveDate) -> Result<(), AppError> {
    if date > Utc::now().date_naive() {
        return Err(AppError::validation_field(
            "Time cannot be logged for a future date",
            "work_date",
            "FUTURE_DATE",
        ));
    }
    Ok(())
}

/// Checks that adding `hours` to what is already logged stays within a day.
pub fn validate_daily_total(already_logged: f64, hours: f64) -> Result<(), AppError> {
    if already_logged + hours > MAX_DAILY_HOURS + 1e-9 {
        return Err(AppError::conflict_with_code(
            format!(
                "Daily total would be {:.2} hours; at most 24 hours can be logged per day",
                already_logged + hours
            ),
            Some("hours".to_string()),
            crate::db::models::api::error_codes::DAILY_HOURS_EXCEEDED,
        ));
    }
    Ok(())
}
