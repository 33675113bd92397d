use crate::error::AppError;

pub fn validate_resource_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation_field("Resource name is required", "name", "REQUIRED"));
    }
    Ok(())
}

pub fn validate_capacity_hours(hours: f64) -> Result<(), AppError> {
    if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
        return Err(AppError::validation_field(
            "Daily capacity must be greater than 0 and at most 24 hours",
            "capacity_hours",
            "OUT_OF_RANGE",
        ));
    }
    Ok(())
}

pub fn validate_hourly_rate(rate_cents: i64) -> Result<(), AppError> {
    if rate_cents < 0 {
        return Err(AppError::validation_field(
            "Hourly rate cannot be negative",
            "hourly_rate_cents",
            "INVALID_AMOUNT",
        ));
    }
    Ok(())
}

pub fn validate_allocation_percent(percent: i32) -> Result<(), AppError> {
    if !(1..=100).contains(&percent) {
        return Err(AppError::validation_field(
            "Allocation must be between 1 and 100 percent",
            "allocation_percent",
            "OUT_OF_RANGE",
        ));
    }
    Ok(())
}
