use crate::error::AppError;

pub fn validate_task_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation_field("Task name is required", "name", "REQUIRED"));
    }
    if name.len() > 512 {
        return Err(AppError::validation_field(
            "Task name is too long (max 512 characters)",
            "name",
            "INVALID_LENGTH",
        ));
    }
    Ok(())
}

/// WBS codes are dot-separated numeric or alphanumeric segments, e.g. `1.2.3`.
pub fn validate_wbs_code(code: &str) -> Result<(), AppError> {
    let valid = !code.is_empty()
        && code.len() <= 50
        && code
            .split('.')
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric()));
    if !valid {
        return Err(AppError::validation_field(
            "WBS code must be dot-separated alphanumeric segments",
            "wbs_code",
            "INVALID_FORMAT",
        ));
    }
    Ok(())
}

pub fn validate_progress(progress: i32) -> Result<(), AppError> {
    if !(0..=100).contains(&progress) {
        return Err(AppError::validation_field(
            "Progress must be between 0 and 100",
            "progress",
            "OUT_OF_RANGE",
        ));
    }
    Ok(())
}

pub fn validate_estimated_hours(hours: Option<f64>) -> Result<(), AppError> {
    if let Some(hours) = hours {
        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::validation_field(
                "Estimated hours must be a non-negative number",
                "estimated_hours",
                "OUT_OF_RANGE",
            ));
        }
    }
    Ok(())
}

pub fn validate_lag_days(lag: i32) -> Result<(), AppError> {
    if lag.abs() > 3650 {
        return Err(AppError::validation_field(
            "Lag must be within ten years",
            "lag_days",
            "OUT_OF_RANGE",
        ));
    }
    Ok(())
}
