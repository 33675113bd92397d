use crate::error::AppError;

pub fn validate_risk_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation_field("Risk title is required", "title", "REQUIRED"));
    }
    if title.len() > 512 {
        return Err(AppError::validation_field(
            "Risk title is too long (max 512 characters)",
            "title",
            "INVALID_LENGTH",
        ));
    }
    Ok(())
}

/// Probability and impact are both rated on a 1-5 scale.
pub fn validate_rating(field: &str, value: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&value) {
        return Err(AppError::validation_field(
            format!("{} must be between 1 and 5", field),
            field,
            "OUT_OF_RANGE",
        ));
    }
    Ok(())
}
