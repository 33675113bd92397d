use chrono::NaiveDate;

use crate::error::AppError;
use crate::validation::rules::validate_currency_code;

pub const MAX_PROJECT_CODE_LEN: usize = 16;

pub fn validate_project_code(code: &str) -> Result<(), AppError> {
    if code.trim().is_empty() {
        return Err(AppError::validation_field("Project code is required", "code", "REQUIRED"));
    }
    if code.len() > MAX_PROJECT_CODE_LEN {
        return Err(AppError::validation_field(
            "Project code must be 16 characters or less",
            "code",
            "INVALID_LENGTH",
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::validation_field(
            "Project code can only contain letters, numbers, hyphens, and underscores",
            "code",
            "INVALID_FORMAT",
        ));
    }
    Ok(())
}

pub fn validate_project_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation_field("Project name is required", "name", "REQUIRED"));
    }
    if name.len() > 255 {
        return Err(AppError::validation_field(
            "Project name is too long (max 255 characters)",
            "name",
            "INVALID_LENGTH",
        ));
    }
    Ok(())
}

pub fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::validation_field(
                "End date cannot be before start date",
                "end_date",
                "INVALID_DATE_RANGE",
            ));
        }
    }
    Ok(())
}

pub fn validate_budget(budget_cents: i64) -> Result<(), AppError> {
    if budget_cents < 0 {
        return Err(AppError::validation_field(
            "Budget cannot be negative",
            "budget_cents",
            "INVALID_AMOUNT",
        ));
    }
    Ok(())
}

pub fn validate_currency(code: &str) -> Result<(), AppError> {
    validate_currency_code(code).map_err(|_| {
        AppError::validation_field(
            "Currency must be a three-letter ISO-4217 code",
            "currency",
            "INVALID_CURRENCY",
        )
    })
}

pub fn validate_create_project(
    code: &str,
    name: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    budget_cents: i64,
    currency: &str,
) -> Result<(), AppError> {
    validate_project_code(code)?;
    validate_project_name(name)?;
    validate_date_range(start, end)?;
    validate_budget(budget_cents)?;
    validate_currency(currency)?;
    Ok(())
}
