use crate::error::AppError;

pub fn validate_issue_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation_field("Issue title is required", "title", "REQUIRED"));
    }

    if title.len() > 512 {
        return Err(AppError::validation_field(
            "Issue title is too long (max 512 characters)",
            "title",
            "INVALID_LENGTH",
        ));
    }

    Ok(())
}

pub fn validate_issue_description(description: Option<&str>) -> Result<(), AppError> {
    if let Some(desc) = description {
        if desc.len() > 10000 {
            return Err(AppError::validation_field(
                "Issue description is too long (max 10000 characters)",
                "description",
                "INVALID_LENGTH",
            ));
        }
    }
    Ok(())
}

pub fn validate_resolution(resolution: Option<&str>) -> Result<(), AppError> {
    match resolution {
        Some(text) if !text.trim().is_empty() => Ok(()),
        _ => Err(AppError::validation_field(
            "A resolution is required to resolve an issue",
            "resolution",
            "REQUIRED",
        )),
    }
}
