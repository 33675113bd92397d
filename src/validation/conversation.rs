use crate::error::AppError;

pub const MAX_MESSAGE_LEN: usize = 4000;

pub fn validate_message_body(body: &str) -> Result<(), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::validation_field("Message cannot be empty", "body", "REQUIRED"));
    }
    if body.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::validation_field(
            "Message is too long (max 4000 characters)",
            "body",
            "INVALID_LENGTH",
        ));
    }
    Ok(())
}
