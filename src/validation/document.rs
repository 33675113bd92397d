use crate::error::AppError;

pub const MAX_DOCUMENT_SIZE_BYTES: i64 = 2 * 1024 * 1024 * 1024;

pub fn validate_document_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation_field("Document title is required", "title", "REQUIRED"));
    }
    Ok(())
}

pub fn validate_file_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::validation_field(
            "File name must be a plain file name",
            "file_name",
            "INVALID_FORMAT",
        ));
    }
    Ok(())
}

pub fn validate_size(size_bytes: i64) -> Result<(), AppError> {
    if size_bytes <= 0 || size_bytes > MAX_DOCUMENT_SIZE_BYTES {
        return Err(AppError::validation_field(
            "File size must be between 1 byte and 2 GiB",
            "size_bytes",
            "OUT_OF_RANGE",
        ));
    }
    Ok(())
}

/// Lowercase or uppercase hex SHA-256 digest.
pub fn validate_checksum(checksum: &str) -> Result<(), AppError> {
    if checksum.len() != 64 || hex::decode(checksum).is_err() {
        return Err(AppError::validation_field(
            "Checksum must be a hex-encoded SHA-256 digest",
            "checksum_sha256",
            "INVALID_FORMAT",
        ));
    }
    Ok(())
}

pub fn validate_storage_key(key: &str) -> Result<(), AppError> {
    if key.trim().is_empty() || key.len() > 512 || key.starts_with('/') || key.contains("..") {
        return Err(AppError::validation_field(
            "Storage key must be a relative object key",
            "storage_key",
            "INVALID_FORMAT",
        ));
    }
    Ok(())
}
