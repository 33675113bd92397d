pub mod conversation;
pub mod document;
pub mod issue;
pub mod project;
pub mod resource;
pub mod risk;
pub mod task;
pub mod time_entry;

use axum::{
    Json, async_trait,
    extract::FromRequest,
    http::Request,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{db::models::api::ErrorDetail, error::AppError};

/// 验证的 JSON 提取器
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S, axum::body::Body> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(format!("Invalid JSON body: {}", e)))?;

        value.validate().map_err(|errors| {
            let details = collect_error_details(&errors);
            match details.into_iter().next() {
                Some(first) => AppError::Validation {
                    message: first.message,
                    field: first.field,
                    code: Some(first.code),
                },
                None => AppError::validation("Validation failed"),
            }
        })?;

        Ok(ValidatedJson(value))
    }
}

pub fn collect_error_details(errors: &validator::ValidationErrors) -> Vec<ErrorDetail> {
    let mut details: Vec<ErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| ErrorDetail {
                field: Some(field.to_string()),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field: {}", field)),
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

/// 常用验证规则
pub mod rules {
    use validator::ValidationError;

    /// 验证密码强度
    pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
        if password.len() < 8 {
            return Err(ValidationError::new("password_too_short"));
        }

        let classes = [
            password.chars().any(|c| c.is_lowercase()),
            password.chars().any(|c| c.is_uppercase()),
            password.chars().any(|c| c.is_numeric()),
            password.chars().any(|c| "!@#$%^&*()_+-=[]{}|;:,.<>?".contains(c)),
        ];

        if classes.iter().filter(|present| **present).count() < 3 {
            return Err(ValidationError::new("weak_password"));
        }

        Ok(())
    }

    /// 验证用户名格式
    pub fn validate_username_format(username: &str) -> Result<(), ValidationError> {
        if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ValidationError::new("invalid_username_format"));
        }

        if username.chars().next().map_or(true, |c| c.is_numeric()) {
            return Err(ValidationError::new("username_starts_with_number"));
        }

        Ok(())
    }

    /// Organization slug: lowercase letters, digits and inner hyphens.
    pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
        if slug.is_empty() || slug.len() > 100 {
            return Err(ValidationError::new("invalid_slug_length"));
        }

        if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(ValidationError::new("invalid_slug_format"));
        }

        if slug.starts_with('-') || slug.ends_with('-') {
            return Err(ValidationError::new("slug_invalid_hyphens"));
        }

        Ok(())
    }

    /// Three ASCII letters, e.g. `USD`. Case-insensitive.
    pub fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(())
        } else {
            Err(ValidationError::new("invalid_currency_code"))
        }
    }

    /// E.164: a leading `+` and 8 to 15 digits, first digit non-zero.
    pub fn validate_e164_phone(phone: &str) -> Result<(), ValidationError> {
        let Some(digits) = phone.strip_prefix('+') else {
            return Err(ValidationError::new("invalid_phone_format"));
        };

        if !(8..=15).contains(&digits.len())
            || !digits.chars().all(|c| c.is_ascii_digit())
            || digits.starts_with('0')
        {
            return Err(ValidationError::new("invalid_phone_format"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::rules::*;

    #[test]
    fn password_strength() {
        assert!(validate_password_strength("Password1").is_ok());
        assert!(validate_password_strength("pass word1!").is_ok());
        assert!(validate_password_strength("password").is_err());
        assert!(validate_password_strength("Pa1!").is_err());
    }

    #[test]
    fn username_format() {
        assert!(validate_username_format("site_engineer").is_ok());
        assert!(validate_username_format("1engineer").is_err());
        assert!(validate_username_format("bad name").is_err());
        assert!(validate_username_format("").is_err());
    }

    #[test]
    fn slug_format() {
        assert!(validate_slug("acme-epc").is_ok());
        assert!(validate_slug("-acme").is_err());
        assert!(validate_slug("Acme").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn currency_codes() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("eur").is_ok());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_currency_code("U5D").is_err());
    }

    #[test]
    fn e164_numbers() {
        assert!(validate_e164_phone("+14155550123").is_ok());
        assert!(validate_e164_phone("14155550123").is_err());
        assert!(validate_e164_phone("+0123456789").is_err());
        assert!(validate_e164_phone("+1234").is_err());
        assert!(validate_e164_phone("+1415555012a").is_err());
    }
}
