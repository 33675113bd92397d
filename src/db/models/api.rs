use serde::{Deserialize, Serialize};

/// Uniform response envelope shared by every REST endpoint.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            page,
            per_page,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Page/per-page query parameters, clamped to sane bounds.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub const MAX_PER_PAGE: i64 = 100;

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    fn build(success: bool, code: u16, message: &str, data: Option<T>, errors: Option<Vec<ErrorDetail>>) -> Self {
        Self {
            success,
            code,
            message: message.to_string(),
            data,
            meta: None,
            errors,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn single_error(code: u16, message: &str, field: Option<String>, error_code: &str) -> Self {
        Self::build(
            false,
            code,
            message,
            None,
            Some(vec![ErrorDetail {
                field,
                code: error_code.to_string(),
                message: message.to_string(),
            }]),
        )
    }

    pub fn success(data: T, message: &str) -> Self {
        Self::build(true, 200, message, Some(data), None)
    }

    pub fn success_with_meta(data: T, message: &str, meta: ResponseMeta) -> Self {
        let mut response = Self::build(true, 200, message, Some(data), None);
        response.meta = Some(meta);
        response
    }

    pub fn created(data: T, message: &str) -> Self {
        Self::build(true, 201, message, Some(data), None)
    }

    pub fn ok(message: &str) -> Self {
        Self::build(true, 200, message, None, None)
    }

    pub fn error(code: u16, message: &str, errors: Vec<ErrorDetail>) -> Self {
        Self::build(false, code, message, None, Some(errors))
    }

    pub fn validation_error(errors: Vec<ErrorDetail>) -> Self {
        Self::build(false, 400, "Validation failed", None, Some(errors))
    }

    pub fn field_error(code: u16, message: &str, field: Option<String>, error_code: &str) -> Self {
        Self::single_error(code, message, field, error_code)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::single_error(401, message, None, "UNAUTHORIZED")
    }

    pub fn forbidden(message: &str) -> Self {
        Self::single_error(403, message, None, "FORBIDDEN")
    }

    pub fn not_found(message: &str) -> Self {
        Self::single_error(404, message, None, "NOT_FOUND")
    }

    pub fn conflict(message: &str, field: Option<String>, error_code: &str) -> Self {
        Self::single_error(409, message, field, error_code)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::single_error(400, message, None, "BAD_REQUEST")
    }

    pub fn internal_error(message: &str) -> Self {
        Self::single_error(500, message, None, "INTERNAL_ERROR")
    }
}

// 业务错误码常量
pub mod error_codes {
    pub const AUTH_INVALID_CREDENTIALS: &str = "AUTH_001";
    pub const AUTH_ACCOUNT_DISABLED: &str = "AUTH_002";
    pub const AUTH_TOKEN_REVOKED: &str = "AUTH_003";

    pub const USER_EMAIL_EXISTS: &str = "USER_EMAIL_EXISTS";
    pub const USER_USERNAME_EXISTS: &str = "USER_USERNAME_EXISTS";

    pub const NO_ORGANIZATION: &str = "NO_ORGANIZATION";
    pub const ORGANIZATION_SLUG_EXISTS: &str = "ORGANIZATION_SLUG_EXISTS";
    pub const MEMBER_EXISTS: &str = "MEMBER_EXISTS";
    pub const LAST_OWNER: &str = "LAST_OWNER";

    pub const PROJECT_CODE_EXISTS: &str = "PROJECT_CODE_EXISTS";
    pub const DEPENDENCY_CYCLE: &str = "DEPENDENCY_CYCLE";
    pub const DEPENDENCY_EXISTS: &str = "DEPENDENCY_EXISTS";
    pub const PARENT_CYCLE: &str = "PARENT_CYCLE";
    pub const ASSIGNMENT_EXISTS: &str = "ASSIGNMENT_EXISTS";
    pub const DAILY_HOURS_EXCEEDED: &str = "DAILY_HOURS_EXCEEDED";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const SELF_APPROVAL: &str = "SELF_APPROVAL";
    pub const DIRECT_CONVERSATION_EXISTS: &str = "DIRECT_CONVERSATION_EXISTS";
    pub const RATE_UNAVAILABLE: &str = "RATE_UNAVAILABLE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_flags() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);

        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn page_params_are_clamped() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), PageParams::MAX_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn error_envelope_carries_code() {
        let response = ApiResponse::<()>::conflict("dup", Some("code".into()), "PROJECT_CODE_EXISTS");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 409);
        assert_eq!(json["errors"][0]["field"], "code");
        assert!(json.get("data").is_none());
    }
}
