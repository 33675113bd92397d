pub mod auth;
pub mod logger;
pub mod rbac;
pub mod request_tracking;
pub mod security_headers;

pub use auth::{AuthService, AuthUserInfo, auth_middleware};
pub use rbac::Permission;
pub use request_tracking::{REQUEST_ID_HEADER, extract_request_id, request_tracking_middleware};
pub use security_headers::security_headers;
