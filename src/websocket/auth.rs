use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    AppState,
    error::AppError,
    middleware::{auth::{AuthUserInfo, authenticate}, rbac::Permission},
    services::context::RequestContext,
};

#[derive(Debug, Deserialize)]
pub struct WebSocketAuthQuery {
    pub token: Option<String>,
}

#[derive(Debug, Error)]
pub enum WebSocketAuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("No organization selected")]
    NoOrganization,
    #[error("Chat is not allowed for this role")]
    Forbidden,
    #[error("Authentication backend unavailable")]
    Unavailable,
}

impl From<AppError> for WebSocketAuthError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Auth { .. } | AppError::Jwt(_) => WebSocketAuthError::InvalidToken,
            AppError::Forbidden { .. } => WebSocketAuthError::Forbidden,
            AppError::Validation { .. } => WebSocketAuthError::NoOrganization,
            _ => WebSocketAuthError::Unavailable,
        }
    }
}

pub struct WebSocketAuth;

impl WebSocketAuth {
    /// Authenticates the `?token=` query parameter and checks the caller
    /// may chat in their current organization.
    pub async fn authenticate_websocket(
        state: &AppState,
        query: &WebSocketAuthQuery,
    ) -> Result<(AuthUserInfo, RequestContext), WebSocketAuthError> {
        let token = query
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(WebSocketAuthError::MissingToken)?;

        let info = authenticate(state, token).await.map_err(|e| {
            tracing::warn!(error = %e, "WebSocket token rejected");
            WebSocketAuthError::from(e)
        })?;
        let ctx = info.require(Permission::Chat)?;
        Ok((info, ctx))
    }

    pub fn error_response(error: &WebSocketAuthError) -> (StatusCode, &'static str) {
        match error {
            WebSocketAuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authentication token"),
            WebSocketAuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication token"),
            WebSocketAuthError::NoOrganization => (StatusCode::BAD_REQUEST, "No organization selected"),
            WebSocketAuthError::Forbidden => (StatusCode::FORBIDDEN, "Chat is not allowed for this role"),
            WebSocketAuthError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "Authentication backend unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_app_errors() {
        assert!(matches!(
            WebSocketAuthError::from(AppError::auth("expired")),
            WebSocketAuthError::InvalidToken
        ));
        assert!(matches!(
            WebSocketAuthError::from(AppError::forbidden("no")),
            WebSocketAuthError::Forbidden
        ));
        assert!(matches!(
            WebSocketAuthError::from(AppError::internal("db down")),
            WebSocketAuthError::Unavailable
        ));
    }

    #[test]
    fn error_responses() {
        assert_eq!(
            WebSocketAuth::error_response(&WebSocketAuthError::MissingToken).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebSocketAuth::error_response(&WebSocketAuthError::Forbidden).0,
            StatusCode::FORBIDDEN
        );
    }
}
