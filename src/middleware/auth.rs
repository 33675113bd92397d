use crate::{
    AppState,
    cache,
    config::AuthConfig,
    db::{
        enums::MemberRole,
        models::AuthUser,
        repositories::{members::MembersRepo, users::UsersRepo},
    },
    error::{AppError, AppResult},
    middleware::rbac::Permission,
    services::context::RequestContext,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user_id
    pub email: String,
    pub username: String,
    pub exp: u64,
    pub iat: u64,
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: u64,
    pub iat: u64,
    pub jti: String,
    /// Always `"refresh"`; keeps refresh tokens from passing as access tokens.
    pub typ: String,
}

const REFRESH_TYPE: &str = "refresh";

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Seconds until `exp`, saturating at zero.
pub fn remaining_ttl(exp: u64) -> u64 {
    exp.saturating_sub(unix_now())
}

#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn access_token_expires_in(&self) -> u64 {
        self.config.access_token_expires_in
    }

    pub fn generate_access_token(
        &self,
        user: &AuthUser,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            exp: now + self.config.access_token_expires_in,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
    }

    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();

        let claims = RefreshClaims {
            sub: user_id,
            exp: now + self.config.refresh_token_expires_in,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            typ: REFRESH_TYPE.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<RefreshClaims> {
        let token_data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::default(),
        )?;

        if token_data.claims.typ != REFRESH_TYPE {
            return Err(AppError::auth("Not a refresh token"));
        }
        Ok(token_data.claims)
    }
}

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUserInfo {
    pub user: AuthUser,
    pub current_organization_id: Option<Uuid>,
    pub role: Option<MemberRole>,
    pub jti: String,
    pub exp: u64,
}

impl AuthUserInfo {
    /// Organization-scoped context; fails when no organization is selected.
    pub fn context(&self) -> AppResult<RequestContext> {
        match (self.current_organization_id, self.role) {
            (Some(organization_id), Some(role)) => Ok(RequestContext {
                user_id: self.user.id,
                organization_id,
                role,
            }),
            _ => Err(AppError::Validation {
                message: "No organization selected".to_string(),
                field: None,
                code: Some(crate::db::models::api::error_codes::NO_ORGANIZATION.to_string()),
            }),
        }
    }

    /// Context for a caller holding `permission` in the current organization.
    pub fn require(&self, permission: Permission) -> AppResult<RequestContext> {
        let ctx = self.context()?;
        ctx.require(permission)?;
        Ok(ctx)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUserInfo
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUserInfo>()
            .cloned()
            .ok_or_else(|| AppError::auth("Authentication required"))
    }
}

pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies an access token and loads the caller with their role in the
/// current organization.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUserInfo> {
    let claims = state.auth_service.verify_token(token)?;

    if cache::is_token_revoked(&state.redis, &state.config.redis_channel_prefix, &claims.jti).await? {
        return Err(AppError::Auth {
            message: "Token has been revoked".to_string(),
        });
    }

    let mut conn = state.db.get()?;
    let user = UsersRepo::find_by_id(&mut conn, claims.sub)?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::auth("User not found or inactive"))?;

    let membership = match user.current_organization_id {
        Some(org_id) => MembersRepo::find(&mut conn, org_id, user.id)?,
        None => None,
    };

    Ok(AuthUserInfo {
        current_organization_id: membership.as_ref().map(|m| m.organization_id),
        role: membership.map(|m| m.role),
        user: user.into(),
        jti: claims.jti,
        exp: claims.exp,
    })
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<axum::body::Body>,
    next: Next<axum::body::Body>,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .ok_or_else(|| AppError::auth("Missing bearer token"))?;

    let auth_info = authenticate(&state, &token).await?;

    request.extensions_mut().insert(auth_info);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            access_token_expires_in: 3600,
            refresh_token_expires_in: 7200,
        })
    }

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "pm@example.com".to_string(),
            username: "pm".to_string(),
            name: "Project Manager".to_string(),
            phone: None,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let user = user();
        let token = service().generate_access_token(&user).unwrap();
        let claims = service().verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "pm");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let user = user();
        let refresh = service().generate_refresh_token(user.id).unwrap();
        assert!(service().verify_token(&refresh).is_err());
        assert_eq!(service().verify_refresh_token(&refresh).unwrap().sub, user.id);

        let access = service().generate_access_token(&user).unwrap();
        assert!(service().verify_refresh_token(&access).is_err());
    }

    #[test]
    fn rejects_foreign_signature() {
        let other = AuthService::new(AuthConfig {
            jwt_secret: "fedcba9876543210fedcba9876543210".to_string(),
            access_token_expires_in: 3600,
            refresh_token_expires_in: 7200,
        });
        let token = other.generate_access_token(&user()).unwrap();
        assert!(service().verify_token(&token).is_err());
    }

    #[test]
    fn context_requires_organization() {
        let info = AuthUserInfo {
            user: user(),
            current_organization_id: None,
            role: None,
            jti: "j".to_string(),
            exp: 0,
        };
        let err = info.context().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let scoped = AuthUserInfo {
            current_organization_id: Some(Uuid::new_v4()),
            role: Some(MemberRole::Member),
            ..info
        };
        assert!(scoped.require(Permission::LogTime).is_ok());
        assert_eq!(
            scoped.require(Permission::ApproveTime).unwrap_err().status_code(),
            axum::http::StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}
