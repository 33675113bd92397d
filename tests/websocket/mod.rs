pub mod basic_tests;

// Common test utilities and helper functions
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use pmis_backend::websocket::{ConnectedUser, ServerFrame};

/// Common test configuration
#[allow(dead_code)]
pub struct TestConfig {
    pub websocket_url: String,
    pub jwt_secret: String,
    pub timeout_duration: Duration,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            websocket_url: "ws://127.0.0.1:8000/ws".to_string(),
            jwt_secret: "test_jwt_secret_key_0123456789abcdef".to_string(),
            timeout_duration: Duration::from_secs(5),
        }
    }
}

/// Access token in the shape the server issues.
pub fn create_test_jwt(user_id: Uuid, username: &str, secret: &str) -> String {
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    #[derive(serde::Serialize)]
    struct TestClaims {
        sub: Uuid,
        email: String,
        username: String,
        exp: u64,
        iat: u64,
        jti: String,
    }

    let now = chrono::Utc::now().timestamp() as u64;
    let claims = TestClaims {
        sub: user_id,
        email: format!("{}@example.com", username),
        username: username.to_string(),
        exp: now + 3600,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .unwrap()
}

/// A connected user plus the receiving end of its outbound queue.
pub fn create_test_connected_user(
    username: &str,
    organization_id: Uuid,
) -> (ConnectedUser, mpsc::UnboundedReceiver<ServerFrame>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let user = ConnectedUser {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        organization_id,
        connected_at: chrono::Utc::now(),
        last_ping: chrono::Utc::now(),
        sender,
    };
    (user, receiver)
}

/// Wait for a condition to be true with timeout
pub async fn wait_for_condition<F, Fut>(
    mut condition: F,
    timeout: Duration,
    check_interval: Duration,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(check_interval).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmis_backend::config::AuthConfig;
    use pmis_backend::middleware::auth::AuthService;

    #[test]
    fn test_jwt_is_accepted_by_auth_service() {
        let config = TestConfig::default();
        let user_id = Uuid::new_v4();
        let token = create_test_jwt(user_id, "site_lead", &config.jwt_secret);

        let service = AuthService::new(AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            access_token_expires_in: 3600,
            refresh_token_expires_in: 7200,
        });
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "site_lead");
    }

    #[test]
    fn test_create_test_connected_user() {
        let (user, _rx) = create_test_connected_user("test_user", Uuid::new_v4());

        assert_eq!(user.username, "test_user");
        assert!(user.connected_at <= chrono::Utc::now());
        assert!(!user.sender.is_closed());
    }

    #[tokio::test]
    async fn test_wait_for_condition_timeout() {
        let result = wait_for_condition(
            || async { false },
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await;

        assert!(!result);
    }
}
