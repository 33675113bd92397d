pub mod redis;

use ::redis::{AsyncCommands, Client, RedisResult, cmd};
use uuid::Uuid;

use crate::error::AppError;

/// Key under which a revoked token id is remembered.
pub fn revoked_token_key(prefix: &str, jti: &str) -> String {
    format!("{}:revoked:{}", prefix, jti)
}

/// Key for a cached project dashboard.
pub fn project_dashboard_key(prefix: &str, project_id: Uuid) -> String {
    format!("{}:dashboard:project:{}", prefix, project_id)
}

async fn connection(redis_client: &Client) -> Result<::redis::aio::MultiplexedConnection, AppError> {
    redis_client
        .get_multiplexed_async_connection()
        .await
        .map_err(AppError::from)
}

/// Marks a token id as revoked until it would have expired anyway.
pub async fn revoke_token(
    redis_client: &Client,
    prefix: &str,
    jti: &str,
    ttl_secs: u64,
) -> Result<(), AppError> {
    if ttl_secs == 0 {
        return Ok(());
    }
    let mut conn = connection(redis_client).await?;
    let _: () = conn
        .set_ex(revoked_token_key(prefix, jti), 1u8, ttl_secs)
        .await?;
    Ok(())
}

pub async fn is_token_revoked(
    redis_client: &Client,
    prefix: &str,
    jti: &str,
) -> Result<bool, AppError> {
    let mut conn = connection(redis_client).await?;
    let revoked: bool = conn.exists(revoked_token_key(prefix, jti)).await?;
    Ok(revoked)
}

/// Drops a cached project dashboard so the next read recomputes it.
pub async fn invalidate_project_dashboard(redis_client: &Client, prefix: &str, project_id: Uuid) {
    if let Ok(mut conn) = connection(redis_client).await {
        let _: RedisResult<i32> = conn.del(project_dashboard_key(prefix, project_id)).await;
    }
}

/// Redis健康检查
pub async fn redis_health_check(redis_client: &Client) -> Result<bool, AppError> {
    let mut conn = connection(redis_client).await?;

    let pong: String = cmd("PING").query_async(&mut conn).await?;

    Ok(pong == "PONG")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(revoked_token_key("pmis", "abc"), "pmis:revoked:abc");
        let id = Uuid::nil();
        assert_eq!(
            project_dashboard_key("pmis", id),
            "pmis:dashboard:project:00000000-0000-0000-0000-000000000000"
        );
    }
}
