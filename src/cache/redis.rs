use redis::AsyncCommands;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// Best-effort JSON read; any Redis or decoding failure is a miss.
pub async fn get_cache<T: DeserializeOwned>(client: &redis::Client, key: &str) -> Option<T> {
    let mut conn = client.get_multiplexed_async_connection().await.ok()?;
    let value: Option<String> = conn.get(key).await.ok()?;
    serde_json::from_str(&value?).ok()
}

/// Best-effort JSON write with a TTL in seconds.
pub async fn set_cache<T: Serialize>(client: &redis::Client, key: &str, value: &T, ttl: u64) {
    let Ok(json) = serde_json::to_string(value) else {
        return;
    };
    match client.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let result: redis::RedisResult<()> = conn.set_ex(key, json, ttl).await;
            if let Err(e) = result {
                debug!(key = %key, error = %e, "Cache write skipped");
            }
        }
        Err(e) => debug!(key = %key, error = %e, "Cache unavailable"),
    }
}
