use std::time::Duration;

use futures_util::StreamExt;
use redis::AsyncCommands;
use tracing::{debug, error, info, warn};

use super::manager::WebSocketManager;
use super::messages::ChatEvent;
use crate::AppState;

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Redis channel carrying chat events between instances.
pub fn chat_channel(prefix: &str) -> String {
    format!("{}:chat", prefix)
}

/// Publishes an event to every instance. When Redis is unreachable the
/// event still reaches sockets connected to this instance.
pub async fn publish(state: &AppState, event: ChatEvent) {
    if event.recipients.is_empty() {
        return;
    }
    let channel = chat_channel(&state.config.redis_channel_prefix);

    let published = match serde_json::to_string(&event) {
        Ok(payload) => match state.redis.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: redis::RedisResult<i64> = conn.publish(&channel, payload).await;
                result.map_err(|e| warn!(error = %e, "Chat publish failed")).is_ok()
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable for chat publish");
                false
            }
        },
        Err(e) => {
            error!(error = %e, "Chat event serialization failed");
            false
        }
    };

    if !published {
        state.ws_manager.deliver(&event).await;
    }
}

/// Forwards events from the chat channel to local sockets; resubscribes
/// after connection loss.
pub async fn run_subscriber(client: redis::Client, channel: String, manager: WebSocketManager) {
    loop {
        match subscribe_once(&client, &channel, &manager).await {
            Ok(()) => warn!(channel = %channel, "Chat subscription ended"),
            Err(e) => error!(channel = %channel, error = %e, "Chat subscription failed"),
        }
        tokio::time::sleep(RESUBSCRIBE_DELAY).await;
    }
}

async fn subscribe_once(
    client: &redis::Client,
    channel: &str,
    manager: &WebSocketManager,
) -> redis::RedisResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.subscribe(channel).await?;
    info!(channel = %channel, "Subscribed to chat channel");

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Unreadable chat payload");
                continue;
            }
        };
        match serde_json::from_str::<ChatEvent>(&payload) {
            Ok(event) => {
                let delivered = manager.deliver(&event).await;
                debug!(delivered, "Chat event delivered");
            }
            Err(e) => warn!(error = %e, "Malformed chat event"),
        }
    }
    Ok(())
}
