pub mod auth;
pub mod handler;
pub mod manager;
pub mod messages;
pub mod pubsub;

pub use auth::{WebSocketAuth, WebSocketAuthError, WebSocketAuthQuery};
pub use handler::WebSocketHandler;
pub use manager::{ConnectedUser, WebSocketManager};
pub use messages::{ChatEvent, ClientFrame, ServerFrame};

use std::sync::Arc;

use crate::AppState;

/// Minutes without a ping after which a socket is dropped.
pub const STALE_CONNECTION_MINUTES: i64 = 10;

pub fn create_websocket_routes() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(WebSocketHandler::websocket_handler))
}

/// Background task to periodically clean up stale connections.
pub async fn start_connection_cleanup_task(ws_manager: WebSocketManager) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));

    loop {
        interval.tick().await;
        tracing::debug!("Running WebSocket connection cleanup");
        let removed = ws_manager.cleanup_stale_connections(STALE_CONNECTION_MINUTES).await;
        if removed > 0 {
            tracing::info!(removed, "Stale WebSocket connections removed");
        }
    }
}
