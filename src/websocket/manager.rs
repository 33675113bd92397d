use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::messages::{ChatEvent, ServerFrame};

/// A live socket of an authenticated user.
#[derive(Debug, Clone)]
pub struct ConnectedUser {
    pub user_id: Uuid,
    pub username: String,
    pub organization_id: Uuid,
    pub connected_at: DateTime<Utc>,
    pub last_ping: DateTime<Utc>,
    pub sender: mpsc::UnboundedSender<ServerFrame>,
}

/// Connections local to this instance, keyed by connection id.
#[derive(Clone, Default)]
pub struct WebSocketManager {
    connections: Arc<RwLock<HashMap<String, ConnectedUser>>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_connection(&self, connection_id: String, user: ConnectedUser) {
        info!(
            connection_id = %connection_id,
            user_id = %user.user_id,
            username = %user.username,
            "WebSocket connected"
        );
        self.connections.write().await.insert(connection_id, user);
    }

    pub async fn remove_connection(&self, connection_id: &str) {
        if let Some(user) = self.connections.write().await.remove(connection_id) {
            info!(connection_id = %connection_id, user_id = %user.user_id, "WebSocket disconnected");
        }
    }

    pub async fn update_ping(&self, connection_id: &str) {
        if let Some(user) = self.connections.write().await.get_mut(connection_id) {
            user.last_ping = Utc::now();
        }
    }

    pub async fn get_connection(&self, connection_id: &str) -> Option<ConnectedUser> {
        self.connections.read().await.get(connection_id).cloned()
    }

    pub async fn get_connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn online_user_ids(&self) -> HashSet<Uuid> {
        self.connections.read().await.values().map(|u| u.user_id).collect()
    }

    /// Sends a frame to every local socket of `user_id`. Returns how many
    /// sockets accepted it.
    pub async fn send_to_user(&self, user_id: Uuid, frame: &ServerFrame) -> usize {
        self.deliver(&ChatEvent {
            recipients: vec![user_id],
            frame: frame.clone(),
        })
        .await
    }

    /// Hands an event to the local sockets of its recipients.
    pub async fn deliver(&self, event: &ChatEvent) -> usize {
        let recipients: HashSet<Uuid> = event.recipients.iter().copied().collect();
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for (connection_id, user) in connections.iter() {
            if !recipients.contains(&user.user_id) {
                continue;
            }
            if user.sender.send(event.frame.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(connection_id = %connection_id, "Dropping frame for closed socket");
            }
        }
        delivered
    }

    /// Drops connections that have not pinged within `timeout_minutes`.
    /// Dropping the sender ends the socket's write loop.
    pub async fn cleanup_stale_connections(&self, timeout_minutes: i64) -> usize {
        let cutoff_time = Utc::now() - chrono::Duration::minutes(timeout_minutes);
        let mut connections = self.connections.write().await;

        let stale: Vec<String> = connections
            .iter()
            .filter(|(_, user)| user.last_ping < cutoff_time || user.sender.is_closed())
            .map(|(id, _)| id.clone())
            .collect();

        for connection_id in &stale {
            if let Some(user) = connections.remove(connection_id) {
                warn!(connection_id = %connection_id, user_id = %user.user_id, "Removed stale connection");
            }
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_id: Uuid) -> (ConnectedUser, mpsc::UnboundedReceiver<ServerFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Utc::now();
        (
            ConnectedUser {
                user_id,
                username: "site-engineer".to_string(),
                organization_id: Uuid::new_v4(),
                connected_at: now,
                last_ping: now,
                sender,
            },
            receiver,
        )
    }

    #[tokio::test]
    async fn delivers_only_to_recipients() {
        let manager = WebSocketManager::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let (a, mut a_rx) = user(alice);
        let (b, mut b_rx) = user(bob);
        manager.add_connection("a".to_string(), a).await;
        manager.add_connection("b".to_string(), b).await;

        let frame = ServerFrame::Typing {
            conversation_id: Uuid::new_v4(),
            user_id: bob,
        };
        let delivered = manager
            .deliver(&ChatEvent {
                recipients: vec![alice],
                frame: frame.clone(),
            })
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(a_rx.recv().await, Some(frame));
        assert!(b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_socket_of_a_user_receives() {
        let manager = WebSocketManager::new();
        let id = Uuid::new_v4();
        let (phone, _phone_rx) = user(id);
        let (laptop, _laptop_rx) = user(id);
        manager.add_connection("phone".to_string(), phone).await;
        manager.add_connection("laptop".to_string(), laptop).await;

        assert_eq!(manager.send_to_user(id, &ServerFrame::error("X", "y")).await, 2);
        assert_eq!(manager.online_user_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn reaps_stale_and_closed_connections() {
        let manager = WebSocketManager::new();
        let (mut stale, _stale_rx) = user(Uuid::new_v4());
        stale.last_ping = Utc::now() - chrono::Duration::minutes(30);
        let (closed, closed_rx) = user(Uuid::new_v4());
        drop(closed_rx);
        let (fresh, _fresh_rx) = user(Uuid::new_v4());

        manager.add_connection("stale".to_string(), stale).await;
        manager.add_connection("closed".to_string(), closed).await;
        manager.add_connection("fresh".to_string(), fresh).await;

        assert_eq!(manager.cleanup_stale_connections(10).await, 2);
        assert_eq!(manager.get_connection_count().await, 1);
        assert!(manager.get_connection("fresh").await.is_some());
    }
}
