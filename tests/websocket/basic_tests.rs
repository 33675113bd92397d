use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as TungsteniteMessage};
use url::Url;
use uuid::Uuid;

use pmis_backend::websocket::{ChatEvent, ClientFrame, ServerFrame, WebSocketManager};

use super::{TestConfig, create_test_connected_user, create_test_jwt, wait_for_condition};

#[tokio::test]
async fn test_websocket_manager_creation() {
    let manager = WebSocketManager::new();
    assert_eq!(manager.get_connection_count().await, 0);
    assert!(manager.online_user_ids().await.is_empty());
}

#[tokio::test]
async fn test_chat_event_reaches_only_recipients() {
    let manager = WebSocketManager::new();
    let org = Uuid::new_v4();
    let (alice, mut alice_rx) = create_test_connected_user("alice", org);
    let (bob, mut bob_rx) = create_test_connected_user("bob", org);
    let alice_id = alice.user_id;

    manager.add_connection("c1".to_string(), alice).await;
    manager.add_connection("c2".to_string(), bob).await;
    assert_eq!(manager.online_user_ids().await.len(), 2);

    let frame = ServerFrame::Typing {
        conversation_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
    };
    let delivered = manager
        .deliver(&ChatEvent {
            recipients: vec![alice_id],
            frame: frame.clone(),
        })
        .await;

    assert_eq!(delivered, 1);
    assert_eq!(alice_rx.recv().await, Some(frame));
    assert!(bob_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_user_with_two_sockets_gets_both_copies() {
    let manager = WebSocketManager::new();
    let org = Uuid::new_v4();
    let (phone, mut phone_rx) = create_test_connected_user("carol", org);
    let (mut laptop, mut laptop_rx) = create_test_connected_user("carol", org);
    laptop.user_id = phone.user_id;
    let user_id = phone.user_id;

    manager.add_connection("phone".to_string(), phone).await;
    manager.add_connection("laptop".to_string(), laptop).await;

    let frame = ServerFrame::error("FORBIDDEN", "Not a participant");
    assert_eq!(manager.send_to_user(user_id, &frame).await, 2);
    assert_eq!(phone_rx.recv().await, Some(frame.clone()));
    assert_eq!(laptop_rx.recv().await, Some(frame));
}

#[tokio::test]
async fn test_cleanup_drops_stale_and_closed_sockets() {
    let manager = WebSocketManager::new();
    let org = Uuid::new_v4();

    let (mut idle, _idle_rx) = create_test_connected_user("idle", org);
    idle.last_ping = chrono::Utc::now() - chrono::Duration::minutes(30);
    let (gone, gone_rx) = create_test_connected_user("gone", org);
    let (live, _live_rx) = create_test_connected_user("live", org);
    drop(gone_rx);

    manager.add_connection("idle".to_string(), idle).await;
    manager.add_connection("gone".to_string(), gone).await;
    manager.add_connection("live".to_string(), live).await;

    assert_eq!(manager.cleanup_stale_connections(10).await, 2);
    assert_eq!(manager.get_connection_count().await, 1);
    assert!(manager.get_connection("live").await.is_some());
}

#[tokio::test]
async fn test_update_ping_keeps_connection_alive() {
    let manager = WebSocketManager::new();
    let (mut user, _rx) = create_test_connected_user("dave", Uuid::new_v4());
    user.last_ping = chrono::Utc::now() - chrono::Duration::minutes(30);
    manager.add_connection("c1".to_string(), user).await;

    manager.update_ping("c1").await;
    assert_eq!(manager.cleanup_stale_connections(10).await, 0);

    manager.remove_connection("c1").await;
    let manager_ref = &manager;
    assert!(
        wait_for_condition(
            || async move { manager_ref.get_connection_count().await == 0 },
            Duration::from_millis(100),
            Duration::from_millis(10),
        )
        .await
    );
}

#[test]
fn test_client_frames_parse_from_wire() {
    let conversation_id = Uuid::new_v4();
    let frame: ClientFrame = serde_json::from_value(json!({
        "type": "send_message",
        "conversation_id": conversation_id,
        "body": "Concrete pour moved to Friday"
    }))
    .unwrap();
    assert_eq!(
        frame,
        ClientFrame::SendMessage {
            conversation_id,
            body: "Concrete pour moved to Friday".to_string()
        }
    );

    assert!(serde_json::from_value::<ClientFrame>(json!({"type": "subscribe"})).is_err());
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_ping_pong_over_socket() {
    let config = TestConfig::default();
    let token = create_test_jwt(Uuid::new_v4(), "ws_tester", &config.jwt_secret);
    let url = Url::parse(&format!("{}?token={}", config.websocket_url, token)).expect("Invalid URL");

    let (mut socket, _) = connect_async(url).await.expect("connect");

    let welcome = timeout(config.timeout_duration, socket.next())
        .await
        .expect("welcome timeout")
        .expect("stream closed")
        .expect("read error");
    if let TungsteniteMessage::Text(text) = welcome {
        let frame: ServerFrame = serde_json::from_str(&text).unwrap();
        assert!(matches!(frame, ServerFrame::Welcome { .. }));
    }

    socket
        .send(TungsteniteMessage::Text(json!({"type": "ping"}).to_string()))
        .await
        .unwrap();

    let reply = timeout(config.timeout_duration, socket.next())
        .await
        .expect("pong timeout")
        .expect("stream closed")
        .expect("read error");
    match reply {
        TungsteniteMessage::Text(text) => {
            let frame: ServerFrame = serde_json::from_str(&text).unwrap();
            assert!(matches!(frame, ServerFrame::Pong { .. }));
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_connection_without_token_is_rejected() {
    let config = TestConfig::default();
    let url = Url::parse(&config.websocket_url).unwrap();
    assert!(connect_async(url).await.is_err());
}
