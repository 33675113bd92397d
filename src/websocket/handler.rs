use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    auth::{WebSocketAuth, WebSocketAuthQuery},
    manager::ConnectedUser,
    messages::{ChatEvent, ClientFrame, ServerFrame},
    pubsub,
};
use crate::{
    AppState,
    db::repositories::conversations::ConversationsRepo,
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::{ConversationsService, context::RequestContext},
};

pub struct WebSocketHandler;

impl WebSocketHandler {
    /// `GET /ws?token=...`
    pub async fn websocket_handler(
        ws: WebSocketUpgrade,
        Query(query): Query<WebSocketAuthQuery>,
        State(state): State<Arc<AppState>>,
    ) -> Response {
        let (info, ctx) = match WebSocketAuth::authenticate_websocket(&state, &query).await {
            Ok(authenticated) => authenticated,
            Err(error) => {
                tracing::warn!(error = %error, "WebSocket authentication failed");
                return WebSocketAuth::error_response(&error).into_response();
            }
        };

        tracing::info!(user_id = %info.user.id, username = %info.user.username, "WebSocket upgrade");
        ws.on_upgrade(move |socket| Self::handle_socket(socket, state, info, ctx))
    }

    async fn handle_socket(socket: WebSocket, state: Arc<AppState>, info: AuthUserInfo, ctx: RequestContext) {
        let connection_id = Uuid::new_v4().to_string();
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerFrame>();
        let now = Utc::now();

        state
            .ws_manager
            .add_connection(
                connection_id.clone(),
                ConnectedUser {
                    user_id: ctx.user_id,
                    username: info.user.username.clone(),
                    organization_id: ctx.organization_id,
                    connected_at: now,
                    last_ping: now,
                    sender: tx.clone(),
                },
            )
            .await;

        let _ = tx.send(ServerFrame::Welcome {
            connection_id: connection_id.clone(),
            user_id: ctx.user_id,
            organization_id: ctx.organization_id,
        });

        let (mut sink, mut stream) = socket.split();

        let mut send_task = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let Ok(text) = serde_json::to_string(&frame) else {
                    continue;
                };
                if sink.send(WsMessage::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let mut recv_task = {
            let state = state.clone();
            let connection_id = connection_id.clone();
            tokio::spawn(async move {
                while let Some(Ok(msg)) = stream.next().await {
                    match msg {
                        WsMessage::Text(text) => {
                            let reply = match serde_json::from_str::<ClientFrame>(&text) {
                                Ok(frame) => Self::handle_frame(&state, &ctx, &connection_id, frame).await,
                                Err(_) => Some(ServerFrame::error("INVALID_FRAME", "Unrecognized frame")),
                            };
                            if let Some(reply) = reply {
                                if tx.send(reply).is_err() {
                                    break;
                                }
                            }
                        }
                        WsMessage::Ping(_) | WsMessage::Pong(_) => {
                            state.ws_manager.update_ping(&connection_id).await;
                        }
                        WsMessage::Close(_) => break,
                        WsMessage::Binary(_) => {}
                    }
                }
            })
        };

        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        state.ws_manager.remove_connection(&connection_id).await;
    }

    /// Handles one client frame; the return value goes back to the sender only.
    async fn handle_frame(
        state: &AppState,
        ctx: &RequestContext,
        connection_id: &str,
        frame: ClientFrame,
    ) -> Option<ServerFrame> {
        let result = match frame {
            ClientFrame::Ping => {
                state.ws_manager.update_ping(connection_id).await;
                return Some(ServerFrame::Pong { timestamp: Utc::now() });
            }
            ClientFrame::SendMessage { conversation_id, body } => Self::send_message(state, ctx, conversation_id, &body).await,
            ClientFrame::Typing { conversation_id } => Self::typing(state, ctx, conversation_id).await,
            ClientFrame::MarkRead { conversation_id } => state
                .db
                .get()
                .map_err(AppError::from)
                .and_then(|mut conn| ConversationsService::mark_read(&mut conn, ctx, conversation_id)),
        };

        match result {
            Ok(()) => None,
            Err(err) => {
                tracing::debug!(error = %err, "WebSocket frame rejected");
                Some(ServerFrame::from_app_error(&err))
            }
        }
    }

    async fn send_message(state: &AppState, ctx: &RequestContext, conversation_id: Uuid, body: &str) -> Result<(), AppError> {
        let delivery = {
            let mut conn = state.db.get()?;
            ConversationsService::post_message(&mut conn, ctx, conversation_id, body)?
        };
        pubsub::publish(
            state,
            ChatEvent {
                recipients: delivery.recipient_ids,
                frame: ServerFrame::Message {
                    message: delivery.message,
                },
            },
        )
        .await;
        Ok(())
    }

    async fn typing(state: &AppState, ctx: &RequestContext, conversation_id: Uuid) -> Result<(), AppError> {
        let recipients: Vec<Uuid> = {
            let mut conn = state.db.get()?;
            let conversation = ConversationsService::find_joined(&mut conn, ctx, conversation_id)?;
            ConversationsRepo::participant_ids(&mut conn, conversation.id)?
                .into_iter()
                .filter(|id| *id != ctx.user_id)
                .collect()
        };
        pubsub::publish(
            state,
            ChatEvent {
                recipients,
                frame: ServerFrame::Typing {
                    conversation_id,
                    user_id: ctx.user_id,
                },
            },
        )
        .await;
        Ok(())
    }
}
