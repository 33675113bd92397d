use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    db::models::{
        api::ApiResponse,
        conversation::{AddParticipantRequest, CreateConversationRequest, MessageListQuery, PostMessageRequest},
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::ConversationsService,
    websocket::{ChatEvent, ServerFrame, pubsub},
};

pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let conversations = ConversationsService::list_mine(&mut conn, &ctx)?;
    Ok(Json(ApiResponse::success(conversations, "Conversations retrieved successfully")))
}

pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let summary = {
        let mut conn = state.db.get()?;
        ConversationsService::create(&mut conn, &ctx, &payload)?
    };

    let recipients = summary
        .participant_ids
        .iter()
        .copied()
        .filter(|id| *id != ctx.user_id)
        .collect();
    pubsub::publish(
        &state,
        ChatEvent {
            recipients,
            frame: ServerFrame::Notification {
                title: "New conversation".to_string(),
                body: format!("{} started a conversation", auth_info.user.name),
                conversation_id: Some(summary.conversation.id),
            },
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(summary, "Conversation created successfully")),
    ))
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessageListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let messages = ConversationsService::messages(&mut conn, &ctx, conversation_id, &query)?;
    Ok(Json(ApiResponse::success(messages, "Messages retrieved successfully")))
}

/// Same delivery path as a `send_message` frame.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let delivery = {
        let mut conn = state.db.get()?;
        ConversationsService::post_message(&mut conn, &ctx, conversation_id, &payload.body)?
    };
    let message = delivery.message.clone();
    pubsub::publish(
        &state,
        ChatEvent {
            recipients: delivery.recipient_ids,
            frame: ServerFrame::Message {
                message: delivery.message,
            },
        },
    )
    .await;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(message, "Message sent"))))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    ConversationsService::mark_read(&mut conn, &ctx, conversation_id)?;
    Ok(Json(ApiResponse::<()>::ok("Conversation marked as read")))
}

pub async fn add_participant(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<AddParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let summary = {
        let mut conn = state.db.get()?;
        ConversationsService::add_participant(&mut conn, &ctx, conversation_id, payload.user_id)?
    };

    pubsub::publish(
        &state,
        ChatEvent {
            recipients: vec![payload.user_id],
            frame: ServerFrame::Notification {
                title: "Added to conversation".to_string(),
                body: match &summary.conversation.title {
                    Some(title) => format!("{} added you to \"{}\"", auth_info.user.name, title),
                    None => format!("{} added you to a conversation", auth_info.user.name),
                },
                conversation_id: Some(summary.conversation.id),
            },
        },
    )
    .await;

    Ok(Json(ApiResponse::success(summary, "Participant added successfully")))
}
