use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::conversation::Message;
use crate::error::AppError;

/// Frames sent by clients over `/ws`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Ping,
    SendMessage { conversation_id: Uuid, body: String },
    Typing { conversation_id: Uuid },
    MarkRead { conversation_id: Uuid },
}

/// Frames pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Pong {
        timestamp: DateTime<Utc>,
    },
    Welcome {
        connection_id: String,
        user_id: Uuid,
        organization_id: Uuid,
    },
    Message {
        message: Message,
    },
    Typing {
        conversation_id: Uuid,
        user_id: Uuid,
    },
    Notification {
        title: String,
        body: String,
        conversation_id: Option<Uuid>,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ServerFrame {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerFrame::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Error frame for a failed operation. Internal failures are not
    /// described to the client.
    pub fn from_app_error(err: &AppError) -> Self {
        match err {
            AppError::Validation { message, code, .. } => {
                Self::error(code.as_deref().unwrap_or("BAD_REQUEST"), message.as_str())
            }
            AppError::Conflict { message, code, .. } => {
                Self::error(code.as_deref().unwrap_or("CONFLICT"), message.as_str())
            }
            AppError::NotFound { resource } => Self::error("NOT_FOUND", format!("{} not found", resource)),
            AppError::Forbidden { message } => Self::error("FORBIDDEN", message.as_str()),
            AppError::Auth { message } => Self::error("UNAUTHORIZED", message.as_str()),
            _ => Self::error("INTERNAL_ERROR", "Internal server error"),
        }
    }
}

/// A frame addressed to a set of users; the unit published on the Redis
/// chat channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub recipients: Vec<Uuid>,
    pub frame: ServerFrame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_frames() {
        let id = Uuid::new_v4();
        let frame: ClientFrame =
            serde_json::from_str(&format!(r#"{{"type":"send_message","conversation_id":"{}","body":"hi"}}"#, id)).unwrap();
        assert_eq!(
            frame,
            ClientFrame::SendMessage {
                conversation_id: id,
                body: "hi".to_string()
            }
        );
        assert_eq!(serde_json::from_str::<ClientFrame>(r#"{"type":"ping"}"#).unwrap(), ClientFrame::Ping);
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn server_frames_are_tagged() {
        let json = serde_json::to_value(ServerFrame::error("NOT_FOUND", "Conversation not found")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn internal_errors_are_masked() {
        let frame = ServerFrame::from_app_error(&AppError::internal("pool exhausted"));
        assert_eq!(frame, ServerFrame::error("INTERNAL_ERROR", "Internal server error"));

        let frame = ServerFrame::from_app_error(&AppError::validation_field("too long", "body", "INVALID_LENGTH"));
        assert_eq!(frame, ServerFrame::error("INVALID_LENGTH", "too long"));
    }
}
