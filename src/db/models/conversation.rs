use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::ConversationKind;

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Conversation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: ConversationKind,
    pub project_id: Option<Uuid>,
    pub title: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::conversations)]
pub struct NewConversation {
    pub organization_id: Uuid,
    pub kind: ConversationKind,
    pub project_id: Option<Uuid>,
    pub title: Option<String>,
    pub direct_key: Option<String>,
    pub created_by: Uuid,
}

#[derive(Queryable, Selectable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::conversation_participants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConversationParticipant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::conversation_participants)]
pub struct NewConversationParticipant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
}

#[derive(Deserialize)]
pub struct CreateConversationRequest {
    pub kind: ConversationKind,
    pub project_id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct AddParticipantRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct MessageListQuery {
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participant_ids: Vec<Uuid>,
    pub unread_count: i64,
    pub last_message: Option<Message>,
}

/// A persisted message together with the users that should receive it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageDelivery {
    pub message: Message,
    pub recipient_ids: Vec<Uuid>,
}
