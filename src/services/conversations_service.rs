use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::{
    db::enums::ConversationKind,
    db::models::api::error_codes,
    db::models::conversation::{
        Conversation, ConversationSummary, CreateConversationRequest, Message, MessageDelivery, MessageListQuery,
        NewConversation, NewMessage,
    },
    db::repositories::{conversations::ConversationsRepo, members::MembersRepo},
    error::AppError,
    middleware::rbac::Permission,
    services::{context::RequestContext, projects_service::ProjectsService},
    validation::conversation::validate_message_body,
};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct ConversationsService;

impl ConversationsService {
    /// A conversation of the caller's organization that the caller takes part in.
    pub fn find_joined(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        conversation_id: Uuid,
    ) -> Result<Conversation, AppError> {
        let conversation = ConversationsRepo::find_in_organization(conn, ctx.organization_id, conversation_id)?
            .ok_or_else(|| AppError::not_found("Conversation"))?;
        if ConversationsRepo::find_participant(conn, conversation.id, ctx.user_id)?.is_none() {
            return Err(AppError::not_found("Conversation"));
        }
        Ok(conversation)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateConversationRequest,
    ) -> Result<ConversationSummary, AppError> {
        ctx.require(Permission::Chat)?;

        let mut participants: Vec<Uuid> = req.participant_ids.iter().copied().filter(|id| *id != ctx.user_id).collect();
        participants.sort();
        participants.dedup();
        let members = MembersRepo::member_ids(conn, ctx.organization_id, &participants)?;
        if members.len() != participants.len() {
            return Err(AppError::validation_field(
                "Every participant must belong to the organization",
                "participant_ids",
                "NOT_A_MEMBER",
            ));
        }

        let (project_id, pair_key) = match req.kind {
            ConversationKind::Project => {
                let project_id = req.project_id.ok_or_else(|| {
                    AppError::validation_field("Project conversations need a project", "project_id", "REQUIRED")
                })?;
                ProjectsService::find(conn, ctx, project_id)?;
                (Some(project_id), None)
            }
            ConversationKind::Direct => {
                let [other] = participants.as_slice() else {
                    return Err(AppError::validation_field(
                        "Direct conversations have exactly one other participant",
                        "participant_ids",
                        "INVALID_PARTICIPANTS",
                    ));
                };
                if let Some(existing) = ConversationsRepo::find_direct(conn, ctx.organization_id, ctx.user_id, *other)? {
                    return Err(direct_exists(format!("Direct conversation {} already exists", existing.id)));
                }
                (None, Some(direct_key(ctx.user_id, *other)))
            }
        };

        participants.push(ctx.user_id);
        let conversation = conn.transaction::<Conversation, AppError, _>(|conn| {
            let conversation = ConversationsRepo::insert(
                conn,
                &NewConversation {
                    organization_id: ctx.organization_id,
                    kind: req.kind,
                    project_id,
                    title: req.title.clone(),
                    direct_key: pair_key.clone(),
                    created_by: ctx.user_id,
                },
            )
            .map_err(|e| match e {
                // A concurrent request created the same pair first.
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    direct_exists("Direct conversation already exists".to_string())
                }
                e => e.into(),
            })?;
            ConversationsRepo::add_participants(conn, conversation.id, &participants)?;
            Ok(conversation)
        })?;

        summarize(conn, ctx.user_id, conversation, None)
    }

    pub fn list_mine(conn: &mut PgConnection, ctx: &RequestContext) -> Result<Vec<ConversationSummary>, AppError> {
        ctx.require(Permission::Chat)?;
        ConversationsRepo::list_for_user(conn, ctx.organization_id, ctx.user_id)?
            .into_iter()
            .map(|(conversation, participant)| summarize(conn, ctx.user_id, conversation, participant.last_read_at))
            .collect()
    }

    /// Newest first.
    pub fn messages(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        conversation_id: Uuid,
        query: &MessageListQuery,
    ) -> Result<Vec<Message>, AppError> {
        ctx.require(Permission::Chat)?;
        let conversation = Self::find_joined(conn, ctx, conversation_id)?;
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Ok(ConversationsRepo::list_messages(conn, conversation.id, query.before, limit)?)
    }

    /// Persists a message and returns it with everyone who should see it.
    pub fn post_message(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        conversation_id: Uuid,
        body: &str,
    ) -> Result<MessageDelivery, AppError> {
        ctx.require(Permission::Chat)?;
        validate_message_body(body)?;
        let conversation = Self::find_joined(conn, ctx, conversation_id)?;

        let message = ConversationsRepo::insert_message(
            conn,
            &NewMessage {
                conversation_id: conversation.id,
                sender_id: ctx.user_id,
                body: body.trim().to_string(),
            },
        )?;
        // The sender has seen their own message.
        ConversationsRepo::mark_read(conn, conversation.id, ctx.user_id, message.created_at)?;

        Ok(MessageDelivery {
            recipient_ids: ConversationsRepo::participant_ids(conn, conversation.id)?,
            message,
        })
    }

    pub fn mark_read(conn: &mut PgConnection, ctx: &RequestContext, conversation_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::Chat)?;
        let conversation = Self::find_joined(conn, ctx, conversation_id)?;
        ConversationsRepo::mark_read(conn, conversation.id, ctx.user_id, Utc::now())?;
        Ok(())
    }

    pub fn add_participant(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<ConversationSummary, AppError> {
        ctx.require(Permission::Chat)?;
        let conversation = Self::find_joined(conn, ctx, conversation_id)?;
        if conversation.kind != ConversationKind::Project {
            return Err(AppError::validation_field(
                "Participants can only be added to project conversations",
                "user_id",
                "INVALID_CONVERSATION_KIND",
            ));
        }
        if MembersRepo::find(conn, ctx.organization_id, user_id)?.is_none() {
            return Err(AppError::validation_field(
                "User is not a member of this organization",
                "user_id",
                "NOT_A_MEMBER",
            ));
        }
        ConversationsRepo::add_participants(conn, conversation.id, &[user_id])?;
        let last_read = ConversationsRepo::find_participant(conn, conversation.id, ctx.user_id)?.and_then(|p| p.last_read_at);
        summarize(conn, ctx.user_id, conversation, last_read)
    }
}

/// Order-independent key of a direct conversation between `a` and `b`.
pub fn direct_key(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", low, high)
}

fn direct_exists(message: String) -> AppError {
    AppError::conflict_with_code(message, None, error_codes::DIRECT_CONVERSATION_EXISTS)
}

fn summarize(
    conn: &mut PgConnection,
    reader: Uuid,
    conversation: Conversation,
    last_read_at: Option<chrono::DateTime<Utc>>,
) -> Result<ConversationSummary, AppError> {
    Ok(ConversationSummary {
        participant_ids: ConversationsRepo::participant_ids(conn, conversation.id)?,
        unread_count: ConversationsRepo::unread_count(conn, conversation.id, reader, last_read_at)?,
        last_message: ConversationsRepo::last_message(conn, conversation.id)?,
        conversation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_key_ignores_participant_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(direct_key(a, b), direct_key(b, a));
        assert_ne!(direct_key(a, b), direct_key(a, Uuid::new_v4()));
        assert_eq!(direct_key(a, b).len(), 73);
    }
}
