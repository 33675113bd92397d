use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::ConversationKind;
use crate::db::models::conversation::{
    Conversation, ConversationParticipant, Message, NewConversation, NewConversationParticipant,
    NewMessage,
};

pub struct ConversationsRepo;

impl ConversationsRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_conversation: &NewConversation,
    ) -> Result<Conversation, diesel::result::Error> {
        diesel::insert_into(crate::schema::conversations::table)
            .values(new_conversation)
            .returning(Conversation::as_returning())
            .get_result(conn)
    }

    pub fn add_participants(
        conn: &mut PgConnection,
        conversation: Uuid,
        users: &[Uuid],
    ) -> Result<usize, diesel::result::Error> {
        let rows: Vec<NewConversationParticipant> = users
            .iter()
            .map(|user| NewConversationParticipant {
                conversation_id: conversation,
                user_id: *user,
            })
            .collect();
        diesel::insert_into(crate::schema::conversation_participants::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(conn)
    }

    pub fn find_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        conversation_id: Uuid,
    ) -> Result<Option<Conversation>, diesel::result::Error> {
        use crate::schema::conversations::dsl::*;
        conversations
            .filter(id.eq(conversation_id))
            .filter(organization_id.eq(org))
            .select(Conversation::as_select())
            .first(conn)
            .optional()
    }

    /// The direct conversation whose participants are exactly `a` and `b`.
    pub fn find_direct(
        conn: &mut PgConnection,
        org: Uuid,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<Conversation>, diesel::result::Error> {
        use crate::schema::{conversation_participants as cp, conversations as c};
        let candidates: Vec<Conversation> = c::table
            .inner_join(cp::table)
            .filter(c::organization_id.eq(org))
            .filter(c::kind.eq(ConversationKind::Direct))
            .filter(cp::user_id.eq(a))
            .select(Conversation::as_select())
            .load(conn)?;

        let mut wanted = [a, b];
        wanted.sort();
        for conversation in candidates {
            let mut members = Self::participant_ids(conn, conversation.id)?;
            members.sort();
            if members == wanted {
                return Ok(Some(conversation));
            }
        }
        Ok(None)
    }

    /// Conversations the user takes part in, with their read marker.
    pub fn list_for_user(
        conn: &mut PgConnection,
        org: Uuid,
        user: Uuid,
    ) -> Result<Vec<(Conversation, ConversationParticipant)>, diesel::result::Error> {
        use crate::schema::{conversation_participants as cp, conversations as c};
        c::table
            .inner_join(cp::table)
            .filter(c::organization_id.eq(org))
            .filter(cp::user_id.eq(user))
            .order(c::updated_at.desc())
            .select((Conversation::as_select(), ConversationParticipant::as_select()))
            .load(conn)
    }

    pub fn participant_ids(conn: &mut PgConnection, conversation: Uuid) -> Result<Vec<Uuid>, diesel::result::Error> {
        use crate::schema::conversation_participants::dsl::*;
        conversation_participants
            .filter(conversation_id.eq(conversation))
            .order(joined_at.asc())
            .select(user_id)
            .load(conn)
    }

    pub fn find_participant(
        conn: &mut PgConnection,
        conversation: Uuid,
        user: Uuid,
    ) -> Result<Option<ConversationParticipant>, diesel::result::Error> {
        use crate::schema::conversation_participants::dsl::*;
        conversation_participants
            .filter(conversation_id.eq(conversation))
            .filter(user_id.eq(user))
            .select(ConversationParticipant::as_select())
            .first(conn)
            .optional()
    }

    pub fn insert_message(conn: &mut PgConnection, new_message: &NewMessage) -> Result<Message, diesel::result::Error> {
        let message: Message = diesel::insert_into(crate::schema::messages::table)
            .values(new_message)
            .returning(Message::as_returning())
            .get_result(conn)?;

        use crate::schema::conversations::dsl::*;
        diesel::update(conversations.filter(id.eq(new_message.conversation_id)))
            .set(updated_at.eq(message.created_at))
            .execute(conn)?;
        Ok(message)
    }

    /// Newest first, strictly older than `before` when given.
    pub fn list_messages(
        conn: &mut PgConnection,
        conversation: Uuid,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, diesel::result::Error> {
        use crate::schema::messages::dsl as m;
        let mut query = m::messages.filter(m::conversation_id.eq(conversation)).into_boxed();
        if let Some(cursor) = before {
            query = query.filter(m::created_at.lt(cursor));
        }
        query
            .order((m::created_at.desc(), m::id.desc()))
            .limit(limit)
            .select(Message::as_select())
            .load(conn)
    }

    pub fn last_message(conn: &mut PgConnection, conversation: Uuid) -> Result<Option<Message>, diesel::result::Error> {
        Ok(Self::list_messages(conn, conversation, None, 1)?.into_iter().next())
    }

    /// Messages from others newer than the reader's marker.
    pub fn unread_count(
        conn: &mut PgConnection,
        conversation: Uuid,
        reader: Uuid,
        last_read: Option<DateTime<Utc>>,
    ) -> Result<i64, diesel::result::Error> {
        use crate::schema::messages::dsl as m;
        let mut query = m::messages
            .filter(m::conversation_id.eq(conversation))
            .filter(m::sender_id.ne(reader))
            .into_boxed();
        if let Some(marker) = last_read {
            query = query.filter(m::created_at.gt(marker));
        }
        query.count().get_result(conn)
    }

    pub fn mark_read(
        conn: &mut PgConnection,
        conversation: Uuid,
        user: Uuid,
        at: DateTime<Utc>,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::conversation_participants::dsl::*;
        diesel::update(
            conversation_participants
                .filter(conversation_id.eq(conversation))
                .filter(user_id.eq(user)),
        )
        .set(last_read_at.eq(Some(at)))
        .execute(conn)
    }
}
