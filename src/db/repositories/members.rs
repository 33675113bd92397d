use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::MemberRole;
use crate::db::models::auth::User;
use crate::db::models::organization::{NewOrganizationMember, OrganizationMember};

pub struct MembersRepo;

impl MembersRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_member: &NewOrganizationMember,
    ) -> Result<OrganizationMember, diesel::result::Error> {
        diesel::insert_into(crate::schema::organization_members::table)
            .values(new_member)
            .returning(OrganizationMember::as_returning())
            .get_result(conn)
    }

    pub fn list_with_users(
        conn: &mut PgConnection,
        org: Uuid,
    ) -> Result<Vec<(OrganizationMember, User)>, diesel::result::Error> {
        use crate::schema::{organization_members as m, users as u};
        m::table
            .inner_join(u::table.on(u::id.eq(m::user_id)))
            .filter(m::organization_id.eq(org))
            .order(m::created_at.asc())
            .select((OrganizationMember::as_select(), User::as_select()))
            .load(conn)
    }

    pub fn find(
        conn: &mut PgConnection,
        org: Uuid,
        user: Uuid,
    ) -> Result<Option<OrganizationMember>, diesel::result::Error> {
        use crate::schema::organization_members::dsl::*;
        organization_members
            .filter(organization_id.eq(org))
            .filter(user_id.eq(user))
            .select(OrganizationMember::as_select())
            .first(conn)
            .optional()
    }

    /// Which of `users` belong to the organization.
    pub fn member_ids(
        conn: &mut PgConnection,
        org: Uuid,
        users: &[Uuid],
    ) -> Result<Vec<Uuid>, diesel::result::Error> {
        use crate::schema::organization_members::dsl::*;
        organization_members
            .filter(organization_id.eq(org))
            .filter(user_id.eq_any(users))
            .select(user_id)
            .load(conn)
    }

    pub fn count_owners(conn: &mut PgConnection, org: Uuid) -> Result<i64, diesel::result::Error> {
        use crate::schema::organization_members::dsl::*;
        organization_members
            .filter(organization_id.eq(org))
            .filter(role.eq(MemberRole::Owner))
            .count()
            .get_result(conn)
    }

    pub fn update_role(
        conn: &mut PgConnection,
        org: Uuid,
        user: Uuid,
        new_role: MemberRole,
    ) -> Result<OrganizationMember, diesel::result::Error> {
        use crate::schema::organization_members::dsl::*;
        diesel::update(
            organization_members
                .filter(organization_id.eq(org))
                .filter(user_id.eq(user)),
        )
        .set((role.eq(new_role), updated_at.eq(chrono::Utc::now())))
        .returning(OrganizationMember::as_returning())
        .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, org: Uuid, user: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::organization_members::dsl::*;
        diesel::delete(
            organization_members
                .filter(organization_id.eq(org))
                .filter(user_id.eq(user)),
        )
        .execute(conn)
    }
}
