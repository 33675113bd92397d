use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::MemberRole,
    db::models::api::error_codes,
    db::models::organization::{AddMemberRequest, MemberInfo, NewOrganizationMember, OrganizationMember},
    db::repositories::{members::MembersRepo, organizations::OrganizationsRepo, users::UsersRepo},
    error::AppError,
    middleware::rbac::Permission,
    services::context::RequestContext,
};

pub struct MembersService;

impl MembersService {
    pub fn list(conn: &mut PgConnection, ctx: &RequestContext) -> Result<Vec<MemberInfo>, AppError> {
        ctx.require(Permission::ViewAll)?;
        let members = MembersRepo::list_with_users(conn, ctx.organization_id)?;
        Ok(members
            .into_iter()
            .map(|(member, user)| MemberInfo {
                user_id: user.id,
                name: user.name,
                username: user.username,
                email: user.email,
                role: member.role,
                joined_at: member.created_at,
            })
            .collect())
    }

    pub fn add(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &AddMemberRequest,
    ) -> Result<OrganizationMember, AppError> {
        ctx.require(Permission::ManageMembers)?;
        guard_owner_grant(ctx, req.role)?;

        let user = UsersRepo::find_by_email(conn, &req.email)?.ok_or_else(|| AppError::not_found("User"))?;
        if MembersRepo::find(conn, ctx.organization_id, user.id)?.is_some() {
            return Err(AppError::conflict_with_code(
                "User is already a member of this organization",
                Some("email".to_string()),
                error_codes::MEMBER_EXISTS,
            ));
        }

        let member = MembersRepo::insert(
            conn,
            &NewOrganizationMember {
                organization_id: ctx.organization_id,
                user_id: user.id,
                role: req.role,
            },
        )?;
        if user.current_organization_id.is_none() {
            UsersRepo::set_current_organization(conn, user.id, Some(ctx.organization_id))?;
        }
        Ok(member)
    }

    pub fn change_role(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<OrganizationMember, AppError> {
        ctx.require(Permission::ManageMembers)?;
        guard_owner_grant(ctx, role)?;

        conn.transaction::<OrganizationMember, AppError, _>(|conn| {
            OrganizationsRepo::lock(conn, ctx.organization_id)?;
            let member = MembersRepo::find(conn, ctx.organization_id, user_id)?
                .ok_or_else(|| AppError::not_found("Member"))?;
            if member.role == MemberRole::Owner && role != MemberRole::Owner {
                guard_owner_grant(ctx, member.role)?;
                ensure_not_last_owner(conn, ctx.organization_id)?;
            }
            Ok(MembersRepo::update_role(conn, ctx.organization_id, user_id, role)?)
        })
    }

    /// Members may always leave; removing others needs `ManageMembers`.
    pub fn remove(conn: &mut PgConnection, ctx: &RequestContext, user_id: Uuid) -> Result<(), AppError> {
        if user_id != ctx.user_id {
            ctx.require(Permission::ManageMembers)?;
        }

        conn.transaction::<(), AppError, _>(|conn| {
            OrganizationsRepo::lock(conn, ctx.organization_id)?;
            let member = MembersRepo::find(conn, ctx.organization_id, user_id)?
                .ok_or_else(|| AppError::not_found("Member"))?;
            if member.role == MemberRole::Owner {
                if user_id != ctx.user_id {
                    guard_owner_grant(ctx, member.role)?;
                }
                ensure_not_last_owner(conn, ctx.organization_id)?;
            }
            MembersRepo::delete(conn, ctx.organization_id, user_id)?;

            if let Some(user) = UsersRepo::find_by_id(conn, user_id)? {
                if user.current_organization_id == Some(ctx.organization_id) {
                    UsersRepo::set_current_organization(conn, user_id, None)?;
                }
            }
            Ok(())
        })
    }
}

/// Only owners hand out or take away the owner role.
fn guard_owner_grant(ctx: &RequestContext, role: MemberRole) -> Result<(), AppError> {
    if role == MemberRole::Owner && ctx.role != MemberRole::Owner {
        return Err(AppError::forbidden("Only an owner can manage owners"));
    }
    Ok(())
}

/// Callers hold the organization row lock so concurrent demotions count the
/// same owners.
fn ensure_not_last_owner(conn: &mut PgConnection, organization_id: Uuid) -> Result<(), AppError> {
    if MembersRepo::count_owners(conn, organization_id)? <= 1 {
        return Err(AppError::conflict_with_code(
            "The last owner cannot be removed or demoted",
            None,
            error_codes::LAST_OWNER,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: MemberRole) -> RequestContext {
        RequestContext {
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn admins_cannot_grant_owner() {
        assert!(guard_owner_grant(&ctx(MemberRole::Admin), MemberRole::Owner).is_err());
        assert!(guard_owner_grant(&ctx(MemberRole::Admin), MemberRole::Member).is_ok());
        assert!(guard_owner_grant(&ctx(MemberRole::Owner), MemberRole::Owner).is_ok());
    }
}
