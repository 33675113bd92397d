use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::MemberRole,
    db::models::api::error_codes,
    db::models::organization::{
        CreateOrganizationRequest, NewOrganization, NewOrganizationMember, Organization, UpdateOrganizationRequest,
    },
    db::repositories::{members::MembersRepo, organizations::OrganizationsRepo, users::UsersRepo},
    error::AppError,
    middleware::rbac::Permission,
    services::context::RequestContext,
    utils::normalize_currency,
};

pub struct OrganizationsService;

impl OrganizationsService {
    /// Any authenticated user may create an organization; they become its
    /// owner and it becomes their current organization.
    pub fn create(
        conn: &mut PgConnection,
        user_id: Uuid,
        req: &CreateOrganizationRequest,
    ) -> Result<Organization, AppError> {
        if OrganizationsRepo::exists_slug(conn, &req.slug)? {
            return Err(AppError::conflict_with_code(
                "Organization slug already exists",
                Some("slug".to_string()),
                error_codes::ORGANIZATION_SLUG_EXISTS,
            ));
        }

        conn.transaction::<Organization, AppError, _>(|conn| {
            let organization = OrganizationsRepo::insert(
                conn,
                &NewOrganization {
                    name: req.name.trim().to_string(),
                    slug: req.slug.clone(),
                    default_currency: req
                        .default_currency
                        .as_deref()
                        .map(normalize_currency)
                        .unwrap_or_else(|| "USD".to_string()),
                },
            )?;
            MembersRepo::insert(
                conn,
                &NewOrganizationMember {
                    organization_id: organization.id,
                    user_id,
                    role: MemberRole::Owner,
                },
            )?;
            UsersRepo::set_current_organization(conn, user_id, Some(organization.id))?;
            Ok(organization)
        })
    }

    pub fn current(conn: &mut PgConnection, ctx: &RequestContext) -> Result<Organization, AppError> {
        OrganizationsRepo::find_by_id(conn, ctx.organization_id)?.ok_or_else(|| AppError::not_found("Organization"))
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &UpdateOrganizationRequest,
    ) -> Result<Organization, AppError> {
        ctx.require(Permission::ManageOrganization)?;
        Ok(OrganizationsRepo::update(
            conn,
            ctx.organization_id,
            req.name.as_ref().map(|n| n.trim().to_string()),
            req.default_currency.as_deref().map(normalize_currency),
        )?)
    }

    /// Owner only. Cascades to every row of the tenant.
    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext) -> Result<(), AppError> {
        if ctx.role != MemberRole::Owner {
            return Err(AppError::forbidden("Only an owner can delete the organization"));
        }
        let deleted = OrganizationsRepo::delete(conn, ctx.organization_id)?;
        if deleted == 0 {
            return Err(AppError::not_found("Organization"));
        }
        Ok(())
    }
}
