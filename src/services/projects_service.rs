use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::{ProjectPhase, ProjectStatus},
    db::models::api::{PageParams, Pagination, error_codes},
    db::models::project::{
        CreateProjectRequest, NewProject, Project, ProjectChangeset, ProjectListQuery, ProjectListResponse,
        UpdateProjectRequest,
    },
    db::repositories::{members::MembersRepo, projects::ProjectsRepo},
    error::AppError,
    middleware::rbac::Permission,
    services::context::RequestContext,
    utils::normalize_currency,
    validation::project::{
        validate_budget, validate_create_project, validate_currency, validate_date_range, validate_project_name,
    },
};

pub struct ProjectsService;

impl ProjectsService {
    /// Loads a project of the caller's organization. Projects of other
    /// tenants are reported as missing.
    pub fn find(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<Project, AppError> {
        ProjectsRepo::find_by_id_in_organization(conn, ctx.organization_id, project_id)?
            .ok_or_else(|| AppError::not_found("Project"))
    }

    pub fn get(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<Project, AppError> {
        ctx.require(Permission::ViewAll)?;
        Self::find(conn, ctx, project_id)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateProjectRequest,
    ) -> Result<Project, AppError> {
        ctx.require(Permission::ManageProjects)?;

        let code = req.code.trim().to_string();
        let currency = normalize_currency(req.currency.as_deref().unwrap_or("USD"));
        let budget_cents = req.budget_cents.unwrap_or(0);
        validate_create_project(&code, &req.name, req.start_date, req.end_date, budget_cents, &currency)?;

        if ProjectsRepo::exists_code_in_organization(conn, ctx.organization_id, &code)? {
            return Err(AppError::conflict_with_code(
                "Project code already exists in this organization",
                Some("code".to_string()),
                error_codes::PROJECT_CODE_EXISTS,
            ));
        }
        if let Some(manager) = req.manager_id {
            ensure_member(conn, ctx, manager)?;
        }

        let new_project = NewProject {
            organization_id: ctx.organization_id,
            code,
            name: req.name.trim().to_string(),
            description: req.description.clone(),
            phase: req.phase.unwrap_or(ProjectPhase::Engineering),
            status: req.status.unwrap_or(ProjectStatus::Planned),
            start_date: req.start_date,
            end_date: req.end_date,
            budget_cents,
            currency,
            manager_id: req.manager_id,
            created_by: ctx.user_id,
        };
        Ok(ProjectsRepo::insert(conn, &new_project)?)
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        query: &ProjectListQuery,
    ) -> Result<(ProjectListResponse, Pagination), AppError> {
        ctx.require(Permission::ViewAll)?;
        let page = PageParams {
            page: query.page,
            per_page: query.per_page,
        };
        let (projects, total) = ProjectsRepo::list(
            conn,
            ctx.organization_id,
            query.search.as_deref(),
            query.status,
            page.per_page(),
            page.offset(),
        )?;
        Ok((
            ProjectListResponse {
                projects,
                total_count: total,
            },
            Pagination::new(page.page(), page.per_page(), total),
        ))
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        req: &UpdateProjectRequest,
    ) -> Result<Project, AppError> {
        ctx.require(Permission::ManageProjects)?;
        let existing = Self::find(conn, ctx, project_id)?;

        if let Some(name) = &req.name {
            validate_project_name(name)?;
        }
        if let Some(budget) = req.budget_cents {
            validate_budget(budget)?;
        }
        let currency = req.currency.as_deref().map(normalize_currency);
        if let Some(currency) = &currency {
            validate_currency(currency)?;
        }
        let start = req.start_date.unwrap_or(existing.start_date);
        let end = req.end_date.unwrap_or(existing.end_date);
        validate_date_range(start, end)?;
        if let Some(Some(manager)) = req.manager_id {
            ensure_member(conn, ctx, manager)?;
        }

        let changes = ProjectChangeset {
            name: req.name.as_ref().map(|n| n.trim().to_string()),
            description: req.description.clone(),
            phase: req.phase,
            status: req.status,
            start_date: req.start_date,
            end_date: req.end_date,
            budget_cents: req.budget_cents,
            currency,
            manager_id: req.manager_id,
            updated_at: Some(Utc::now()),
        };
        Ok(ProjectsRepo::update(conn, project_id, &changes)?)
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::ManageProjects)?;
        Self::find(conn, ctx, project_id)?;
        ProjectsRepo::delete_by_id(conn, project_id)?;
        Ok(())
    }
}

/// Fails unless `user_id` belongs to the caller's organization.
pub(crate) fn ensure_member(conn: &mut PgConnection, ctx: &RequestContext, user_id: Uuid) -> Result<(), AppError> {
    if MembersRepo::find(conn, ctx.organization_id, user_id)?.is_none() {
        return Err(AppError::validation_field(
            "User is not a member of this organization",
            "user_id",
            "NOT_A_MEMBER",
        ));
    }
    Ok(())
}
