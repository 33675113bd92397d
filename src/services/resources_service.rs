use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::models::api::error_codes,
    db::models::resource::{
        Assignment, CreateAssignmentRequest, CreateResourceRequest, NewAssignment, NewResource, Resource,
        ResourceChangeset, ResourceListQuery, ResourceUtilization, UpdateResourceRequest, UtilizationQuery,
    },
    db::repositories::{assignments::AssignmentsRepo, resources::ResourcesRepo},
    error::AppError,
    middleware::rbac::Permission,
    planning::allocation::{AssignmentSpan, utilization, validate_range},
    services::{context::RequestContext, projects_service::ensure_member, tasks_service::TasksService},
    utils::normalize_currency,
    validation::project::validate_currency,
    validation::resource::{
        validate_allocation_percent, validate_capacity_hours, validate_hourly_rate, validate_resource_name,
    },
};

const DEFAULT_CAPACITY_HOURS: f64 = 8.0;

pub struct ResourcesService;

impl ResourcesService {
    pub fn find(conn: &mut PgConnection, ctx: &RequestContext, resource_id: Uuid) -> Result<Resource, AppError> {
        ResourcesRepo::find_in_organization(conn, ctx.organization_id, resource_id)?
            .ok_or_else(|| AppError::not_found("Resource"))
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        query: &ResourceListQuery,
    ) -> Result<Vec<Resource>, AppError> {
        ctx.require(Permission::ViewAll)?;
        Ok(ResourcesRepo::list(
            conn,
            ctx.organization_id,
            query.kind,
            query.include_inactive.unwrap_or(false),
        )?)
    }

    pub fn get(conn: &mut PgConnection, ctx: &RequestContext, resource_id: Uuid) -> Result<Resource, AppError> {
        ctx.require(Permission::ViewAll)?;
        Self::find(conn, ctx, resource_id)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateResourceRequest,
    ) -> Result<Resource, AppError> {
        ctx.require(Permission::ManageResources)?;
        validate_resource_name(&req.name)?;
        let capacity_hours = req.capacity_hours.unwrap_or(DEFAULT_CAPACITY_HOURS);
        validate_capacity_hours(capacity_hours)?;
        let hourly_rate_cents = req.hourly_rate_cents.unwrap_or(0);
        validate_hourly_rate(hourly_rate_cents)?;
        let currency = normalize_currency(req.currency.as_deref().unwrap_or("USD"));
        validate_currency(&currency)?;
        if let Some(user_id) = req.user_id {
            ensure_member(conn, ctx, user_id)?;
        }

        Ok(ResourcesRepo::insert(
            conn,
            &NewResource {
                organization_id: ctx.organization_id,
                kind: req.kind,
                name: req.name.trim().to_string(),
                user_id: req.user_id,
                hourly_rate_cents,
                currency,
                capacity_hours,
            },
        )?)
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        resource_id: Uuid,
        req: &UpdateResourceRequest,
    ) -> Result<Resource, AppError> {
        ctx.require(Permission::ManageResources)?;
        Self::find(conn, ctx, resource_id)?;

        if let Some(name) = &req.name {
            validate_resource_name(name)?;
        }
        if let Some(capacity) = req.capacity_hours {
            validate_capacity_hours(capacity)?;
        }
        if let Some(rate) = req.hourly_rate_cents {
            validate_hourly_rate(rate)?;
        }
        let currency = req.currency.as_deref().map(normalize_currency);
        if let Some(currency) = &currency {
            validate_currency(currency)?;
        }
        if let Some(Some(user_id)) = req.user_id {
            ensure_member(conn, ctx, user_id)?;
        }

        let changes = ResourceChangeset {
            name: req.name.as_ref().map(|n| n.trim().to_string()),
            user_id: req.user_id,
            hourly_rate_cents: req.hourly_rate_cents,
            currency,
            capacity_hours: req.capacity_hours,
            is_active: req.is_active,
            updated_at: Some(Utc::now()),
        };
        Ok(ResourcesRepo::update(conn, resource_id, &changes)?)
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, resource_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::ManageResources)?;
        Self::find(conn, ctx, resource_id)?;
        ResourcesRepo::delete(conn, resource_id)?;
        Ok(())
    }

    pub fn list_assignments(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        task_id: Uuid,
    ) -> Result<Vec<Assignment>, AppError> {
        ctx.require(Permission::ViewAll)?;
        let task = TasksService::find(conn, ctx, task_id)?;
        Ok(AssignmentsRepo::list_by_task(conn, task.id)?)
    }

    pub fn assign(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        task_id: Uuid,
        req: &CreateAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        ctx.require(Permission::ManageResources)?;
        let task = TasksService::find(conn, ctx, task_id)?;
        let resource = Self::find(conn, ctx, req.resource_id)?;
        let allocation_percent = req.allocation_percent.unwrap_or(100);
        validate_allocation_percent(allocation_percent)?;

        if AssignmentsRepo::exists(conn, task.id, resource.id)? {
            return Err(AppError::conflict_with_code(
                "Resource is already assigned to this task",
                Some("resource_id".to_string()),
                error_codes::ASSIGNMENT_EXISTS,
            ));
        }

        Ok(AssignmentsRepo::insert(
            conn,
            &NewAssignment {
                task_id: task.id,
                resource_id: resource.id,
                allocation_percent,
            },
        )?)
    }

    pub fn unassign(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        task_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<(), AppError> {
        ctx.require(Permission::ManageResources)?;
        let task = TasksService::find(conn, ctx, task_id)?;
        if AssignmentsRepo::delete(conn, task.id, assignment_id)? == 0 {
            return Err(AppError::not_found("Assignment"));
        }
        Ok(())
    }

    /// Per-day load of every active resource over `[from, to]`.
    pub fn utilization(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        query: &UtilizationQuery,
    ) -> Result<Vec<ResourceUtilization>, AppError> {
        ctx.require(Permission::ViewAll)?;
        validate_range(query.from, query.to)?;

        let resources = ResourcesRepo::list(conn, ctx.organization_id, None, false)?;
        let mut report = Vec::with_capacity(resources.len());
        for resource in resources {
            report.push(Self::resource_utilization(conn, &resource, query)?);
        }
        Ok(report)
    }

    pub fn utilization_for(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        resource_id: Uuid,
        query: &UtilizationQuery,
    ) -> Result<ResourceUtilization, AppError> {
        ctx.require(Permission::ViewAll)?;
        let resource = Self::find(conn, ctx, resource_id)?;
        Self::resource_utilization(conn, &resource, query)
    }

    fn resource_utilization(
        conn: &mut PgConnection,
        resource: &Resource,
        query: &UtilizationQuery,
    ) -> Result<ResourceUtilization, AppError> {
        let spans: Vec<AssignmentSpan> = AssignmentsRepo::spans_for_resource(conn, resource.id, query.from, query.to)?
            .into_iter()
            .map(|(allocation_percent, start, end)| AssignmentSpan {
                allocation_percent,
                start,
                end,
            })
            .collect();
        Ok(utilization(
            resource.id,
            &resource.name,
            resource.capacity_hours,
            &spans,
            query.from,
            query.to,
        )?)
    }
}
