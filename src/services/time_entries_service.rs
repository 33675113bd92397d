use chrono::{Datelike, Duration, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::TimeEntryStatus,
    db::models::api::error_codes,
    db::models::time_entry::{
        CreateTimeEntryRequest, NewTimeEntry, TimeEntry, TimeEntryChangeset, TimeEntryListQuery, Timesheet,
        TimesheetDay, TimesheetQuery, UpdateTimeEntryRequest,
    },
    db::repositories::{
        time_entries::{TimeEntriesRepo, TimeEntryFilter},
        users::UsersRepo,
    },
    error::AppError,
    middleware::rbac::Permission,
    planning::allocation::round2,
    services::{context::RequestContext, resources_service::ResourcesService, tasks_service::TasksService},
    validation::time_entry::{validate_daily_total, validate_hours, validate_work_date},
};

pub struct TimeEntriesService;

impl TimeEntriesService {
    fn find(conn: &mut PgConnection, ctx: &RequestContext, entry_id: Uuid) -> Result<TimeEntry, AppError> {
        TimeEntriesRepo::find_in_organization(conn, ctx.organization_id, entry_id)?
            .ok_or_else(|| AppError::not_found("Time entry"))
    }

    /// Entries the caller may edit: their own, still in draft or rejected.
    fn find_editable(conn: &mut PgConnection, ctx: &RequestContext, entry_id: Uuid) -> Result<TimeEntry, AppError> {
        let entry = Self::find(conn, ctx, entry_id)?;
        if entry.user_id != ctx.user_id {
            return Err(AppError::forbidden("Only the owner can change a time entry"));
        }
        if !entry.status.is_editable() {
            return Err(invalid_state(entry.status));
        }
        Ok(entry)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateTimeEntryRequest,
    ) -> Result<TimeEntry, AppError> {
        ctx.require(Permission::LogTime)?;
        validate_hours(req.hours)?;
        validate_work_date(req.work_date)?;
        let task = TasksService::find(conn, ctx, req.task_id)?;
        if let Some(resource_id) = req.resource_id {
            ResourcesService::find(conn, ctx, resource_id)?;
        }

        conn.transaction::<TimeEntry, AppError, _>(|conn| {
            // Serializes the daily cap check per user.
            UsersRepo::lock(conn, ctx.user_id)?;
            let logged = TimeEntriesRepo::hours_on_date(conn, ctx.user_id, req.work_date, None)?;
            validate_daily_total(logged, req.hours)?;

            Ok(TimeEntriesRepo::insert(
                conn,
                &NewTimeEntry {
                    organization_id: ctx.organization_id,
                    user_id: ctx.user_id,
                    task_id: task.id,
                    resource_id: req.resource_id,
                    work_date: req.work_date,
                    hours: req.hours,
                    billable: req.billable.unwrap_or(true),
                    notes: req.notes.clone(),
                    status: TimeEntryStatus::Draft,
                },
            )?)
        })
    }

    /// Approvers see every entry; everyone else only their own.
    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        query: &TimeEntryListQuery,
    ) -> Result<Vec<TimeEntry>, AppError> {
        ctx.require(Permission::ViewAll)?;
        let user_id = if ctx.can(Permission::ApproveTime) {
            query.user_id
        } else {
            Some(ctx.user_id)
        };
        let filter = TimeEntryFilter {
            user_id,
            project_id: query.project_id,
            status: query.status,
            from: query.from,
            to: query.to,
        };
        Ok(TimeEntriesRepo::list(conn, ctx.organization_id, &filter)?)
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        entry_id: Uuid,
        req: &UpdateTimeEntryRequest,
    ) -> Result<TimeEntry, AppError> {
        let entry = Self::find_editable(conn, ctx, entry_id)?;

        let hours = req.hours.unwrap_or(entry.hours);
        let work_date = req.work_date.unwrap_or(entry.work_date);
        validate_hours(hours)?;
        validate_work_date(work_date)?;
        if let Some(task_id) = req.task_id {
            TasksService::find(conn, ctx, task_id)?;
        }
        if let Some(Some(resource_id)) = req.resource_id {
            ResourcesService::find(conn, ctx, resource_id)?;
        }

        conn.transaction::<TimeEntry, AppError, _>(|conn| {
            UsersRepo::lock(conn, entry.user_id)?;
            let logged = TimeEntriesRepo::hours_on_date(conn, entry.user_id, work_date, Some(entry.id))?;
            validate_daily_total(logged, hours)?;

            let changes = TimeEntryChangeset {
                task_id: req.task_id,
                resource_id: req.resource_id,
                work_date: req.work_date,
                hours: req.hours,
                billable: req.billable,
                notes: req.notes.clone(),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            Ok(TimeEntriesRepo::update(conn, entry.id, &changes)?)
        })
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, entry_id: Uuid) -> Result<(), AppError> {
        let entry = Self::find_editable(conn, ctx, entry_id)?;
        TimeEntriesRepo::delete(conn, entry.id)?;
        Ok(())
    }

    pub fn submit(conn: &mut PgConnection, ctx: &RequestContext, entry_id: Uuid) -> Result<TimeEntry, AppError> {
        let entry = Self::find_editable(conn, ctx, entry_id)?;
        let changes = TimeEntryChangeset {
            status: Some(TimeEntryStatus::Submitted),
            reviewed_by: Some(None),
            reviewed_at: Some(None),
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        Ok(TimeEntriesRepo::update(conn, entry.id, &changes)?)
    }

    pub fn review(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        entry_id: Uuid,
        approve: bool,
    ) -> Result<TimeEntry, AppError> {
        ctx.require(Permission::ApproveTime)?;
        let entry = Self::find(conn, ctx, entry_id)?;
        if entry.user_id == ctx.user_id {
            return Err(AppError::Validation {
                message: "You cannot review your own time entries".to_string(),
                field: None,
                code: Some(error_codes::SELF_APPROVAL.to_string()),
            });
        }
        if entry.status != TimeEntryStatus::Submitted {
            return Err(invalid_state(entry.status));
        }

        let now = Utc::now();
        let changes = TimeEntryChangeset {
            status: Some(if approve {
                TimeEntryStatus::Approved
            } else {
                TimeEntryStatus::Rejected
            }),
            reviewed_by: Some(Some(ctx.user_id)),
            reviewed_at: Some(Some(now)),
            updated_at: Some(now),
            ..Default::default()
        };
        Ok(TimeEntriesRepo::update(conn, entry.id, &changes)?)
    }

    pub fn timesheet(conn: &mut PgConnection, ctx: &RequestContext, query: &TimesheetQuery) -> Result<Timesheet, AppError> {
        let user_id = query.user_id.unwrap_or(ctx.user_id);
        if user_id == ctx.user_id {
            ctx.require(Permission::ViewAll)?;
        } else {
            ctx.require(Permission::ApproveTime)?;
        }

        let week_start = iso_week_start(query.week_of.unwrap_or_else(|| Utc::now().date_naive()));
        let filter = TimeEntryFilter {
            user_id: Some(user_id),
            from: Some(week_start),
            to: Some(week_start + Duration::days(6)),
            ..Default::default()
        };
        let entries = TimeEntriesRepo::list(conn, ctx.organization_id, &filter)?;
        Ok(build_timesheet(user_id, week_start, entries))
    }
}

fn invalid_state(status: TimeEntryStatus) -> AppError {
    AppError::conflict_with_code(
        format!("Time entry is {}", status),
        Some("status".to_string()),
        error_codes::INVALID_STATE,
    )
}

/// Monday of the ISO week containing `date`.
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Seven days from `week_start` with per-day and total hours.
pub fn build_timesheet(user_id: Uuid, week_start: NaiveDate, mut entries: Vec<TimeEntry>) -> Timesheet {
    let week_end = week_start + Duration::days(6);
    entries.retain(|e| e.user_id == user_id && e.work_date >= week_start && e.work_date <= week_end);
    entries.sort_by(|a, b| a.work_date.cmp(&b.work_date).then(a.created_at.cmp(&b.created_at)));

    let days = week_start
        .iter_days()
        .take(7)
        .map(|date| TimesheetDay {
            date,
            hours: round2(entries.iter().filter(|e| e.work_date == date).map(|e| e.hours).sum()),
        })
        .collect::<Vec<_>>();
    let total_hours = round2(days.iter().map(|d| d.hours).sum());
    let billable_hours = round2(entries.iter().filter(|e| e.billable).map(|e| e.hours).sum());

    Timesheet {
        user_id,
        week_start,
        week_end,
        days,
        total_hours,
        billable_hours,
        entries,
    }
}
