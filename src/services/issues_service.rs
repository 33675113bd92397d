use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::{IssueSeverity, IssueStatus, Priority},
    db::models::api::error_codes,
    db::models::issue::{
        CreateIssueRequest, Issue, IssueChangeset, IssueListQuery, IssueTransitionRequest, NewIssue,
        UpdateIssueRequest,
    },
    db::models::project::Project,
    db::repositories::{issues::IssuesRepo, risks::RisksRepo, tasks::TasksRepo, users::UsersRepo},
    error::AppError,
    middleware::rbac::Permission,
    notifications::{Notifier, recipient_phone},
    services::{context::RequestContext, projects_service::{ProjectsService, ensure_member}},
    validation::issue::{validate_issue_description, validate_issue_title, validate_resolution},
};

pub struct IssuesService;

impl IssuesService {
    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        query: &IssueListQuery,
    ) -> Result<Vec<Issue>, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        Ok(IssuesRepo::list_by_project(
            conn,
            project_id,
            query.status,
            query.severity,
            query.assignee_id,
        )?)
    }

    pub fn get(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid, issue_id: Uuid) -> Result<Issue, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        find_issue(conn, project_id, issue_id)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        notifier: &Notifier,
        project_id: Uuid,
        req: &CreateIssueRequest,
    ) -> Result<Issue, AppError> {
        ctx.require(Permission::ManageIssues)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;
        validate_issue_title(&req.title)?;
        validate_issue_description(req.description.as_deref())?;
        check_links(conn, ctx, project_id, req.assignee_id, req.task_id, req.risk_id)?;

        let issue = IssuesRepo::insert(
            conn,
            &NewIssue {
                project_id,
                title: req.title.trim().to_string(),
                description: req.description.clone(),
                severity: req.severity.unwrap_or(IssueSeverity::Moderate),
                priority: req.priority.unwrap_or(Priority::Medium),
                status: IssueStatus::Open,
                reporter_id: ctx.user_id,
                assignee_id: req.assignee_id,
                task_id: req.task_id,
                risk_id: req.risk_id,
                due_date: req.due_date,
            },
        )?;

        if should_alert_assignee(None, &issue) {
            alert_assignee(conn, notifier, &project, &issue);
        }
        Ok(issue)
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        notifier: &Notifier,
        project_id: Uuid,
        issue_id: Uuid,
        req: &UpdateIssueRequest,
    ) -> Result<Issue, AppError> {
        ctx.require(Permission::ManageIssues)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;
        let before = find_issue(conn, project_id, issue_id)?;

        if let Some(title) = &req.title {
            validate_issue_title(title)?;
        }
        if let Some(description) = &req.description {
            validate_issue_description(description.as_deref())?;
        }
        check_links(
            conn,
            ctx,
            project_id,
            req.assignee_id.flatten(),
            req.task_id.flatten(),
            req.risk_id.flatten(),
        )?;

        let changes = IssueChangeset {
            title: req.title.as_ref().map(|t| t.trim().to_string()),
            description: req.description.clone(),
            severity: req.severity,
            priority: req.priority,
            assignee_id: req.assignee_id,
            task_id: req.task_id,
            risk_id: req.risk_id,
            due_date: req.due_date,
            updated_at: Some(Utc::now()),
            ..Default::default()
        };
        let issue = IssuesRepo::update(conn, issue_id, &changes)?;

        if should_alert_assignee(Some(&before), &issue) {
            alert_assignee(conn, notifier, &project, &issue);
        }
        Ok(issue)
    }

    /// Moves an issue through its workflow. Resolving needs a resolution
    /// text and stamps `resolved_at`; reopening clears both.
    pub fn transition(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        issue_id: Uuid,
        req: &IssueTransitionRequest,
    ) -> Result<Issue, AppError> {
        ctx.require(Permission::ManageIssues)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let issue = find_issue(conn, project_id, issue_id)?;
        let changes = transition_changes(&issue, req)?;
        Ok(IssuesRepo::update(conn, issue.id, &changes)?)
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid, issue_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::ManageIssues)?;
        ProjectsService::find(conn, ctx, project_id)?;
        find_issue(conn, project_id, issue_id)?;
        IssuesRepo::delete(conn, issue_id)?;
        Ok(())
    }
}

fn find_issue(conn: &mut PgConnection, project_id: Uuid, issue_id: Uuid) -> Result<Issue, AppError> {
    IssuesRepo::find_in_project(conn, project_id, issue_id)?.ok_or_else(|| AppError::not_found("Issue"))
}

fn check_links(
    conn: &mut PgConnection,
    ctx: &RequestContext,
    project_id: Uuid,
    assignee_id: Option<Uuid>,
    task_id: Option<Uuid>,
    risk_id: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(assignee) = assignee_id {
        ensure_member(conn, ctx, assignee)?;
    }
    if let Some(task) = task_id {
        if TasksRepo::find_in_project(conn, project_id, task)?.is_none() {
            return Err(AppError::validation_field("Task not found in project", "task_id", "INVALID_LINK"));
        }
    }
    if let Some(risk) = risk_id {
        if RisksRepo::find_in_project(conn, project_id, risk)?.is_none() {
            return Err(AppError::validation_field("Risk not found in project", "risk_id", "INVALID_LINK"));
        }
    }
    Ok(())
}

/// Changeset for moving `issue` to the requested status.
pub fn transition_changes(issue: &Issue, req: &IssueTransitionRequest) -> Result<IssueChangeset, AppError> {
    if !issue.status.can_transition_to(req.status) {
        return Err(AppError::conflict_with_code(
            format!("Cannot move issue from {} to {}", issue.status, req.status),
            Some("status".to_string()),
            error_codes::INVALID_TRANSITION,
        ));
    }

    let now = Utc::now();
    let mut changes = IssueChangeset {
        status: Some(req.status),
        updated_at: Some(now),
        ..Default::default()
    };
    match req.status {
        IssueStatus::Resolved => {
            validate_resolution(req.resolution.as_deref())?;
            changes.resolution = Some(req.resolution.as_ref().map(|r| r.trim().to_string()));
            changes.resolved_at = Some(Some(now));
        }
        IssueStatus::Open | IssueStatus::InProgress => {
            changes.resolution = Some(None);
            changes.resolved_at = Some(None);
        }
        IssueStatus::Closed => {}
    }
    Ok(changes)
}

/// A critical issue that just got its assignee, or an assigned issue that
/// just became critical.
pub fn should_alert_assignee(before: Option<&Issue>, after: &Issue) -> bool {
    if after.severity != IssueSeverity::Critical || after.assignee_id.is_none() {
        return false;
    }
    match before {
        None => true,
        Some(before) => before.assignee_id != after.assignee_id || before.severity != IssueSeverity::Critical,
    }
}

fn alert_assignee(conn: &mut PgConnection, notifier: &Notifier, project: &Project, issue: &Issue) {
    let Some(assignee) = issue.assignee_id else {
        return;
    };
    let phone = recipient_phone(assignee, UsersRepo::find_by_id(conn, assignee));
    notifier.notify(
        phone,
        format!("[{}] Critical issue assigned to you: {}", project.code, issue.title),
    );
}
