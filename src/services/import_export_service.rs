use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::enums::{Priority, TaskStatus},
    db::models::api::{ErrorDetail, error_codes},
    db::models::import_export::{
        BUNDLE_FORMAT_VERSION, BundleImportResult, ImportBundleRequest, ProjectBundle, RiskCsvRow, TASK_CSV_HEADERS,
        TaskCsvRow, TaskImportResult,
    },
    db::models::issue::{IssueChangeset, NewIssue},
    db::models::project::NewProject,
    db::models::risk::NewRisk,
    db::models::task::{NewTask, NewTaskDependency, Task, TaskDependency},
    db::repositories::{
        dependencies::DependenciesRepo, issues::IssuesRepo, members::MembersRepo, projects::ProjectsRepo,
        risks::RisksRepo, tasks::TasksRepo,
    },
    error::AppError,
    middleware::rbac::Permission,
    planning::schedule::{parent_creates_cycle, would_create_cycle},
    services::{context::RequestContext, projects_service::ProjectsService, tasks_service::effective_progress},
    validation::project::{validate_date_range, validate_project_code, validate_project_name},
    validation::task::{
        validate_estimated_hours, validate_lag_days, validate_progress, validate_task_name, validate_wbs_code,
    },
};

pub const MAX_IMPORT_ROWS: usize = 5_000;

pub struct ImportExportService;

impl ImportExportService {
    pub fn export_tasks_csv(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<String, AppError> {
        ctx.require(Permission::ImportExport)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let tasks = TasksRepo::list_by_project(conn, project_id)?;
        write_tasks_csv(&tasks)
    }

    /// Imports every row or none. Row problems come back together as one
    /// `InvalidRows` error.
    pub fn import_tasks_csv(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        data: &str,
    ) -> Result<TaskImportResult, AppError> {
        ctx.require(Permission::ImportExport)?;
        ProjectsService::find(conn, ctx, project_id)?;

        let rows = parse_tasks_csv(data).map_err(invalid_rows)?;

        let imported = conn.transaction::<usize, AppError, _>(|conn| {
            let existing = TasksRepo::list_by_project(conn, project_id)?;
            let new_tasks = plan_task_import(project_id, ctx.user_id, &existing, &rows).map_err(invalid_rows)?;
            Ok(TasksRepo::insert_many(conn, &new_tasks)?)
        })?;

        info!(project_id = %project_id, imported, "Tasks imported from CSV");
        Ok(TaskImportResult { imported })
    }

    pub fn export_risks_csv(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<String, AppError> {
        ctx.require(Permission::ImportExport)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let risks = RisksRepo::list_by_project(conn, project_id, None)?;

        let rows: Vec<RiskCsvRow> = risks
            .iter()
            .map(|risk| RiskCsvRow {
                title: risk.title.clone(),
                category: risk.category.clone(),
                probability: risk.probability,
                impact: risk.impact,
                score: risk.score(),
                level: risk.level().to_string(),
                status: risk.status.to_string(),
                owner_id: risk.owner_id.map(|id| id.to_string()),
                due_date: risk.due_date.map(|d| d.to_string()),
                mitigation_plan: risk.mitigation_plan.clone(),
            })
            .collect();

        write_csv(
            &[
                "title",
                "category",
                "probability",
                "impact",
                "score",
                "level",
                "status",
                "owner_id",
                "due_date",
                "mitigation_plan",
            ],
            &rows,
        )
    }

    pub fn export_bundle(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<ProjectBundle, AppError> {
        ctx.require(Permission::ImportExport)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;

        Ok(ProjectBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            exported_at: Utc::now(),
            tasks: TasksRepo::list_by_project(conn, project.id)?,
            dependencies: DependenciesRepo::list_by_project(conn, project.id)?,
            risks: RisksRepo::list_by_project(conn, project.id, None)?,
            issues: IssuesRepo::list_by_project(conn, project.id, None, None, None)?,
            project,
        })
    }

    /// Recreates a bundle as a new project in the caller's organization.
    /// All rows get fresh ids; user references that are not members of the
    /// organization are dropped.
    pub fn import_bundle(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &ImportBundleRequest,
    ) -> Result<BundleImportResult, AppError> {
        ctx.require(Permission::ImportExport)?;
        ctx.require(Permission::ManageProjects)?;

        let bundle = &req.bundle;
        if bundle.format_version != BUNDLE_FORMAT_VERSION {
            return Err(AppError::validation_field(
                format!("Unsupported bundle format version {}", bundle.format_version),
                "format_version",
                "UNSUPPORTED_VERSION",
            ));
        }

        let code = req.code.trim().to_string();
        let name = req.name.clone().unwrap_or_else(|| bundle.project.name.clone());
        validate_project_code(&code)?;
        validate_project_name(&name)?;

        if ProjectsRepo::exists_code_in_organization(conn, ctx.organization_id, &code)? {
            return Err(AppError::conflict_with_code(
                "Project code already exists",
                Some("code".to_string()),
                error_codes::PROJECT_CODE_EXISTS,
            ));
        }

        check_bundle_tasks(&bundle.tasks, &bundle.dependencies)?;

        let referenced: Vec<Uuid> = bundle
            .project
            .manager_id
            .into_iter()
            .chain(bundle.risks.iter().filter_map(|r| r.owner_id))
            .chain(bundle.issues.iter().filter_map(|i| i.assignee_id))
            .collect();
        let members: HashSet<Uuid> = MembersRepo::member_ids(conn, ctx.organization_id, &referenced)?
            .into_iter()
            .collect();
        let keep_member = |id: Option<Uuid>| id.filter(|id| members.contains(id));

        let result = conn.transaction::<BundleImportResult, AppError, _>(|conn| {
            let source = &bundle.project;
            let project = ProjectsRepo::insert(
                conn,
                &NewProject {
                    organization_id: ctx.organization_id,
                    code: code.clone(),
                    name: name.clone(),
                    description: source.description.clone(),
                    phase: source.phase,
                    status: source.status,
                    start_date: source.start_date,
                    end_date: source.end_date,
                    budget_cents: source.budget_cents,
                    currency: source.currency.clone(),
                    manager_id: keep_member(source.manager_id),
                    created_by: ctx.user_id,
                },
            )?;

            let task_ids: HashMap<Uuid, Uuid> = bundle.tasks.iter().map(|t| (t.id, Uuid::new_v4())).collect();
            let new_tasks: Vec<NewTask> = bundle
                .tasks
                .iter()
                .map(|task| NewTask {
                    id: task_ids[&task.id],
                    project_id: project.id,
                    parent_id: task.parent_id.and_then(|p| task_ids.get(&p).copied()),
                    wbs_code: task.wbs_code.clone(),
                    name: task.name.clone(),
                    description: task.description.clone(),
                    status: task.status,
                    priority: task.priority,
                    start_date: task.start_date,
                    end_date: task.end_date,
                    progress: effective_progress(task.status, task.progress),
                    estimated_hours: task.estimated_hours,
                    position: task.position,
                    is_milestone: task.is_milestone,
                    created_by: ctx.user_id,
                })
                .collect();
            let tasks = if new_tasks.is_empty() { 0 } else { TasksRepo::insert_many(conn, &new_tasks)? };

            let new_dependencies: Vec<NewTaskDependency> = bundle
                .dependencies
                .iter()
                .filter_map(|dep| {
                    Some(NewTaskDependency {
                        project_id: project.id,
                        predecessor_id: *task_ids.get(&dep.predecessor_id)?,
                        successor_id: *task_ids.get(&dep.successor_id)?,
                        dependency_type: dep.dependency_type,
                        lag_days: dep.lag_days,
                    })
                })
                .collect();
            let dependencies = if new_dependencies.is_empty() {
                0
            } else {
                DependenciesRepo::insert_many(conn, &new_dependencies)?
            };

            let mut risk_ids = HashMap::new();
            for risk in &bundle.risks {
                let created = RisksRepo::insert(
                    conn,
                    &NewRisk {
                        project_id: project.id,
                        title: risk.title.clone(),
                        description: risk.description.clone(),
                        category: risk.category.clone(),
                        probability: risk.probability,
                        impact: risk.impact,
                        status: risk.status,
                        owner_id: keep_member(risk.owner_id),
                        mitigation_plan: risk.mitigation_plan.clone(),
                        due_date: risk.due_date,
                        created_by: ctx.user_id,
                    },
                )?;
                risk_ids.insert(risk.id, created.id);
            }

            for issue in &bundle.issues {
                let created = IssuesRepo::insert(
                    conn,
                    &NewIssue {
                        project_id: project.id,
                        title: issue.title.clone(),
                        description: issue.description.clone(),
                        severity: issue.severity,
                        priority: issue.priority,
                        status: issue.status,
                        reporter_id: ctx.user_id,
                        assignee_id: keep_member(issue.assignee_id),
                        task_id: issue.task_id.and_then(|t| task_ids.get(&t).copied()),
                        risk_id: issue.risk_id.and_then(|r| risk_ids.get(&r).copied()),
                        due_date: issue.due_date,
                    },
                )?;
                if issue.resolution.is_some() || issue.resolved_at.is_some() {
                    IssuesRepo::update(
                        conn,
                        created.id,
                        &IssueChangeset {
                            resolution: Some(issue.resolution.clone()),
                            resolved_at: Some(issue.resolved_at),
                            ..Default::default()
                        },
                    )?;
                }
            }

            Ok(BundleImportResult {
                project,
                tasks,
                dependencies,
                risks: risk_ids.len(),
                issues: bundle.issues.len(),
            })
        })?;

        info!(
            project_id = %result.project.id,
            tasks = result.tasks,
            risks = result.risks,
            issues = result.issues,
            "Project bundle imported"
        );
        Ok(result)
    }
}

/// Applies the task and dependency rules of the regular endpoints to a
/// bundle's tasks and links. Links to tasks outside the bundle are ignored
/// since the import drops them.
pub fn check_bundle_tasks(tasks: &[Task], dependencies: &[TaskDependency]) -> Result<(), AppError> {
    for task in tasks {
        validate_task_name(&task.name)?;
        validate_wbs_code(&task.wbs_code)?;
        validate_date_range(task.start_date, task.end_date)?;
        validate_estimated_hours(task.estimated_hours)?;
        validate_progress(effective_progress(task.status, task.progress))?;
    }

    let parents: HashMap<Uuid, Option<Uuid>> = tasks.iter().map(|t| (t.id, t.parent_id)).collect();
    for task in tasks {
        let Some(parent) = task.parent_id.filter(|p| parents.contains_key(p)) else {
            continue;
        };
        if parent_creates_cycle(&parents, task.id, parent) {
            return Err(AppError::conflict_with_code(
                format!("Task {} is nested under itself", task.wbs_code),
                Some("tasks".to_string()),
                error_codes::PARENT_CYCLE,
            ));
        }
    }

    let mut edges: Vec<(Uuid, Uuid)> = Vec::with_capacity(dependencies.len());
    for dep in dependencies {
        if !parents.contains_key(&dep.predecessor_id) || !parents.contains_key(&dep.successor_id) {
            continue;
        }
        validate_lag_days(dep.lag_days)?;
        if edges.contains(&(dep.predecessor_id, dep.successor_id)) {
            return Err(AppError::conflict_with_code(
                "Bundle lists the same dependency twice",
                Some("dependencies".to_string()),
                error_codes::DEPENDENCY_EXISTS,
            ));
        }
        if would_create_cycle(&edges, dep.predecessor_id, dep.successor_id) {
            return Err(AppError::conflict_with_code(
                "Bundle dependencies form a cycle",
                Some("dependencies".to_string()),
                error_codes::DEPENDENCY_CYCLE,
            ));
        }
        edges.push((dep.predecessor_id, dep.successor_id));
    }
    Ok(())
}

fn invalid_rows(errors: Vec<ErrorDetail>) -> AppError {
    AppError::InvalidRows {
        message: format!("Import rejected: {} problem(s) found", errors.len()),
        errors,
    }
}

fn write_csv<T: serde::Serialize>(headers: &[&str], rows: &[T]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer
        .write_record(headers)
        .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::internal(format!("CSV is not UTF-8: {}", e)))
}

pub fn write_tasks_csv(tasks: &[Task]) -> Result<String, AppError> {
    let wbs_by_id: HashMap<Uuid, &str> = tasks.iter().map(|t| (t.id, t.wbs_code.as_str())).collect();
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| wbs_key(&a.wbs_code).cmp(&wbs_key(&b.wbs_code)));

    let rows: Vec<TaskCsvRow> = ordered
        .into_iter()
        .map(|task| TaskCsvRow {
            wbs_code: task.wbs_code.clone(),
            name: task.name.clone(),
            description: task.description.clone(),
            status: Some(task.status.to_string()),
            priority: Some(task.priority.to_string()),
            start_date: task.start_date.map(|d| d.to_string()),
            end_date: task.end_date.map(|d| d.to_string()),
            progress: Some(task.progress.to_string()),
            estimated_hours: task.estimated_hours.map(|h| h.to_string()),
            parent_wbs: task
                .parent_id
                .and_then(|p| wbs_by_id.get(&p))
                .map(|wbs| wbs.to_string()),
            milestone: Some(task.is_milestone.to_string()),
        })
        .collect();

    write_csv(&TASK_CSV_HEADERS, &rows)
}

/// Sorts `1.10` after `1.9`.
fn wbs_key(code: &str) -> Vec<(u64, String)> {
    code.split('.')
        .map(|segment| (segment.parse::<u64>().unwrap_or(u64::MAX), segment.to_string()))
        .collect()
}

fn row_error(line: u64, column: &str, code: &str, message: impl std::fmt::Display) -> ErrorDetail {
    ErrorDetail {
        field: Some(column.to_string()),
        code: code.to_string(),
        message: format!("Row {}: {}", line, message),
    }
}

fn from_app_error(line: u64, column: &str, err: AppError) -> ErrorDetail {
    match err {
        AppError::Validation { message, field, code } => row_error(
            line,
            field.as_deref().unwrap_or(column),
            code.as_deref().unwrap_or("INVALID_VALUE"),
            message,
        ),
        other => row_error(line, column, "INVALID_VALUE", other),
    }
}

/// Reads task rows keyed by their line number in the file (the header is
/// line 1). Missing columns and undecodable rows are reported, not skipped.
pub fn parse_tasks_csv(data: &str) -> Result<Vec<(u64, TaskCsvRow)>, Vec<ErrorDetail>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader.headers().map_err(|e| vec![row_error(1, "header", "INVALID_CSV", e)])?.clone();
    let missing: Vec<ErrorDetail> = ["wbs_code", "name"]
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .map(|required| row_error(1, required, "MISSING_COLUMN", format!("missing column '{}'", required)))
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                errors.push(row_error(line, "row", "INVALID_CSV", e));
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());
        match record.deserialize::<TaskCsvRow>(Some(&headers)) {
            Ok(row) => rows.push((line, row)),
            Err(e) => errors.push(row_error(line, "row", "INVALID_CSV", e)),
        }
        if rows.len() > MAX_IMPORT_ROWS {
            return Err(vec![row_error(
                line,
                "row",
                "TOO_MANY_ROWS",
                format!("at most {} rows can be imported at once", MAX_IMPORT_ROWS),
            )]);
        }
    }

    if rows.is_empty() && errors.is_empty() {
        return Err(vec![row_error(2, "row", "EMPTY_IMPORT", "the file has no task rows")]);
    }
    if errors.is_empty() { Ok(rows) } else { Err(errors) }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Turns parsed rows into inserts for `project_id`, validating every row
/// and resolving `parent_wbs` against the file and the existing tasks.
/// Parents are ordered before their children.
pub fn plan_task_import(
    project_id: Uuid,
    created_by: Uuid,
    existing: &[Task],
    rows: &[(u64, TaskCsvRow)],
) -> Result<Vec<NewTask>, Vec<ErrorDetail>> {
    let mut errors = Vec::new();
    let existing_by_wbs: HashMap<&str, Uuid> = existing.iter().map(|t| (t.wbs_code.as_str(), t.id)).collect();
    let mut file_wbs: HashMap<&str, (u64, Uuid)> = HashMap::new();

    for (line, row) in rows {
        let wbs = row.wbs_code.as_str();
        if let Err(e) = validate_wbs_code(wbs) {
            errors.push(from_app_error(*line, "wbs_code", e));
            continue;
        }
        if existing_by_wbs.contains_key(wbs) {
            errors.push(row_error(*line, "wbs_code", "DUPLICATE_WBS", format!("WBS code {} already exists", wbs)));
        } else if let Some((first, _)) = file_wbs.get(wbs) {
            errors.push(row_error(
                *line,
                "wbs_code",
                "DUPLICATE_WBS",
                format!("WBS code {} repeats row {}", wbs, first),
            ));
        } else {
            file_wbs.insert(wbs, (*line, Uuid::new_v4()));
        }
    }

    let mut next_position: HashMap<TaskStatus, i32> = HashMap::new();
    for task in existing {
        let next = next_position.entry(task.status).or_insert(0);
        *next = (*next).max(task.position + 1);
    }

    let mut planned: Vec<(u64, &str, Option<&str>, NewTask)> = Vec::with_capacity(rows.len());
    for (line, row) in rows {
        let line = *line;
        let Some(&(first_line, id)) = file_wbs.get(row.wbs_code.as_str()) else {
            continue;
        };
        if first_line != line {
            continue;
        }
        let before = errors.len();

        if let Err(e) = validate_task_name(&row.name) {
            errors.push(from_app_error(line, "name", e));
        }

        let status = match non_empty(&row.status) {
            Some(s) => s.parse::<TaskStatus>().unwrap_or_else(|e| {
                errors.push(row_error(line, "status", "INVALID_VALUE", e));
                TaskStatus::Todo
            }),
            None => TaskStatus::Todo,
        };
        let priority = match non_empty(&row.priority) {
            Some(s) => s.parse::<Priority>().unwrap_or_else(|e| {
                errors.push(row_error(line, "priority", "INVALID_VALUE", e));
                Priority::Medium
            }),
            None => Priority::Medium,
        };

        let mut date = |column: &str, value: &Option<String>| -> Option<NaiveDate> {
            let raw = non_empty(value)?;
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| errors.push(row_error(line, column, "INVALID_DATE", format!("'{}' is not YYYY-MM-DD", raw))))
                .ok()
        };
        let start_date = date("start_date", &row.start_date);
        let end_date = date("end_date", &row.end_date);
        if let Err(e) = validate_date_range(start_date, end_date) {
            errors.push(from_app_error(line, "end_date", e));
        }

        let progress = match non_empty(&row.progress) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(p) => p,
                Err(_) => {
                    errors.push(row_error(line, "progress", "INVALID_NUMBER", format!("'{}' is not a whole number", raw)));
                    0
                }
            },
            None => 0,
        };
        let progress = effective_progress(status, progress);
        if let Err(e) = validate_progress(progress) {
            errors.push(from_app_error(line, "progress", e));
        }

        let estimated_hours = match non_empty(&row.estimated_hours) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(h) => Some(h),
                Err(_) => {
                    errors.push(row_error(line, "estimated_hours", "INVALID_NUMBER", format!("'{}' is not a number", raw)));
                    None
                }
            },
            None => None,
        };
        if let Err(e) = validate_estimated_hours(estimated_hours) {
            errors.push(from_app_error(line, "estimated_hours", e));
        }

        let is_milestone = match non_empty(&row.milestone) {
            Some(raw) => parse_flag(raw).unwrap_or_else(|| {
                errors.push(row_error(line, "milestone", "INVALID_VALUE", format!("'{}' is not true or false", raw)));
                false
            }),
            None => false,
        };

        let parent_wbs = non_empty(&row.parent_wbs);
        let parent_id = match parent_wbs {
            Some(parent) if parent == row.wbs_code => {
                errors.push(row_error(line, "parent_wbs", "PARENT_CYCLE", "a task cannot be its own parent"));
                None
            }
            Some(parent) => match (existing_by_wbs.get(parent), file_wbs.get(parent)) {
                (Some(existing_id), _) => Some(*existing_id),
                (None, Some((_, new_id))) => Some(*new_id),
                (None, None) => {
                    errors.push(row_error(
                        line,
                        "parent_wbs",
                        "INVALID_PARENT",
                        format!("parent WBS {} not found", parent),
                    ));
                    None
                }
            },
            None => None,
        };

        if errors.len() > before {
            continue;
        }

        let position = next_position.entry(status).or_insert(0);
        planned.push((
            line,
            row.wbs_code.as_str(),
            parent_wbs.filter(|p| file_wbs.contains_key(p)),
            NewTask {
                id,
                project_id,
                parent_id,
                wbs_code: row.wbs_code.clone(),
                name: row.name.trim().to_string(),
                description: non_empty(&row.description).map(str::to_string),
                status,
                priority,
                start_date,
                end_date,
                progress,
                estimated_hours,
                position: *position,
                is_milestone,
                created_by,
            },
        ));
        *position += 1;
    }

    if !errors.is_empty() {
        errors.sort_by_key(|e| {
            e.message
                .strip_prefix("Row ")
                .and_then(|rest| rest.split(':').next())
                .and_then(|n| n.parse::<u64>().ok())
                .unwrap_or(0)
        });
        return Err(errors);
    }

    // Emit tasks whose in-file parent is already placed; anything left over
    // sits on a parent cycle.
    let mut placed: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(planned.len());
    let mut pending = planned;
    loop {
        let before = pending.len();
        let (ready, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(_, _, parent, _)| parent.is_none_or(|p| placed.contains(p)));
        for (_, wbs, _, task) in ready {
            placed.insert(wbs);
            ordered.push(task);
        }
        pending = rest;
        if pending.is_empty() {
            break;
        }
        if pending.len() == before {
            return Err(pending
                .iter()
                .map(|(line, _, _, _)| row_error(*line, "parent_wbs", "PARENT_CYCLE", "parent_wbs forms a cycle"))
                .collect());
        }
    }

    Ok(ordered)
}
