use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::{DependencyType, Priority, TaskStatus},
    db::models::api::error_codes,
    db::models::project::Project,
    db::models::task::{
        CreateDependencyRequest, CreateTaskRequest, GanttChart, GanttTask, KanbanBoard, KanbanColumn, MoveTaskRequest,
        NewTask, NewTaskDependency, Task, TaskChangeset, TaskDependency, TaskListQuery, UpdateTaskRequest,
    },
    db::repositories::{dependencies::DependenciesRepo, projects::ProjectsRepo, tasks::TasksRepo},
    error::AppError,
    middleware::rbac::Permission,
    planning::{
        kanban,
        schedule::{ScheduleLink, ScheduleTask, compute_schedule, parent_creates_cycle, would_create_cycle},
    },
    services::{context::RequestContext, projects_service::ProjectsService},
    validation::project::validate_date_range,
    validation::task::{validate_estimated_hours, validate_lag_days, validate_progress, validate_task_name, validate_wbs_code},
};

pub struct TasksService;

impl TasksService {
    pub fn find(conn: &mut PgConnection, ctx: &RequestContext, task_id: Uuid) -> Result<Task, AppError> {
        TasksRepo::find_in_organization(conn, ctx.organization_id, task_id)?.ok_or_else(|| AppError::not_found("Task"))
    }

    pub fn get(conn: &mut PgConnection, ctx: &RequestContext, task_id: Uuid) -> Result<Task, AppError> {
        ctx.require(Permission::ViewAll)?;
        Self::find(conn, ctx, task_id)
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        query: &TaskListQuery,
    ) -> Result<Vec<Task>, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        Ok(TasksRepo::list_filtered(
            conn,
            project_id,
            query.status,
            query.parent_id,
            query.search.as_deref(),
        )?)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        req: &CreateTaskRequest,
    ) -> Result<Task, AppError> {
        ctx.require(Permission::EditTasks)?;
        ProjectsService::find(conn, ctx, project_id)?;

        validate_task_name(&req.name)?;
        validate_date_range(req.start_date, req.end_date)?;
        validate_estimated_hours(req.estimated_hours)?;
        let status = req.status.unwrap_or(TaskStatus::Todo);
        let progress = effective_progress(status, req.progress.unwrap_or(0));
        validate_progress(progress)?;

        let existing = TasksRepo::list_by_project(conn, project_id)?;
        let parent = match req.parent_id {
            Some(parent_id) => Some(
                existing
                    .iter()
                    .find(|t| t.id == parent_id)
                    .ok_or_else(|| AppError::validation_field("Parent task not found in project", "parent_id", "INVALID_PARENT"))?,
            ),
            None => None,
        };

        let wbs_code = match req.wbs_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                validate_wbs_code(code)?;
                code.to_string()
            }
            None => next_wbs_code(&existing, parent),
        };

        let new_task = NewTask {
            id: Uuid::new_v4(),
            project_id,
            parent_id: parent.map(|p| p.id),
            wbs_code,
            name: req.name.trim().to_string(),
            description: req.description.clone(),
            status,
            priority: req.priority.unwrap_or(Priority::Medium),
            start_date: req.start_date,
            end_date: req.end_date,
            progress,
            estimated_hours: req.estimated_hours,
            position: TasksRepo::next_position(conn, project_id, status)?,
            is_milestone: req.is_milestone.unwrap_or(false),
            created_by: ctx.user_id,
        };
        Ok(TasksRepo::insert(conn, &new_task)?)
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        task_id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        ctx.require(Permission::EditTasks)?;
        let task = Self::find(conn, ctx, task_id)?;

        if let Some(name) = &req.name {
            validate_task_name(name)?;
        }
        if let Some(code) = &req.wbs_code {
            validate_wbs_code(code)?;
        }
        if let Some(hours) = req.estimated_hours {
            validate_estimated_hours(hours)?;
        }
        validate_date_range(
            req.start_date.unwrap_or(task.start_date),
            req.end_date.unwrap_or(task.end_date),
        )?;

        let status = req.status.unwrap_or(task.status);
        let progress = match (req.progress, req.status) {
            (Some(p), _) => Some(effective_progress(status, p)),
            (None, Some(TaskStatus::Done)) => Some(100),
            _ => None,
        };
        if let Some(p) = progress {
            validate_progress(p)?;
        }

        conn.transaction::<Task, AppError, _>(|conn| {
            if let Some(Some(new_parent)) = req.parent_id {
                // Concurrent reparents in one project must see each other's result.
                ProjectsRepo::lock(conn, task.project_id)?;
                check_new_parent(conn, &task, new_parent)?;
            }
            if status != task.status {
                let position = TasksRepo::next_position(conn, task.project_id, status)?;
                TasksRepo::set_position(conn, task.id, position)?;
            }
            let changes = TaskChangeset {
                parent_id: req.parent_id,
                wbs_code: req.wbs_code.as_ref().map(|c| c.trim().to_string()),
                name: req.name.as_ref().map(|n| n.trim().to_string()),
                description: req.description.clone(),
                status: req.status,
                priority: req.priority,
                start_date: req.start_date,
                end_date: req.end_date,
                progress,
                estimated_hours: req.estimated_hours,
                is_milestone: req.is_milestone,
                updated_at: Some(Utc::now()),
            };
            let updated = TasksRepo::update(conn, task.id, &changes)?;
            if status != task.status {
                renumber_column(conn, task.project_id, task.status)?;
            }
            Ok(updated)
        })
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, task_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::EditTasks)?;
        let task = Self::find(conn, ctx, task_id)?;
        conn.transaction::<(), AppError, _>(|conn| {
            TasksRepo::delete(conn, task.id)?;
            renumber_column(conn, task.project_id, task.status)?;
            Ok(())
        })
    }

    pub fn list_dependencies(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Vec<TaskDependency>, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        Ok(DependenciesRepo::list_by_project(conn, project_id)?)
    }

    pub fn add_dependency(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        req: &CreateDependencyRequest,
    ) -> Result<TaskDependency, AppError> {
        ctx.require(Permission::EditTasks)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let lag_days = req.lag_days.unwrap_or(0);
        validate_lag_days(lag_days)?;

        conn.transaction::<TaskDependency, AppError, _>(|conn| {
            // Cycle checks read every edge of the project; hold the project row
            // so two opposite links cannot both pass.
            ProjectsRepo::lock(conn, project_id)?;

            for id in [req.predecessor_id, req.successor_id] {
                if TasksRepo::find_in_project(conn, project_id, id)?.is_none() {
                    return Err(AppError::not_found("Task"));
                }
            }
            if DependenciesRepo::exists(conn, req.predecessor_id, req.successor_id)? {
                return Err(AppError::conflict_with_code(
                    "Dependency already exists",
                    None,
                    error_codes::DEPENDENCY_EXISTS,
                ));
            }

            let edges: Vec<(Uuid, Uuid)> = DependenciesRepo::list_by_project(conn, project_id)?
                .iter()
                .map(|d| (d.predecessor_id, d.successor_id))
                .collect();
            if would_create_cycle(&edges, req.predecessor_id, req.successor_id) {
                return Err(AppError::conflict_with_code(
                    "Dependency would create a cycle",
                    None,
                    error_codes::DEPENDENCY_CYCLE,
                ));
            }

            Ok(DependenciesRepo::insert(
                conn,
                &NewTaskDependency {
                    project_id,
                    predecessor_id: req.predecessor_id,
                    successor_id: req.successor_id,
                    dependency_type: req.dependency_type.unwrap_or(DependencyType::FinishToStart),
                    lag_days,
                },
            )?)
        })
    }

    pub fn remove_dependency(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        dependency_id: Uuid,
    ) -> Result<(), AppError> {
        ctx.require(Permission::EditTasks)?;
        ProjectsService::find(conn, ctx, project_id)?;
        if DependenciesRepo::delete(conn, project_id, dependency_id)? == 0 {
            return Err(AppError::not_found("Dependency"));
        }
        Ok(())
    }

    pub fn gantt(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<GanttChart, AppError> {
        ctx.require(Permission::ViewAll)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;
        let tasks = TasksRepo::list_by_project(conn, project_id)?;
        let dependencies = DependenciesRepo::list_by_project(conn, project_id)?;
        build_gantt(&project, tasks, dependencies, Utc::now().date_naive())
    }

    pub fn kanban(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid) -> Result<KanbanBoard, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let tasks = TasksRepo::list_by_project(conn, project_id)?;
        Ok(build_board(project_id, tasks))
    }

    /// Moves a task to `status` at index `position` and renumbers the
    /// affected columns densely.
    pub fn move_task(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        task_id: Uuid,
        req: &MoveTaskRequest,
    ) -> Result<Task, AppError> {
        ctx.require(Permission::EditTasks)?;
        let task = Self::find(conn, ctx, task_id)?;
        let index = usize::try_from(req.position.max(0)).unwrap_or(0);

        conn.transaction::<Task, AppError, _>(|conn| {
            let target = TasksRepo::column_ids(conn, task.project_id, req.status)?;
            let source = if req.status == task.status {
                None
            } else {
                Some(TasksRepo::column_ids(conn, task.project_id, task.status)?)
            };

            for (id, position) in kanban::plan_move(source.as_deref(), &target, task.id, index) {
                TasksRepo::set_position(conn, id, position)?;
            }

            let changes = TaskChangeset {
                status: Some(req.status),
                progress: (req.status == TaskStatus::Done).then_some(100),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            Ok(TasksRepo::update(conn, task.id, &changes)?)
        })
    }
}

/// Done tasks are always complete.
pub(crate) fn effective_progress(status: TaskStatus, progress: i32) -> i32 {
    if status == TaskStatus::Done { 100 } else { progress }
}

fn renumber_column(conn: &mut PgConnection, project_id: Uuid, status: TaskStatus) -> Result<(), AppError> {
    let ids = TasksRepo::column_ids(conn, project_id, status)?;
    for (id, position) in kanban::dense_positions(&ids) {
        TasksRepo::set_position(conn, id, position)?;
    }
    Ok(())
}

/// Next free WBS code below `parent`, or at the top level.
fn check_new_parent(conn: &mut PgConnection, task: &Task, new_parent: Uuid) -> Result<(), AppError> {
    let siblings = TasksRepo::list_by_project(conn, task.project_id)?;
    if !siblings.iter().any(|t| t.id == new_parent) {
        return Err(AppError::validation_field(
            "Parent task not found in project",
            "parent_id",
            "INVALID_PARENT",
        ));
    }
    let parents: HashMap<Uuid, Option<Uuid>> = siblings.iter().map(|t| (t.id, t.parent_id)).collect();
    if parent_creates_cycle(&parents, task.id, new_parent) {
        return Err(AppError::conflict_with_code(
            "A task cannot be moved under itself or its descendants",
            Some("parent_id".to_string()),
            error_codes::PARENT_CYCLE,
        ));
    }
    Ok(())
}

fn next_wbs_code(tasks: &[Task], parent: Option<&Task>) -> String {
    let parent_id = parent.map(|p| p.id);
    let prefix = parent.map(|p| format!("{}.", p.wbs_code)).unwrap_or_default();
    let next = tasks
        .iter()
        .filter(|t| t.parent_id == parent_id)
        .filter_map(|t| t.wbs_code.strip_prefix(prefix.as_str()))
        .filter_map(|rest| rest.split('.').next()?.parse::<u32>().ok())
        .max()
        .map_or(1, |n| n + 1);
    format!("{}{}", prefix, next)
}

pub(crate) fn build_board(project_id: Uuid, tasks: Vec<Task>) -> KanbanBoard {
    let mut by_status: HashMap<TaskStatus, Vec<Task>> = HashMap::new();
    for task in tasks {
        by_status.entry(task.status).or_default().push(task);
    }
    let columns = TaskStatus::ALL
        .iter()
        .map(|status| {
            let mut tasks = by_status.remove(status).unwrap_or_default();
            tasks.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
            KanbanColumn { status: *status, tasks }
        })
        .collect();
    KanbanBoard { project_id, columns }
}

pub(crate) fn build_gantt(
    project: &Project,
    tasks: Vec<Task>,
    dependencies: Vec<TaskDependency>,
    today: NaiveDate,
) -> Result<GanttChart, AppError> {
    let schedule_tasks: Vec<ScheduleTask> = tasks
        .iter()
        .map(|t| ScheduleTask {
            id: t.id,
            planned_start: t.start_date,
            planned_end: t.end_date,
            estimated_hours: t.estimated_hours,
            is_milestone: t.is_milestone,
        })
        .collect();
    let links: Vec<ScheduleLink> = dependencies
        .iter()
        .map(|d| ScheduleLink {
            predecessor_id: d.predecessor_id,
            successor_id: d.successor_id,
            kind: d.dependency_type,
            lag_days: d.lag_days,
        })
        .collect();

    let schedule = compute_schedule(&schedule_tasks, &links, project.start_date.unwrap_or(today))?;

    let gantt_tasks = tasks
        .into_iter()
        .zip(schedule.tasks)
        .map(|(task, scheduled)| GanttTask {
            id: task.id,
            parent_id: task.parent_id,
            wbs_code: task.wbs_code,
            name: task.name,
            status: task.status,
            progress: task.progress,
            is_milestone: task.is_milestone,
            planned_start: task.start_date,
            planned_end: task.end_date,
            early_start: scheduled.early_start,
            early_finish: scheduled.early_finish,
            late_start: scheduled.late_start,
            late_finish: scheduled.late_finish,
            total_float_days: scheduled.total_float_days,
            is_critical: scheduled.is_critical,
        })
        .collect();

    Ok(GanttChart {
        project_id: project.id,
        project_start: schedule.project_start,
        project_finish: schedule.project_finish,
        tasks: gantt_tasks,
        dependencies,
        critical_path: schedule.critical_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(wbs: &str, parent: Option<Uuid>, status: TaskStatus, position: i32) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            parent_id: parent,
            wbs_code: wbs.to_string(),
            name: wbs.to_string(),
            description: None,
            status,
            priority: Priority::Medium,
            start_date: None,
            end_date: None,
            progress: 0,
            estimated_hours: None,
            position,
            is_milestone: false,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn wbs_codes_continue_numbering() {
        let root = task("1", None, TaskStatus::Todo, 0);
        let child = task("1.3", Some(root.id), TaskStatus::Todo, 1);
        let tasks = vec![root.clone(), child, task("2", None, TaskStatus::Todo, 2)];

        assert_eq!(next_wbs_code(&tasks, None), "3");
        assert_eq!(next_wbs_code(&tasks, Some(&root)), "1.4");
        assert_eq!(next_wbs_code(&[], None), "1");
    }

    #[test]
    fn board_has_every_column_in_order() {
        let a = task("1", None, TaskStatus::Done, 1);
        let b = task("2", None, TaskStatus::Done, 0);
        let board = build_board(Uuid::nil(), vec![a.clone(), b.clone()]);

        let statuses: Vec<TaskStatus> = board.columns.iter().map(|c| c.status).collect();
        assert_eq!(statuses, TaskStatus::ALL.to_vec());
        let done = &board.columns[4].tasks;
        assert_eq!(done[0].id, b.id);
        assert_eq!(done[1].id, a.id);
    }

    #[test]
    fn done_forces_full_progress() {
        assert_eq!(effective_progress(TaskStatus::Done, 10), 100);
        assert_eq!(effective_progress(TaskStatus::Review, 10), 10);
    }
}
