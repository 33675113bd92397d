use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::TaskStatus;
use crate::db::models::task::{NewTask, Task, TaskChangeset};

pub struct TasksRepo;

impl TasksRepo {
    pub fn insert(conn: &mut PgConnection, new_task: &NewTask) -> Result<Task, diesel::result::Error> {
        diesel::insert_into(crate::schema::tasks::table)
            .values(new_task)
            .returning(Task::as_returning())
            .get_result(conn)
    }

    pub fn insert_many(conn: &mut PgConnection, new_tasks: &[NewTask]) -> Result<usize, diesel::result::Error> {
        diesel::insert_into(crate::schema::tasks::table)
            .values(new_tasks)
            .execute(conn)
    }

    /// A task, provided its project belongs to the organization.
    pub fn find_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Task>, diesel::result::Error> {
        use crate::schema::{projects as p, tasks as t};
        t::table
            .inner_join(p::table)
            .filter(t::id.eq(task_id))
            .filter(p::organization_id.eq(org))
            .select(Task::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_in_project(
        conn: &mut PgConnection,
        project: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Task>, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        tasks
            .filter(id.eq(task_id))
            .filter(project_id.eq(project))
            .select(Task::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_project(conn: &mut PgConnection, project: Uuid) -> Result<Vec<Task>, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        tasks
            .filter(project_id.eq(project))
            .order((wbs_code.asc(), created_at.asc()))
            .select(Task::as_select())
            .load(conn)
    }

    pub fn list_filtered(
        conn: &mut PgConnection,
        project: Uuid,
        status_filter: Option<TaskStatus>,
        parent_filter: Option<Uuid>,
        search: Option<&str>,
    ) -> Result<Vec<Task>, diesel::result::Error> {
        use crate::schema::tasks::dsl as t;
        let mut query = t::tasks.filter(t::project_id.eq(project)).into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(t::status.eq(s));
        }
        if let Some(parent) = parent_filter {
            query = query.filter(t::parent_id.eq(parent));
        }
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(t::name.ilike(format!("%{}%", term.trim())));
        }
        query
            .order((t::wbs_code.asc(), t::created_at.asc()))
            .select(Task::as_select())
            .load(conn)
    }

    /// Task ids of one Kanban column, in board order.
    pub fn column_ids(
        conn: &mut PgConnection,
        project: Uuid,
        column: TaskStatus,
    ) -> Result<Vec<Uuid>, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        tasks
            .filter(project_id.eq(project))
            .filter(status.eq(column))
            .order((position.asc(), created_at.asc()))
            .select(id)
            .load(conn)
    }

    pub fn next_position(
        conn: &mut PgConnection,
        project: Uuid,
        column: TaskStatus,
    ) -> Result<i32, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        let max: Option<i32> = tasks
            .filter(project_id.eq(project))
            .filter(status.eq(column))
            .select(diesel::dsl::max(position))
            .first(conn)?;
        Ok(max.map_or(0, |m| m + 1))
    }

    pub fn set_position(
        conn: &mut PgConnection,
        task_id: Uuid,
        new_position: i32,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        diesel::update(tasks.filter(id.eq(task_id)))
            .set(position.eq(new_position))
            .execute(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        task_id: Uuid,
        changes: &TaskChangeset,
    ) -> Result<Task, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        diesel::update(tasks.filter(id.eq(task_id)))
            .set(changes)
            .returning(Task::as_returning())
            .get_result(conn)
    }

    /// Children keep living with a null parent (`ON DELETE SET NULL`).
    pub fn delete(conn: &mut PgConnection, task_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::tasks::dsl::*;
        diesel::delete(tasks.filter(id.eq(task_id))).execute(conn)
    }
}
