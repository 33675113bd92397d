use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::task::{NewTaskDependency, TaskDependency};

pub struct DependenciesRepo;

impl DependenciesRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_dependency: &NewTaskDependency,
    ) -> Result<TaskDependency, diesel::result::Error> {
        diesel::insert_into(crate::schema::task_dependencies::table)
            .values(new_dependency)
            .returning(TaskDependency::as_returning())
            .get_result(conn)
    }

    pub fn insert_many(
        conn: &mut PgConnection,
        new_dependencies: &[NewTaskDependency],
    ) -> Result<usize, diesel::result::Error> {
        diesel::insert_into(crate::schema::task_dependencies::table)
            .values(new_dependencies)
            .execute(conn)
    }

    pub fn list_by_project(
        conn: &mut PgConnection,
        project: Uuid,
    ) -> Result<Vec<TaskDependency>, diesel::result::Error> {
        use crate::schema::task_dependencies::dsl::*;
        task_dependencies
            .filter(project_id.eq(project))
            .order(created_at.asc())
            .select(TaskDependency::as_select())
            .load(conn)
    }

    pub fn exists(
        conn: &mut PgConnection,
        predecessor: Uuid,
        successor: Uuid,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::task_dependencies::dsl::*;
        diesel::select(diesel::dsl::exists(
            task_dependencies
                .filter(predecessor_id.eq(predecessor))
                .filter(successor_id.eq(successor)),
        ))
        .get_result(conn)
    }

    pub fn delete(
        conn: &mut PgConnection,
        project: Uuid,
        dependency_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::task_dependencies::dsl::*;
        diesel::delete(
            task_dependencies
                .filter(id.eq(dependency_id))
                .filter(project_id.eq(project)),
        )
        .execute(conn)
    }
}
