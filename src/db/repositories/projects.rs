use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::ProjectStatus;
use crate::db::models::project::{NewProject, Project, ProjectChangeset};

pub struct ProjectsRepo;

impl ProjectsRepo {
    pub fn exists_code_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        target_code: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        diesel::select(diesel::dsl::exists(
            projects
                .filter(organization_id.eq(org))
                .filter(code.eq(target_code)),
        ))
        .get_result(conn)
    }

    pub fn insert(conn: &mut PgConnection, new_project: &NewProject) -> Result<Project, diesel::result::Error> {
        diesel::insert_into(crate::schema::projects::table)
            .values(new_project)
            .returning(Project::as_returning())
            .get_result(conn)
    }

    /// Locks the project row until the surrounding transaction ends.
    pub fn lock(conn: &mut PgConnection, project_id: Uuid) -> Result<(), diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        projects
            .filter(id.eq(project_id))
            .select(id)
            .for_update()
            .first::<Uuid>(conn)
            .map(|_| ())
    }

    pub fn find_by_id_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        project_id: Uuid,
    ) -> Result<Option<Project>, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        projects
            .filter(id.eq(project_id))
            .filter(organization_id.eq(org))
            .select(Project::as_select())
            .first(conn)
            .optional()
    }

    /// One page of projects plus the total matching count.
    pub fn list(
        conn: &mut PgConnection,
        org: Uuid,
        search: Option<&str>,
        status_filter: Option<ProjectStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, i64), diesel::result::Error> {
        use crate::schema::projects::dsl as p;

        let filtered = || {
            let mut query = p::projects.filter(p::organization_id.eq(org)).into_boxed();
            if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
                let pattern = format!("%{}%", term.trim());
                query = query.filter(p::name.ilike(pattern.clone()).or(p::code.ilike(pattern)));
            }
            if let Some(s) = status_filter {
                query = query.filter(p::status.eq(s));
            }
            query
        };

        let total = filtered().count().get_result::<i64>(conn)?;
        let items = filtered()
            .order(p::created_at.desc())
            .limit(limit)
            .offset(offset)
            .select(Project::as_select())
            .load(conn)?;
        Ok((items, total))
    }

    pub fn list_all(conn: &mut PgConnection, org: Uuid) -> Result<Vec<Project>, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        projects
            .filter(organization_id.eq(org))
            .select(Project::as_select())
            .load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        project_id: Uuid,
        changes: &ProjectChangeset,
    ) -> Result<Project, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        diesel::update(projects.filter(id.eq(project_id)))
            .set(changes)
            .returning(Project::as_returning())
            .get_result(conn)
    }

    pub fn delete_by_id(conn: &mut PgConnection, project_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::projects::dsl::*;
        diesel::delete(projects.filter(id.eq(project_id))).execute(conn)
    }
}
