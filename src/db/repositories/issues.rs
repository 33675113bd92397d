use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::{IssueSeverity, IssueStatus};
use crate::db::models::issue::{Issue, IssueChangeset, NewIssue};

pub struct IssuesRepo;

impl IssuesRepo {
    pub fn insert(conn: &mut PgConnection, new_issue: &NewIssue) -> Result<Issue, diesel::result::Error> {
        diesel::insert_into(crate::schema::issues::table)
            .values(new_issue)
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn insert_many(conn: &mut PgConnection, new_issues: &[NewIssue]) -> Result<usize, diesel::result::Error> {
        diesel::insert_into(crate::schema::issues::table)
            .values(new_issues)
            .execute(conn)
    }

    pub fn find_in_project(
        conn: &mut PgConnection,
        project: Uuid,
        issue_id: Uuid,
    ) -> Result<Option<Issue>, diesel::result::Error> {
        use crate::schema::issues::dsl::*;
        issues
            .filter(id.eq(issue_id))
            .filter(project_id.eq(project))
            .select(Issue::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_project(
        conn: &mut PgConnection,
        project: Uuid,
        status_filter: Option<IssueStatus>,
        severity_filter: Option<IssueSeverity>,
        assignee_filter: Option<Uuid>,
    ) -> Result<Vec<Issue>, diesel::result::Error> {
        use crate::schema::issues::dsl as i;
        let mut query = i::issues.filter(i::project_id.eq(project)).into_boxed();
        if let Some(s) = status_filter {
            query = query.filter(i::status.eq(s));
        }
        if let Some(s) = severity_filter {
            query = query.filter(i::severity.eq(s));
        }
        if let Some(a) = assignee_filter {
            query = query.filter(i::assignee_id.eq(a));
        }
        query
            .order(i::created_at.desc())
            .select(Issue::as_select())
            .load(conn)
    }

    pub fn list_by_organization(conn: &mut PgConnection, org: Uuid) -> Result<Vec<Issue>, diesel::result::Error> {
        use crate::schema::{issues as i, projects as p};
        i::table
            .inner_join(p::table)
            .filter(p::organization_id.eq(org))
            .select(Issue::as_select())
            .load(conn)
    }

    pub fn update(conn: &mut PgConnection, issue_id: Uuid, changes: &IssueChangeset) -> Result<Issue, diesel::result::Error> {
        use crate::schema::issues::dsl::*;
        diesel::update(issues.filter(id.eq(issue_id)))
            .set(changes)
            .returning(Issue::as_returning())
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, issue_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::issues::dsl::*;
        diesel::delete(issues.filter(id.eq(issue_id))).execute(conn)
    }
}
