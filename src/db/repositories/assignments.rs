use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::resource::{Assignment, NewAssignment};

pub struct AssignmentsRepo;

impl AssignmentsRepo {
    pub fn insert(conn: &mut PgConnection, new_assignment: &NewAssignment) -> Result<Assignment, diesel::result::Error> {
        diesel::insert_into(crate::schema::assignments::table)
            .values(new_assignment)
            .returning(Assignment::as_returning())
            .get_result(conn)
    }

    pub fn exists(conn: &mut PgConnection, task: Uuid, resource: Uuid) -> Result<bool, diesel::result::Error> {
        use crate::schema::assignments::dsl::*;
        diesel::select(diesel::dsl::exists(
            assignments.filter(task_id.eq(task)).filter(resource_id.eq(resource)),
        ))
        .get_result(conn)
    }

    pub fn list_by_task(conn: &mut PgConnection, task: Uuid) -> Result<Vec<Assignment>, diesel::result::Error> {
        use crate::schema::assignments::dsl::*;
        assignments
            .filter(task_id.eq(task))
            .order(created_at.asc())
            .select(Assignment::as_select())
            .load(conn)
    }

    /// Assignment percentages with the task's planned dates, for tasks that
    /// have both dates and overlap `[from, to]`.
    pub fn spans_for_resource(
        conn: &mut PgConnection,
        resource: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(i32, NaiveDate, NaiveDate)>, diesel::result::Error> {
        use crate::schema::{assignments as a, tasks as t};
        let rows: Vec<(i32, Option<NaiveDate>, Option<NaiveDate>)> = a::table
            .inner_join(t::table)
            .filter(a::resource_id.eq(resource))
            .filter(t::start_date.le(to))
            .filter(t::end_date.ge(from))
            .select((a::allocation_percent, t::start_date, t::end_date))
            .load(conn)?;
        Ok(rows
            .into_iter()
            .filter_map(|(percent, start, end)| Some((percent, start?, end?)))
            .collect())
    }

    pub fn delete(conn: &mut PgConnection, task: Uuid, assignment_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::assignments::dsl::*;
        diesel::delete(assignments.filter(id.eq(assignment_id)).filter(task_id.eq(task))).execute(conn)
    }
}
