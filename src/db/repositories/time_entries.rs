use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::TimeEntryStatus;
use crate::db::models::time_entry::{NewTimeEntry, TimeEntry, TimeEntryChangeset};

pub struct TimeEntriesRepo;

/// Filters for listing time entries inside one organization.
#[derive(Default)]
pub struct TimeEntryFilter {
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<TimeEntryStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TimeEntriesRepo {
    pub fn insert(conn: &mut PgConnection, new_entry: &NewTimeEntry) -> Result<TimeEntry, diesel::result::Error> {
        diesel::insert_into(crate::schema::time_entries::table)
            .values(new_entry)
            .returning(TimeEntry::as_returning())
            .get_result(conn)
    }

    pub fn find_in_organization(
        conn: &mut PgConnection,
        org: Uuid,
        entry_id: Uuid,
    ) -> Result<Option<TimeEntry>, diesel::result::Error> {
        use crate::schema::time_entries::dsl::*;
        time_entries
            .filter(id.eq(entry_id))
            .filter(organization_id.eq(org))
            .select(TimeEntry::as_select())
            .first(conn)
            .optional()
    }

    pub fn list(
        conn: &mut PgConnection,
        org: Uuid,
        filter: &TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, diesel::result::Error> {
        use crate::schema::{tasks as t, time_entries as te};
        let mut query = te::table
            .inner_join(t::table)
            .filter(te::organization_id.eq(org))
            .into_boxed();
        if let Some(user) = filter.user_id {
            query = query.filter(te::user_id.eq(user));
        }
        if let Some(project) = filter.project_id {
            query = query.filter(t::project_id.eq(project));
        }
        if let Some(s) = filter.status {
            query = query.filter(te::status.eq(s));
        }
        if let Some(from) = filter.from {
            query = query.filter(te::work_date.ge(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(te::work_date.le(to));
        }
        query
            .order((te::work_date.desc(), te::created_at.desc()))
            .select(TimeEntry::as_select())
            .load(conn)
    }

    /// Hours a user has logged on one day, optionally ignoring one entry.
    pub fn hours_on_date(
        conn: &mut PgConnection,
        user: Uuid,
        date: NaiveDate,
        excluding: Option<Uuid>,
    ) -> Result<f64, diesel::result::Error> {
        use crate::schema::time_entries::dsl::*;
        let mut query = time_entries
            .filter(user_id.eq(user))
            .filter(work_date.eq(date))
            .select(hours)
            .into_boxed();
        if let Some(skip) = excluding {
            query = query.filter(id.ne(skip));
        }
        let logged: Vec<f64> = query.load(conn)?;
        Ok(logged.into_iter().sum())
    }

    pub fn update(
        conn: &mut PgConnection,
        entry_id: Uuid,
        changes: &TimeEntryChangeset,
    ) -> Result<TimeEntry, diesel::result::Error> {
        use crate::schema::time_entries::dsl::*;
        diesel::update(time_entries.filter(id.eq(entry_id)))
            .set(changes)
            .returning(TimeEntry::as_returning())
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, entry_id: Uuid) -> Result<usize, diesel::result::Error> {
        use crate::schema::time_entries::dsl::*;
        diesel::delete(time_entries.filter(id.eq(entry_id))).execute(conn)
    }

    /// Approved hours per resource on a project: `(resource_id, hours)`.
    pub fn approved_hours_by_resource(
        conn: &mut PgConnection,
        project: Uuid,
    ) -> Result<Vec<(Option<Uuid>, f64)>, diesel::result::Error> {
        use crate::schema::{tasks as t, time_entries as te};
        te::table
            .inner_join(t::table)
            .filter(t::project_id.eq(project))
            .filter(te::status.eq(TimeEntryStatus::Approved))
            .select((te::resource_id, te::hours))
            .load(conn)
    }

    pub fn total_hours_between(
        conn: &mut PgConnection,
        org: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<f64, diesel::result::Error> {
        use crate::schema::time_entries::dsl::*;
        let logged: Vec<f64> = time_entries
            .filter(organization_id.eq(org))
            .filter(work_date.ge(from))
            .filter(work_date.le(to))
            .select(hours)
            .load(conn)?;
        Ok(logged.into_iter().sum())
    }
}
