use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::TimeEntryStatus;

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::time_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeEntry {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub billable: bool,
    pub notes: Option<String>,
    pub status: TimeEntryStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::time_entries)]
pub struct NewTimeEntry {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub billable: bool,
    pub notes: Option<String>,
    pub status: TimeEntryStatus,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::time_entries)]
pub struct TimeEntryChangeset {
    pub task_id: Option<Uuid>,
    pub resource_id: Option<Option<Uuid>>,
    pub work_date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub billable: Option<bool>,
    pub notes: Option<Option<String>>,
    pub status: Option<TimeEntryStatus>,
    pub reviewed_by: Option<Option<Uuid>>,
    pub reviewed_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateTimeEntryRequest {
    pub task_id: Uuid,
    pub resource_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub billable: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateTimeEntryRequest {
    pub task_id: Option<Uuid>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub resource_id: Option<Option<Uuid>>,
    pub work_date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub billable: Option<bool>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Deserialize)]
pub struct TimeEntryListQuery {
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<TimeEntryStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct ReviewTimeEntryRequest {
    pub approve: bool,
}

#[derive(Deserialize)]
pub struct TimesheetQuery {
    pub user_id: Option<Uuid>,
    /// Any date inside the requested ISO week; defaults to today.
    pub week_of: Option<NaiveDate>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimesheetDay {
    pub date: NaiveDate,
    pub hours: f64,
}

#[derive(Serialize)]
pub struct Timesheet {
    pub user_id: Uuid,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<TimesheetDay>,
    pub total_hours: f64,
    pub billable_hours: f64,
    pub entries: Vec<TimeEntry>,
}
