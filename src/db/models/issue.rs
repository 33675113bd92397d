use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{IssueSeverity, IssueStatus, Priority};

// Issue models
#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::issues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Issue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: IssueSeverity,
    pub priority: Priority,
    pub status: IssueStatus,
    pub reporter_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::issues)]
pub struct NewIssue {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: IssueSeverity,
    pub priority: Priority,
    pub status: IssueStatus,
    pub reporter_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(AsChangeset, Default, Debug)]
#[diesel(table_name = crate::schema::issues)]
pub struct IssueChangeset {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub severity: Option<IssueSeverity>,
    pub priority: Option<Priority>,
    pub status: Option<IssueStatus>,
    pub assignee_id: Option<Option<Uuid>>,
    pub task_id: Option<Option<Uuid>>,
    pub risk_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub resolution: Option<Option<String>>,
    pub resolved_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Issue API DTOs
#[derive(Deserialize, Serialize, Clone)]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: Option<String>,
    pub severity: Option<IssueSeverity>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub risk_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, Default)]
pub struct UpdateIssueRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub description: Option<Option<String>>,
    pub severity: Option<IssueSeverity>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub task_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub risk_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Deserialize)]
pub struct IssueTransitionRequest {
    pub status: IssueStatus,
    pub resolution: Option<String>,
}

#[derive(Deserialize)]
pub struct IssueListQuery {
    pub status: Option<IssueStatus>,
    pub severity: Option<IssueSeverity>,
    pub assignee_id: Option<Uuid>,
}
