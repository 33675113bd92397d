use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{ProjectPhase, ProjectStatus};

// Project models
#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub phase: ProjectPhase,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_cents: i64,
    pub currency: String,
    pub manager_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::projects)]
pub struct NewProject {
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub phase: ProjectPhase,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_cents: i64,
    pub currency: String,
    pub manager_id: Option<Uuid>,
    pub created_by: Uuid,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::projects)]
pub struct ProjectChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub phase: Option<ProjectPhase>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub budget_cents: Option<i64>,
    pub currency: Option<String>,
    pub manager_id: Option<Option<Uuid>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Project API DTOs
#[derive(Deserialize, Serialize, Clone)]
pub struct CreateProjectRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub phase: Option<ProjectPhase>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
    pub currency: Option<String>,
    pub manager_id: Option<Uuid>,
}

/// Partial update. Double options distinguish "absent" from "set to null".
#[derive(Deserialize, Default)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub description: Option<Option<String>>,
    pub phase: Option<ProjectPhase>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub budget_cents: Option<i64>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub manager_id: Option<Option<Uuid>>,
}

#[derive(Deserialize)]
pub struct ProjectListQuery {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub total_count: i64,
}
