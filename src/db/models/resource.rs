use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::ResourceKind;

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::resources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Resource {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub hourly_rate_cents: i64,
    pub currency: String,
    pub capacity_hours: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::resources)]
pub struct NewResource {
    pub organization_id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub hourly_rate_cents: i64,
    pub currency: String,
    pub capacity_hours: f64,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::resources)]
pub struct ResourceChangeset {
    pub name: Option<String>,
    pub user_id: Option<Option<Uuid>>,
    pub hourly_rate_cents: Option<i64>,
    pub currency: Option<String>,
    pub capacity_hours: Option<f64>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Assignment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub resource_id: Uuid,
    pub allocation_percent: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::assignments)]
pub struct NewAssignment {
    pub task_id: Uuid,
    pub resource_id: Uuid,
    pub allocation_percent: i32,
}

#[derive(Deserialize)]
pub struct CreateResourceRequest {
    pub kind: ResourceKind,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub hourly_rate_cents: Option<i64>,
    pub currency: Option<String>,
    pub capacity_hours: Option<f64>,
}

#[derive(Deserialize, Default)]
pub struct UpdateResourceRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub user_id: Option<Option<Uuid>>,
    pub hourly_rate_cents: Option<i64>,
    pub currency: Option<String>,
    pub capacity_hours: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ResourceListQuery {
    pub kind: Option<ResourceKind>,
    pub include_inactive: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateAssignmentRequest {
    pub resource_id: Uuid,
    pub allocation_percent: Option<i32>,
}

#[derive(Deserialize)]
pub struct UtilizationQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub load_hours: f64,
    pub capacity_hours: f64,
    pub over_allocated: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct ResourceUtilization {
    pub resource_id: Uuid,
    pub resource_name: String,
    pub capacity_hours_per_day: f64,
    pub total_load_hours: f64,
    pub total_capacity_hours: f64,
    pub utilization_percent: f64,
    pub peak_load_hours: f64,
    pub over_allocated_days: Vec<DailyLoad>,
}
