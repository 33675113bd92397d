use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::enums::{DependencyType, Priority, TaskStatus};

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub wbs_code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: i32,
    pub estimated_hours: Option<f64>,
    pub position: i32,
    pub is_milestone: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub wbs_code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: i32,
    pub estimated_hours: Option<f64>,
    pub position: i32,
    pub is_milestone: bool,
    pub created_by: Uuid,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::tasks)]
pub struct TaskChangeset {
    pub parent_id: Option<Option<Uuid>>,
    pub wbs_code: Option<String>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub progress: Option<i32>,
    pub estimated_hours: Option<Option<f64>>,
    pub is_milestone: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::task_dependencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskDependency {
    pub id: Uuid,
    pub project_id: Uuid,
    pub predecessor_id: Uuid,
    pub successor_id: Uuid,
    pub dependency_type: DependencyType,
    pub lag_days: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::task_dependencies)]
pub struct NewTaskDependency {
    pub project_id: Uuid,
    pub predecessor_id: Uuid,
    pub successor_id: Uuid,
    pub dependency_type: DependencyType,
    pub lag_days: i32,
}

// Task API DTOs
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CreateTaskRequest {
    pub parent_id: Option<Uuid>,
    pub wbs_code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: Option<i32>,
    pub estimated_hours: Option<f64>,
    pub is_milestone: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub parent_id: Option<Option<Uuid>>,
    pub wbs_code: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub progress: Option<i32>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub estimated_hours: Option<Option<f64>>,
    pub is_milestone: Option<bool>,
}

#[derive(Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub parent_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDependencyRequest {
    pub predecessor_id: Uuid,
    pub successor_id: Uuid,
    pub dependency_type: Option<DependencyType>,
    pub lag_days: Option<i32>,
}

#[derive(Deserialize)]
pub struct MoveTaskRequest {
    pub status: TaskStatus,
    pub position: i32,
}

#[derive(Serialize)]
pub struct KanbanColumn {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
pub struct KanbanBoard {
    pub project_id: Uuid,
    pub columns: Vec<KanbanColumn>,
}

#[derive(Serialize, Debug, Clone)]
pub struct GanttTask {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub wbs_code: String,
    pub name: String,
    pub status: TaskStatus,
    pub progress: i32,
    pub is_milestone: bool,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub early_start: NaiveDate,
    pub early_finish: NaiveDate,
    pub late_start: NaiveDate,
    pub late_finish: NaiveDate,
    pub total_float_days: i64,
    pub is_critical: bool,
}

#[derive(Serialize, Debug)]
pub struct GanttChart {
    pub project_id: Uuid,
    pub project_start: NaiveDate,
    pub project_finish: NaiveDate,
    pub tasks: Vec<GanttTask>,
    pub dependencies: Vec<TaskDependency>,
    pub critical_path: Vec<Uuid>,
}
