use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{issue::Issue, project::Project, risk::Risk, task::Task, task::TaskDependency};

pub const TASK_CSV_HEADERS: [&str; 11] = [
    "wbs_code",
    "name",
    "description",
    "status",
    "priority",
    "start_date",
    "end_date",
    "progress",
    "estimated_hours",
    "parent_wbs",
    "milestone",
];

/// One line of a task CSV file. Every column is read as text so that
/// malformed values can be reported per row and column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskCsvRow {
    pub wbs_code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub progress: Option<String>,
    pub estimated_hours: Option<String>,
    pub parent_wbs: Option<String>,
    pub milestone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskCsvRow {
    pub title: String,
    pub category: Option<String>,
    pub probability: i32,
    pub impact: i32,
    pub score: i32,
    pub level: String,
    pub status: String,
    pub owner_id: Option<String>,
    pub due_date: Option<String>,
    pub mitigation_plan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskImportResult {
    pub imported: usize,
}

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Self-contained snapshot of a project used for JSON export and import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBundle {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub project: Project,
    pub tasks: Vec<Task>,
    pub dependencies: Vec<TaskDependency>,
    pub risks: Vec<Risk>,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
pub struct ImportBundleRequest {
    /// Code for the new project; must be unused in the organization.
    pub code: String,
    pub name: Option<String>,
    pub bundle: ProjectBundle,
}

#[derive(Debug, Serialize)]
pub struct BundleImportResult {
    pub project: Project,
    pub tasks: usize,
    pub dependencies: usize,
    pub risks: usize,
    pub issues: usize,
}
