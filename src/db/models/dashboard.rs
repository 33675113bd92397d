use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::risk::RiskMatrix;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct OrganizationDashboard {
    pub organization_id: Uuid,
    pub projects_by_status: BTreeMap<String, i64>,
    pub active_projects: i64,
    pub overdue_tasks: i64,
    pub open_risks_by_level: BTreeMap<String, i64>,
    pub open_issues_by_severity: BTreeMap<String, i64>,
    pub hours_this_week: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CostSummary {
    pub currency: String,
    pub budget_cents: i64,
    pub actual_cost_cents: i64,
    pub variance_cents: i64,
    pub budget_consumed_percent: f64,
    /// Entries whose resource currency could not be converted.
    pub unconverted_entries: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProjectDashboard {
    pub project_id: Uuid,
    pub tasks_by_status: BTreeMap<String, i64>,
    pub total_tasks: i64,
    pub progress_percent: f64,
    pub planned_progress_percent: Option<f64>,
    pub overdue_tasks: i64,
    pub milestones_total: i64,
    pub milestones_done: i64,
    pub critical_tasks: i64,
    pub cost: CostSummary,
    pub risk_matrix: RiskMatrix,
    pub open_issues_by_severity: BTreeMap<String, i64>,
}
