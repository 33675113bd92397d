use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    AppState,
    billing::RateTable,
    cache::{self, redis::{get_cache, set_cache}},
    db::enums::TaskStatus,
    db::models::dashboard::{CostSummary, OrganizationDashboard, ProjectDashboard},
    db::models::project::Project,
    db::models::risk::RiskMatrix,
    db::models::task::Task,
    db::repositories::{
        dependencies::DependenciesRepo, exchange_rates::ExchangeRateRepo, issues::IssuesRepo,
        projects::ProjectsRepo, resources::ResourcesRepo, risks::RisksRepo, tasks::TasksRepo,
        time_entries::TimeEntriesRepo,
    },
    error::AppError,
    middleware::rbac::Permission,
    planning::progress::{ProgressSample, planned_progress, weighted_progress},
    services::{
        context::RequestContext, projects_service::ProjectsService, tasks_service::build_gantt,
        time_entries_service::iso_week_start,
    },
};

pub const DASHBOARD_CACHE_TTL_SECS: u64 = 60;

/// Approved hours booked against one resource, with its rate.
#[derive(Debug, Clone)]
pub struct CostLine {
    pub hours: f64,
    pub rate_cents: i64,
    pub currency: String,
}

pub struct DashboardService;

impl DashboardService {
    pub fn organization(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        today: NaiveDate,
    ) -> Result<OrganizationDashboard, AppError> {
        ctx.require(Permission::ViewAll)?;

        let projects = ProjectsRepo::list_all(conn, ctx.organization_id)?;
        let mut projects_by_status = BTreeMap::new();
        let mut overdue_tasks = 0;
        for project in &projects {
            *projects_by_status.entry(project.status.to_string()).or_insert(0) += 1;
            overdue_tasks += count_overdue(&TasksRepo::list_by_project(conn, project.id)?, today);
        }
        let active_projects = projects_by_status.get("active").copied().unwrap_or(0);

        let mut open_risks_by_level = BTreeMap::new();
        for risk in RisksRepo::list_by_organization(conn, ctx.organization_id)? {
            if risk.status.is_open() {
                *open_risks_by_level.entry(risk.level().to_string()).or_insert(0) += 1;
            }
        }

        let issues = IssuesRepo::list_by_organization(conn, ctx.organization_id)?;
        let week_start = iso_week_start(today);
        let hours_this_week =
            TimeEntriesRepo::total_hours_between(conn, ctx.organization_id, week_start, week_start + Duration::days(6))?;

        Ok(OrganizationDashboard {
            organization_id: ctx.organization_id,
            projects_by_status,
            active_projects,
            overdue_tasks,
            open_risks_by_level,
            open_issues_by_severity: open_issues_by_severity(&issues),
            hours_this_week,
        })
    }

    pub fn project(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        base_currency: &str,
        today: NaiveDate,
    ) -> Result<ProjectDashboard, AppError> {
        ctx.require(Permission::ViewAll)?;
        let project = ProjectsService::find(conn, ctx, project_id)?;
        Self::compute_project(conn, &project, base_currency, today)
    }

    /// Project dashboard served from Redis when fresh. Access is checked
    /// before the cache is consulted.
    pub async fn project_cached(state: &AppState, ctx: &RequestContext, project_id: Uuid) -> Result<ProjectDashboard, AppError> {
        ctx.require(Permission::ViewAll)?;
        let mut conn = state.db.get()?;
        let project = ProjectsService::find(&mut conn, ctx, project_id)?;

        let key = cache::project_dashboard_key(&state.config.redis_channel_prefix, project.id);
        if let Some(cached) = get_cache::<ProjectDashboard>(&state.redis, &key).await {
            return Ok(cached);
        }

        let dashboard = Self::compute_project(
            &mut conn,
            &project,
            &state.config.exchange_rate_base_currency,
            Utc::now().date_naive(),
        )?;
        drop(conn);
        set_cache(&state.redis, &key, &dashboard, DASHBOARD_CACHE_TTL_SECS).await;
        Ok(dashboard)
    }

    fn compute_project(
        conn: &mut PgConnection,
        project: &Project,
        base_currency: &str,
        today: NaiveDate,
    ) -> Result<ProjectDashboard, AppError> {
        let tasks = TasksRepo::list_by_project(conn, project.id)?;
        let dependencies = DependenciesRepo::list_by_project(conn, project.id)?;

        let mut tasks_by_status = BTreeMap::new();
        for task in &tasks {
            *tasks_by_status.entry(task.status.to_string()).or_insert(0) += 1;
        }
        let samples: Vec<ProgressSample> = tasks
            .iter()
            .map(|t| ProgressSample {
                progress: t.progress,
                estimated_hours: t.estimated_hours,
                start: t.start_date,
                end: t.end_date,
            })
            .collect();
        let milestones: Vec<&Task> = tasks.iter().filter(|t| t.is_milestone).collect();
        let overdue_tasks = count_overdue(&tasks, today);
        let total_tasks = tasks.len() as i64;
        let milestones_total = milestones.len() as i64;
        let milestones_done = milestones.iter().filter(|t| t.status == TaskStatus::Done).count() as i64;

        let critical_tasks = build_gantt(project, tasks, dependencies, today)
            .map(|chart| chart.tasks.iter().filter(|t| t.is_critical).count() as i64)
            .unwrap_or(0);

        let risks = RisksRepo::list_by_project(conn, project.id, None)?;
        let issues = IssuesRepo::list_by_project(conn, project.id, None, None, None)?;

        let booked = TimeEntriesRepo::approved_hours_by_resource(conn, project.id)?;
        let mut hours_by_resource: HashMap<Uuid, f64> = HashMap::new();
        for (resource_id, hours) in booked {
            if let Some(resource_id) = resource_id {
                *hours_by_resource.entry(resource_id).or_insert(0.0) += hours;
            }
        }
        let resource_ids: Vec<Uuid> = hours_by_resource.keys().copied().collect();
        let lines: Vec<CostLine> = ResourcesRepo::find_many(conn, &resource_ids)?
            .into_iter()
            .map(|resource| CostLine {
                hours: hours_by_resource.get(&resource.id).copied().unwrap_or(0.0),
                rate_cents: resource.hourly_rate_cents,
                currency: resource.currency,
            })
            .collect();
        let rates = RateTable::from_rows(base_currency, &ExchangeRateRepo::list_for_base(conn, base_currency)?);

        Ok(ProjectDashboard {
            project_id: project.id,
            tasks_by_status,
            total_tasks,
            progress_percent: weighted_progress(&samples),
            planned_progress_percent: planned_progress(&samples, today),
            overdue_tasks,
            milestones_total,
            milestones_done,
            critical_tasks,
            cost: cost_summary(project.budget_cents, &project.currency, &lines, &rates),
            risk_matrix: RiskMatrix::from_risks(&risks),
            open_issues_by_severity: open_issues_by_severity(&issues),
        })
    }
}

/// Tasks past their end date that are not done.
pub fn count_overdue(tasks: &[Task], today: NaiveDate) -> i64 {
    tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done && t.end_date.is_some_and(|end| end < today))
        .count() as i64
}

fn open_issues_by_severity(issues: &[crate::db::models::issue::Issue]) -> BTreeMap<String, i64> {
    let mut counts = BTreeMap::new();
    for issue in issues.iter().filter(|i| i.status.is_open()) {
        *counts.entry(issue.severity.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Actual cost in the project currency. Lines whose currency has no rate
/// are left out and counted in `unconverted_entries`.
pub fn cost_summary(budget_cents: i64, currency: &str, lines: &[CostLine], rates: &RateTable) -> CostSummary {
    let mut actual_cost_cents = 0i64;
    let mut unconverted_entries = 0u32;

    for line in lines {
        let Ok(hours) = Decimal::try_from(line.hours) else {
            unconverted_entries += 1;
            continue;
        };
        let cost = (hours * Decimal::from(line.rate_cents)).round();
        let Ok(cost_cents) = i64::try_from(cost) else {
            unconverted_entries += 1;
            continue;
        };
        match rates.convert_cents(cost_cents, &line.currency, currency) {
            Ok(converted) => actual_cost_cents += converted,
            Err(_) => unconverted_entries += 1,
        }
    }

    let budget_consumed_percent = if budget_cents > 0 {
        (actual_cost_cents as f64 / budget_cents as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    CostSummary {
        currency: currency.to_string(),
        budget_cents,
        actual_cost_cents,
        variance_cents: budget_cents - actual_cost_cents,
        budget_consumed_percent,
        unconverted_entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(hours: f64, rate_cents: i64, currency: &str) -> CostLine {
        CostLine {
            hours,
            rate_cents,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn cost_converts_into_project_currency() {
        let mut rates = RateTable::new("USD");
        rates.insert("EUR", dec!(0.5));

        // 10h x $50 = $500, 4h x EUR 25 = EUR 100 = $200
        let lines = vec![line(10.0, 5_000, "USD"), line(4.0, 2_500, "EUR")];
        let summary = cost_summary(100_000, "USD", &lines, &rates);

        assert_eq!(summary.actual_cost_cents, 70_000);
        assert_eq!(summary.variance_cents, 30_000);
        assert_eq!(summary.budget_consumed_percent, 70.0);
        assert_eq!(summary.unconverted_entries, 0);
    }

    #[test]
    fn missing_rates_are_counted_not_guessed() {
        let rates = RateTable::new("USD");
        let lines = vec![line(2.0, 1_000, "USD"), line(3.0, 1_000, "JPY")];
        let summary = cost_summary(0, "USD", &lines, &rates);

        assert_eq!(summary.actual_cost_cents, 2_000);
        assert_eq!(summary.unconverted_entries, 1);
        assert_eq!(summary.budget_consumed_percent, 0.0);
        assert_eq!(summary.variance_cents, -2_000);
    }
}
