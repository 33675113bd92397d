// Scheduling and capacity checks over plain values

use std::collections::HashMap;

use chrono::NaiveDate;
use pmis_backend::db::enums::DependencyType;
use pmis_backend::planning::{
    PlanningError,
    allocation::{AssignmentSpan, MAX_RANGE_DAYS, utilization, validate_range},
    kanban::{dense_positions, insert_at, without},
    progress::{ProgressSample, planned_progress, weighted_progress},
    schedule::{ScheduleLink, ScheduleTask, compute_schedule, parent_creates_cycle, would_create_cycle},
};
use uuid::Uuid;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn estimated(hours: f64) -> ScheduleTask {
    ScheduleTask {
        id: Uuid::new_v4(),
        planned_start: None,
        planned_end: None,
        estimated_hours: Some(hours),
        is_milestone: false,
    }
}

fn link(pred: &ScheduleTask, succ: &ScheduleTask, kind: DependencyType) -> ScheduleLink {
    ScheduleLink {
        predecessor_id: pred.id,
        successor_id: succ.id,
        kind,
        lag_days: 0,
    }
}

#[test]
fn estimate_only_chain_is_scheduled_from_fallback_start() {
    let design = estimated(16.0);
    let build = estimated(20.0);
    let launch = ScheduleTask {
        is_milestone: true,
        ..estimated(0.0)
    };
    let links = vec![
        link(&design, &build, DependencyType::FinishToStart),
        link(&build, &launch, DependencyType::FinishToStart),
    ];

    let schedule = compute_schedule(
        &[design.clone(), build.clone(), launch.clone()],
        &links,
        date("2026-03-02"),
    )
    .unwrap();

    assert_eq!(schedule.project_start, date("2026-03-02"));
    let by_id: HashMap<Uuid, _> = schedule.tasks.iter().map(|t| (t.id, t)).collect();
    assert_eq!(by_id[&design.id].duration_days, 2);
    assert_eq!(by_id[&build.id].duration_days, 3);
    assert_eq!(by_id[&build.id].early_start, date("2026-03-04"));
    assert_eq!(by_id[&build.id].early_finish, date("2026-03-06"));
    assert_eq!(by_id[&launch.id].duration_days, 0);
    assert!(schedule.tasks.iter().all(|t| t.is_critical));
    assert_eq!(schedule.critical_path, vec![design.id, build.id, launch.id]);
}

#[test]
fn dependency_cycle_is_rejected() {
    let a = estimated(8.0);
    let b = estimated(8.0);
    let links = vec![
        link(&a, &b, DependencyType::FinishToStart),
        link(&b, &a, DependencyType::StartToStart),
    ];
    let err = compute_schedule(&[a, b], &links, date("2026-01-05")).unwrap_err();
    assert_eq!(err, PlanningError::Cycle(2));
}

#[test]
fn cycle_checks_before_inserting_edges() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let edges = vec![(a, b), (b, c)];
    assert!(would_create_cycle(&edges, c, a));
    assert!(would_create_cycle(&edges, a, a));
    assert!(!would_create_cycle(&edges, a, c));

    let parents = HashMap::from([(a, None), (b, Some(a)), (c, Some(b))]);
    assert!(parent_creates_cycle(&parents, a, c));
    assert!(!parent_creates_cycle(&parents, c, a));
}

#[test]
fn utilization_flags_over_allocated_days() {
    let spans = [
        AssignmentSpan {
            allocation_percent: 100,
            start: date("2026-05-04"),
            end: date("2026-05-06"),
        },
        AssignmentSpan {
            allocation_percent: 50,
            start: date("2026-05-06"),
            end: date("2026-05-08"),
        },
    ];
    let report = utilization(
        Uuid::new_v4(),
        "Backend engineer",
        8.0,
        &spans,
        date("2026-05-04"),
        date("2026-05-08"),
    )
    .unwrap();

    // 3 x 8h + 3 x 4h over 5 x 8h of capacity
    assert_eq!(report.total_load_hours, 36.0);
    assert_eq!(report.total_capacity_hours, 40.0);
    assert_eq!(report.utilization_percent, 90.0);
    assert_eq!(report.peak_load_hours, 12.0);
    assert_eq!(report.over_allocated_days.len(), 1);
    assert_eq!(report.over_allocated_days[0].date, date("2026-05-06"));
}

#[test]
fn utilization_window_is_bounded() {
    let from = date("2026-01-01");
    assert!(validate_range(from, from).is_ok());
    assert!(validate_range(from, from + chrono::Duration::days(MAX_RANGE_DAYS - 1)).is_ok());
    assert_eq!(
        validate_range(from, from + chrono::Duration::days(MAX_RANGE_DAYS)),
        Err(PlanningError::InvalidRange)
    );
    assert_eq!(validate_range(from, date("2025-12-31")), Err(PlanningError::InvalidRange));
}

#[test]
fn kanban_columns_stay_dense() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let column = insert_at(&[a, b], c, 1);
    assert_eq!(column, vec![a, c, b]);
    assert_eq!(insert_at(&[a, b], c, 99), vec![a, b, c]);

    let remaining = without(&column, a);
    assert_eq!(dense_positions(&remaining), vec![(c, 0), (b, 1)]);
}

#[test]
fn progress_rollups() {
    let sample = |progress, hours, start: &str, end: &str| ProgressSample {
        progress,
        estimated_hours: hours,
        start: Some(date(start)),
        end: Some(date(end)),
    };
    let samples = [
        sample(100, Some(30.0), "2026-02-02", "2026-02-06"),
        sample(0, Some(10.0), "2026-02-09", "2026-02-13"),
    ];
    assert_eq!(weighted_progress(&samples), 75.0);
    assert_eq!(weighted_progress(&[]), 0.0);

    let unweighted = [sample(100, None, "2026-02-02", "2026-02-06"), sample(0, Some(10.0), "2026-02-09", "2026-02-13")];
    assert_eq!(weighted_progress(&unweighted), 50.0);

    assert!(planned_progress(&[ProgressSample { progress: 0, estimated_hours: None, start: None, end: None }], date("2026-02-02")).is_none());
    assert!(planned_progress(&samples, date("2026-03-01")).is_some());
}
