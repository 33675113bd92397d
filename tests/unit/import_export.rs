// Task CSV export and import planning

use chrono::{NaiveDate, Utc};
use pmis_backend::db::enums::{DependencyType, Priority, TaskStatus};
use pmis_backend::db::models::{Task, TaskDependency};
use pmis_backend::error::AppError;
use pmis_backend::services::import_export_service::{
    check_bundle_tasks, parse_tasks_csv, plan_task_import, write_tasks_csv,
};
use uuid::Uuid;

const HEADER: &str = "wbs_code,name,description,status,priority,start_date,end_date,progress,estimated_hours,parent_wbs,milestone";

fn existing_task(project_id: Uuid, wbs: &str, status: TaskStatus, position: i32) -> Task {
    Task {
        id: Uuid::new_v4(),
        project_id,
        parent_id: None,
        wbs_code: wbs.to_string(),
        name: format!("Task {}", wbs),
        description: None,
        status,
        priority: Priority::Medium,
        start_date: None,
        end_date: None,
        progress: 0,
        estimated_hours: None,
        position,
        is_milestone: false,
        created_by: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn children_are_planned_after_their_parents() {
    let csv = format!(
        "{}\n2.1,Pour slab,,todo,high,2026-04-01,2026-04-03,,16,2,\n2,Foundations,,,,,,,,,\n2.2,Cure,,done,,,,,,2,no\n",
        HEADER
    );
    let rows = parse_tasks_csv(&csv).unwrap();
    assert_eq!(rows.iter().map(|(line, _)| *line).collect::<Vec<_>>(), vec![2, 3, 4]);

    let project_id = Uuid::new_v4();
    let planned = plan_task_import(project_id, Uuid::new_v4(), &[], &rows).unwrap();
    let order: Vec<&str> = planned.iter().map(|t| t.wbs_code.as_str()).collect();
    assert_eq!(order[0], "2");

    let parent = &planned[0];
    let slab = planned.iter().find(|t| t.wbs_code == "2.1").unwrap();
    let cure = planned.iter().find(|t| t.wbs_code == "2.2").unwrap();
    assert_eq!(slab.parent_id, Some(parent.id));
    assert_eq!(slab.priority, Priority::High);
    assert_eq!(slab.start_date, NaiveDate::from_ymd_opt(2026, 4, 1));
    assert_eq!(slab.estimated_hours, Some(16.0));
    assert_eq!(cure.progress, 100);
    assert!(planned.iter().all(|t| t.project_id == project_id));
}

#[test]
fn positions_continue_after_existing_columns() {
    let project_id = Uuid::new_v4();
    let existing = vec![
        existing_task(project_id, "1", TaskStatus::Todo, 0),
        existing_task(project_id, "1.1", TaskStatus::Todo, 1),
    ];
    let csv = format!("{}\n1.2,Survey,,,,,,,,1,\n", HEADER);
    let rows = parse_tasks_csv(&csv).unwrap();
    let planned = plan_task_import(project_id, Uuid::new_v4(), &existing, &rows).unwrap();

    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].position, 2);
    assert_eq!(planned[0].parent_id, Some(existing[0].id));
}

#[test]
fn every_bad_row_is_reported() {
    let project_id = Uuid::new_v4();
    let existing = vec![existing_task(project_id, "1", TaskStatus::Todo, 0)];
    let csv = format!(
        "{}\n1,Duplicate,,,,,,,,,\n3,,,,,,,,,,\n4,Dates,,,,2026-05-10,2026-05-01,,,,\n5,Orphan,,,,,,,,9,\n",
        HEADER
    );
    let rows = parse_tasks_csv(&csv).unwrap();
    let errors = plan_task_import(project_id, Uuid::new_v4(), &existing, &rows).unwrap_err();

    let codes: Vec<&str> = errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["DUPLICATE_WBS", "REQUIRED", "INVALID_DATE_RANGE", "INVALID_PARENT"]);
    assert!(errors[0].message.starts_with("Row 2:"));
    assert!(errors[3].message.starts_with("Row 5:"));
}

#[test]
fn header_problems_fail_the_whole_file() {
    let errors = parse_tasks_csv("name,status\nFoo,todo\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, "MISSING_COLUMN");
    assert_eq!(errors[0].field.as_deref(), Some("wbs_code"));

    let empty = parse_tasks_csv(&format!("{}\n", HEADER)).unwrap_err();
    assert_eq!(empty[0].code, "EMPTY_IMPORT");
}

#[test]
fn parent_cycles_inside_the_file_are_rejected() {
    let csv = format!("{}\n7,A,,,,,,,,8,\n8,B,,,,,,,,7,\n", HEADER);
    let rows = parse_tasks_csv(&csv).unwrap();
    let errors = plan_task_import(Uuid::new_v4(), Uuid::new_v4(), &[], &rows).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.code == "PARENT_CYCLE"));
}

#[test]
fn exported_csv_reimports_into_an_empty_project() {
    let project_id = Uuid::new_v4();
    let parent = existing_task(project_id, "1", TaskStatus::InProgress, 0);
    let mut child = existing_task(project_id, "1.10", TaskStatus::Todo, 0);
    child.parent_id = Some(parent.id);
    let mut sibling = existing_task(project_id, "1.9", TaskStatus::Todo, 1);
    sibling.parent_id = Some(parent.id);
    sibling.is_milestone = true;

    let csv = write_tasks_csv(&[child, parent, sibling]).unwrap();
    assert!(csv.starts_with(HEADER));

    let rows = parse_tasks_csv(&csv).unwrap();
    let order: Vec<&str> = rows.iter().map(|(_, row)| row.wbs_code.as_str()).collect();
    assert_eq!(order, vec!["1", "1.9", "1.10"]);
    assert_eq!(rows[2].1.parent_wbs.as_deref(), Some("1"));
    assert_eq!(rows[1].1.milestone.as_deref(), Some("true"));

    let target = Uuid::new_v4();
    let planned = plan_task_import(target, Uuid::new_v4(), &[], &rows).unwrap();
    assert_eq!(planned.len(), 3);
    assert_eq!(planned[0].status, TaskStatus::InProgress);
    assert!(planned[1].is_milestone);
}

fn link(project_id: Uuid, predecessor: &Task, successor: &Task) -> TaskDependency {
    TaskDependency {
        id: Uuid::new_v4(),
        project_id,
        predecessor_id: predecessor.id,
        successor_id: successor.id,
        dependency_type: DependencyType::FinishToStart,
        lag_days: 0,
        created_at: Utc::now(),
    }
}

fn conflict_code(err: AppError) -> Option<String> {
    match err {
        AppError::Conflict { code, .. } => code,
        other => panic!("expected a conflict, got {:?}", other),
    }
}

#[test]
fn bundle_with_a_sound_plan_passes() {
    let project_id = Uuid::new_v4();
    let parent = existing_task(project_id, "1", TaskStatus::Todo, 0);
    let mut child = existing_task(project_id, "1.1", TaskStatus::Done, 0);
    child.parent_id = Some(parent.id);
    child.progress = 40;
    let dangling = TaskDependency {
        predecessor_id: Uuid::new_v4(),
        ..link(project_id, &parent, &child)
    };

    let links = vec![link(project_id, &parent, &child), dangling];
    assert!(check_bundle_tasks(&[parent, child], &links).is_ok());
}

#[test]
fn bundle_dependency_cycle_is_a_conflict() {
    let project_id = Uuid::new_v4();
    let a = existing_task(project_id, "1", TaskStatus::Todo, 0);
    let b = existing_task(project_id, "2", TaskStatus::Todo, 1);
    let c = existing_task(project_id, "3", TaskStatus::Todo, 2);
    let links = vec![link(project_id, &a, &b), link(project_id, &b, &c), link(project_id, &c, &a)];

    let err = check_bundle_tasks(&[a.clone(), b.clone(), c], &links).unwrap_err();
    assert_eq!(conflict_code(err).as_deref(), Some("DEPENDENCY_CYCLE"));

    let err = check_bundle_tasks(&[a.clone()], &[link(project_id, &a, &a)]).unwrap_err();
    assert_eq!(conflict_code(err).as_deref(), Some("DEPENDENCY_CYCLE"));

    let twice = vec![link(project_id, &a, &b), link(project_id, &a, &b)];
    let err = check_bundle_tasks(&[a, b], &twice).unwrap_err();
    assert_eq!(conflict_code(err).as_deref(), Some("DEPENDENCY_EXISTS"));
}

#[test]
fn bundle_parent_loop_is_a_conflict() {
    let project_id = Uuid::new_v4();
    let mut a = existing_task(project_id, "1", TaskStatus::Todo, 0);
    let mut b = existing_task(project_id, "2", TaskStatus::Todo, 1);
    a.parent_id = Some(b.id);
    b.parent_id = Some(a.id);

    let err = check_bundle_tasks(&[a.clone(), b], &[]).unwrap_err();
    assert_eq!(conflict_code(err).as_deref(), Some("PARENT_CYCLE"));

    a.parent_id = Some(a.id);
    let err = check_bundle_tasks(&[a], &[]).unwrap_err();
    assert_eq!(conflict_code(err).as_deref(), Some("PARENT_CYCLE"));
}

#[test]
fn bundle_tasks_get_the_regular_field_checks() {
    let project_id = Uuid::new_v4();

    let mut blank = existing_task(project_id, "1", TaskStatus::Todo, 0);
    blank.name = "   ".to_string();
    let err = check_bundle_tasks(&[blank], &[]).unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

    let mut bad_code = existing_task(project_id, "1", TaskStatus::Todo, 0);
    bad_code.wbs_code = "1..a b".to_string();
    assert!(check_bundle_tasks(&[bad_code], &[]).is_err());

    let mut overrun = existing_task(project_id, "1", TaskStatus::InProgress, 0);
    overrun.progress = 140;
    assert!(check_bundle_tasks(&[overrun], &[]).is_err());

    let mut reversed = existing_task(project_id, "1", TaskStatus::Todo, 0);
    reversed.start_date = NaiveDate::from_ymd_opt(2026, 5, 2);
    reversed.end_date = NaiveDate::from_ymd_opt(2026, 5, 1);
    assert!(check_bundle_tasks(&[reversed], &[]).is_err());
}
