use chrono::{Duration, NaiveDate, Utc};
use pmis_backend::db::enums::TimeEntryStatus;
use pmis_backend::db::models::TimeEntry;
use pmis_backend::services::time_entries_service::{build_timesheet, iso_week_start};
use pmis_backend::validation::time_entry::{validate_daily_total, validate_hours, validate_work_date};
use uuid::Uuid;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn entry(user_id: Uuid, work_date: &str, hours: f64, billable: bool) -> TimeEntry {
    TimeEntry {
        id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        user_id,
        task_id: Uuid::new_v4(),
        resource_id: None,
        work_date: date(work_date),
        hours,
        billable,
        notes: None,
        status: TimeEntryStatus::Draft,
        reviewed_by: None,
        reviewed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn week_starts_on_monday() {
    assert_eq!(iso_week_start(date("2026-10-18")), date("2026-10-12"));
    assert_eq!(iso_week_start(date("2026-10-12")), date("2026-10-12"));
    assert_eq!(iso_week_start(date("2027-01-01")), date("2026-12-28"));
}

#[test]
fn timesheet_totals_one_week_for_one_user() {
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    let entries = vec![
        entry(user, "2026-10-14", 2.5, true),
        entry(user, "2026-10-12", 4.0, false),
        entry(user, "2026-10-14", 1.25, true),
        entry(user, "2026-10-19", 8.0, true),
        entry(other, "2026-10-13", 6.0, true),
    ];

    let sheet = build_timesheet(user, date("2026-10-12"), entries);
    assert_eq!(sheet.week_end, date("2026-10-18"));
    assert_eq!(sheet.days.len(), 7);
    assert_eq!(sheet.days[0].hours, 4.0);
    assert_eq!(sheet.days[1].hours, 0.0);
    assert_eq!(sheet.days[2].hours, 3.75);
    assert_eq!(sheet.total_hours, 7.75);
    assert_eq!(sheet.billable_hours, 3.75);
    assert_eq!(sheet.entries.len(), 3);
    assert_eq!(sheet.entries[0].work_date, date("2026-10-12"));
}

#[test]
fn hours_are_quarter_hours_within_a_day() {
    assert!(validate_hours(0.25).is_ok());
    assert!(validate_hours(24.0).is_ok());
    assert!(validate_hours(0.0).is_err());
    assert!(validate_hours(24.25).is_err());
    assert!(validate_hours(1.1).is_err());
    assert!(validate_hours(f64::NAN).is_err());

    assert!(validate_daily_total(20.0, 4.0).is_ok());
    let err = validate_daily_total(20.0, 4.25).unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
}

#[test]
fn future_work_dates_are_rejected() {
    let today = Utc::now().date_naive();
    assert!(validate_work_date(today).is_ok());
    assert!(validate_work_date(today + Duration::days(1)).is_err());
}

#[test]
fn only_draft_and_rejected_entries_are_editable() {
    assert!(TimeEntryStatus::Draft.is_editable());
    assert!(TimeEntryStatus::Rejected.is_editable());
    assert!(!TimeEntryStatus::Submitted.is_editable());
    assert!(!TimeEntryStatus::Approved.is_editable());
}
