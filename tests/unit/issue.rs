// Issue workflow rules

use chrono::Utc;
use pmis_backend::db::enums::{IssueSeverity, IssueStatus, Priority};
use pmis_backend::db::models::{Issue, IssueTransitionRequest};
use pmis_backend::services::issues_service::{should_alert_assignee, transition_changes};
use pmis_backend::validation::issue::{validate_issue_title, validate_resolution};
use uuid::Uuid;

fn issue(status: IssueStatus, severity: IssueSeverity, assignee_id: Option<Uuid>) -> Issue {
    Issue {
        id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        title: "Crane inspection overdue".to_string(),
        description: None,
        severity,
        priority: Priority::High,
        status,
        reporter_id: Uuid::new_v4(),
        assignee_id,
        task_id: None,
        risk_id: None,
        due_date: None,
        resolution: None,
        resolved_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn request(status: IssueStatus, resolution: Option<&str>) -> IssueTransitionRequest {
    IssueTransitionRequest {
        status,
        resolution: resolution.map(str::to_string),
    }
}

#[test]
fn resolving_records_resolution_and_timestamp() {
    let open = issue(IssueStatus::InProgress, IssueSeverity::Major, None);
    let changes = transition_changes(&open, &request(IssueStatus::Resolved, Some("  Re-inspected  "))).unwrap();
    assert_eq!(changes.status, Some(IssueStatus::Resolved));
    assert_eq!(changes.resolution, Some(Some("Re-inspected".to_string())));
    assert!(matches!(changes.resolved_at, Some(Some(_))));
}

#[test]
fn reopening_clears_resolution() {
    let resolved = issue(IssueStatus::Resolved, IssueSeverity::Minor, None);
    let changes = transition_changes(&resolved, &request(IssueStatus::Open, None)).unwrap();
    assert_eq!(changes.resolution, Some(None));
    assert_eq!(changes.resolved_at, Some(None));
}

#[test]
fn illegal_transitions_conflict() {
    let closed = issue(IssueStatus::Closed, IssueSeverity::Minor, None);
    let err = transition_changes(&closed, &request(IssueStatus::Resolved, Some("done"))).unwrap_err();
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

    assert!(!IssueStatus::InProgress.can_transition_to(IssueStatus::Closed));
    assert!(IssueStatus::Closed.can_transition_to(IssueStatus::Open));
    assert!(IssueStatus::InProgress.is_open());
    assert!(!IssueStatus::Resolved.is_open());
}

#[test]
fn resolution_is_required_when_resolving() {
    let open = issue(IssueStatus::Open, IssueSeverity::Minor, None);
    assert!(transition_changes(&open, &request(IssueStatus::Resolved, None)).is_err());
    assert!(transition_changes(&open, &request(IssueStatus::Resolved, Some("   "))).is_err());
    assert!(validate_resolution(Some("Replaced the part")).is_ok());
}

#[test]
fn critical_assignment_alerts_once() {
    let assignee = Some(Uuid::new_v4());
    let critical = issue(IssueStatus::Open, IssueSeverity::Critical, assignee);
    assert!(should_alert_assignee(None, &critical));
    assert!(!should_alert_assignee(Some(&critical), &critical));

    let unassigned = issue(IssueStatus::Open, IssueSeverity::Critical, None);
    assert!(!should_alert_assignee(None, &unassigned));

    let mut escalated = issue(IssueStatus::Open, IssueSeverity::Major, assignee);
    let before = escalated.clone();
    escalated.severity = IssueSeverity::Critical;
    assert!(should_alert_assignee(Some(&before), &escalated));
}

#[test]
fn title_rules() {
    assert!(validate_issue_title("Leak on level 3").is_ok());
    assert!(validate_issue_title("   ").is_err());
    assert!(validate_issue_title(&"a".repeat(513)).is_err());
}
