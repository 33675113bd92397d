use chrono::Utc;
use pmis_backend::db::enums::{ProjectPhase, ProjectStatus, RiskLevel, RiskStatus};
use pmis_backend::db::models::{Project, Risk};
use pmis_backend::services::risks_service::{became_critical, critical_risk_message};
use pmis_backend::validation::risk::validate_rating;
use uuid::Uuid;

fn risk(probability: i32, impact: i32, status: RiskStatus) -> Risk {
    Risk {
        id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        title: "Steel delivery delay".to_string(),
        description: None,
        category: Some("supply".to_string()),
        probability,
        impact,
        status,
        owner_id: None,
        mitigation_plan: None,
        due_date: None,
        created_by: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn level_follows_score_bands() {
    assert_eq!(risk(1, 4, RiskStatus::Identified).level(), RiskLevel::Low);
    assert_eq!(risk(3, 3, RiskStatus::Identified).level(), RiskLevel::Medium);
    assert_eq!(risk(2, 5, RiskStatus::Identified).level(), RiskLevel::High);
    assert_eq!(risk(4, 4, RiskStatus::Identified).level(), RiskLevel::High);
    assert_eq!(risk(4, 5, RiskStatus::Identified).level(), RiskLevel::Critical);
    assert_eq!(risk(5, 5, RiskStatus::Identified).score(), 25);
}

#[test]
fn critical_alert_fires_on_entering_critical() {
    let high = risk(4, 4, RiskStatus::Assessed);
    let critical = risk(5, 4, RiskStatus::Assessed);
    assert!(became_critical(None, &critical));
    assert!(became_critical(Some(&high), &critical));
    assert!(!became_critical(Some(&critical), &critical));

    let closed = risk(5, 5, RiskStatus::Closed);
    assert!(!became_critical(None, &closed));
    assert!(became_critical(Some(&closed), &risk(5, 5, RiskStatus::Mitigating)));
}

#[test]
fn ratings_are_one_to_five() {
    assert!(validate_rating("probability", 1).is_ok());
    assert!(validate_rating("impact", 5).is_ok());
    assert!(validate_rating("impact", 0).is_err());
    assert!(validate_rating("probability", 6).is_err());
}

#[test]
fn alert_message_names_project_and_score() {
    let project = Project {
        id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        code: "TWR-1".to_string(),
        name: "Tower".to_string(),
        description: None,
        phase: ProjectPhase::Construction,
        status: ProjectStatus::Active,
        start_date: None,
        end_date: None,
        budget_cents: 0,
        currency: "USD".to_string(),
        manager_id: None,
        created_by: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let message = critical_risk_message(&project, &risk(5, 4, RiskStatus::Identified));
    assert!(message.starts_with("[TWR-1] Critical risk: Steel delivery delay"));
    assert!(message.ends_with("score 20)"));
}
