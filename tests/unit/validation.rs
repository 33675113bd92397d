// Field validation shared by the REST handlers

use axum::http::StatusCode;
use chrono::NaiveDate;
use pmis_backend::validation::{
    document::{validate_checksum, validate_file_name, validate_size},
    project::{validate_budget, validate_currency, validate_date_range, validate_project_code},
    resource::{validate_allocation_percent, validate_capacity_hours},
    rules::{validate_e164_phone, validate_password_strength, validate_slug},
    task::{validate_progress, validate_wbs_code},
};

#[test]
fn project_fields() {
    assert!(validate_project_code("PRJ-001").is_ok());
    assert!(validate_project_code("PRJ 001").is_err());
    assert!(validate_project_code(&"A".repeat(17)).is_err());
    assert!(validate_budget(0).is_ok());
    assert!(validate_budget(-1).is_err());
    assert!(validate_currency("eur").is_ok());
    assert!(validate_currency("EURO").is_err());

    let start = NaiveDate::from_ymd_opt(2026, 1, 10);
    let end = NaiveDate::from_ymd_opt(2026, 1, 9);
    assert!(validate_date_range(start, start).is_ok());
    assert!(validate_date_range(start, None).is_ok());
    let err = validate_date_range(start, end).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn task_fields() {
    assert!(validate_wbs_code("1.2.10").is_ok());
    assert!(validate_wbs_code("A.1").is_ok());
    assert!(validate_wbs_code("1..2").is_err());
    assert!(validate_wbs_code("").is_err());
    assert!(validate_progress(100).is_ok());
    assert!(validate_progress(101).is_err());
}

#[test]
fn resource_fields() {
    assert!(validate_capacity_hours(7.5).is_ok());
    assert!(validate_capacity_hours(0.0).is_err());
    assert!(validate_allocation_percent(100).is_ok());
    assert!(validate_allocation_percent(0).is_err());
}

#[test]
fn document_fields() {
    assert!(validate_file_name("drawings-rev3.pdf").is_ok());
    assert!(validate_file_name("../etc/passwd").is_err());
    assert!(validate_size(-1).is_err());
    assert!(validate_checksum(&"ab".repeat(32)).is_ok());
    assert!(validate_checksum("xyz").is_err());
}

#[test]
fn account_rules() {
    assert!(validate_password_strength("Str0ngPass").is_ok());
    assert!(validate_password_strength("weakpass").is_err());
    assert!(validate_slug("acme-build").is_ok());
    assert!(validate_slug("-acme").is_err());
    assert!(validate_e164_phone("+14155550123").is_ok());
    assert!(validate_e164_phone("4155550123").is_err());
}
