//! Scheduling and capacity logic that works on plain values, independent of
//! the database layer.

pub mod allocation;
pub mod kanban;
pub mod progress;
pub mod schedule;

use thiserror::Error;
use uuid::Uuid;

use crate::{db::models::api::error_codes, error::AppError};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanningError {
    #[error("dependency graph contains a cycle through {0} task(s)")]
    Cycle(usize),
    #[error("dependency references unknown task {0}")]
    UnknownTask(Uuid),
    #[error("date range is empty or too long")]
    InvalidRange,
}

impl From<PlanningError> for AppError {
    fn from(err: PlanningError) -> Self {
        match err {
            PlanningError::Cycle(_) => AppError::conflict_with_code(
                err.to_string(),
                None,
                error_codes::DEPENDENCY_CYCLE,
            ),
            PlanningError::UnknownTask(_) => AppError::not_found("Task"),
            PlanningError::InvalidRange => {
                AppError::validation_field(err.to_string(), "to", "INVALID_DATE_RANGE")
            }
        }
    }
}
