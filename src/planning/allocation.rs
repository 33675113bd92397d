use chrono::NaiveDate;
use uuid::Uuid;

use super::PlanningError;
use crate::db::models::{DailyLoad, ResourceUtilization};

/// Longest window a utilization report may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

/// One assignment of a resource to a task with known dates.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentSpan {
    pub allocation_percent: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AssignmentSpan {
    fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

pub fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<(), PlanningError> {
    let days = (to - from).num_days();
    if days < 0 || days >= MAX_RANGE_DAYS {
        return Err(PlanningError::InvalidRange);
    }
    Ok(())
}

/// Daily load for a resource across `[from, to]`.
///
/// Each assignment contributes `allocation% x capacity` hours on every day its
/// task spans.
pub fn daily_loads(
    capacity_hours: f64,
    spans: &[AssignmentSpan],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<DailyLoad> {
    from.iter_days()
        .take_while(|day| *day <= to)
        .map(|date| {
            let load_hours: f64 = spans
                .iter()
                .filter(|span| span.covers(date))
                .map(|span| capacity_hours * span.allocation_percent as f64 / 100.0)
                .sum();
            DailyLoad {
                date,
                load_hours: round2(load_hours),
                capacity_hours,
                over_allocated: load_hours > capacity_hours + 1e-9,
            }
        })
        .collect()
}

pub fn utilization(
    resource_id: Uuid,
    resource_name: &str,
    capacity_hours: f64,
    spans: &[AssignmentSpan],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<ResourceUtilization, PlanningError> {
    validate_range(from, to)?;

    let days = daily_loads(capacity_hours, spans, from, to);
    let total_load_hours: f64 = days.iter().map(|d| d.load_hours).sum();
    let total_capacity_hours = capacity_hours * days.len() as f64;
    let peak_load_hours = days.iter().map(|d| d.load_hours).fold(0.0, f64::max);
    let utilization_percent = if total_capacity_hours > 0.0 {
        round2(total_load_hours / total_capacity_hours * 100.0)
    } else {
        0.0
    };

    Ok(ResourceUtilization {
        resource_id,
        resource_name: resource_name.to_string(),
        capacity_hours_per_day: capacity_hours,
        total_load_hours: round2(total_load_hours),
        total_capacity_hours: round2(total_capacity_hours),
        utilization_percent,
        peak_load_hours,
        over_allocated_days: days.into_iter().filter(|d| d.over_allocated).collect(),
    })
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn span(percent: i32, start: &str, end: &str) -> AssignmentSpan {
        AssignmentSpan {
            allocation_percent: percent,
            start: date(start),
            end: date(end),
        }
    }

    #[test]
    fn overlapping_assignments_over_allocate() {
        let spans = [span(60, "2026-04-01", "2026-04-03"), span(50, "2026-04-03", "2026-04-04")];
        let report = utilization(
            Uuid::new_v4(),
            "Welder crew",
            8.0,
            &spans,
            date("2026-04-01"),
            date("2026-04-05"),
        )
        .unwrap();

        // 4.8 + 4.8 + 8.8 + 4.0 + 0
        assert_eq!(report.total_load_hours, 22.4);
        assert_eq!(report.total_capacity_hours, 40.0);
        assert_eq!(report.utilization_percent, 56.0);
        assert_eq!(report.peak_load_hours, 8.8);
        assert_eq!(report.over_allocated_days.len(), 1);
        assert_eq!(report.over_allocated_days[0].date, date("2026-04-03"));
    }

    #[test]
    fn full_allocation_is_not_over_allocated() {
        let loads = daily_loads(8.0, &[span(100, "2026-04-01", "2026-04-01")], date("2026-04-01"), date("2026-04-01"));
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].load_hours, 8.0);
        assert!(!loads[0].over_allocated);
    }

    #[test]
    fn rejects_inverted_and_oversized_ranges() {
        assert_eq!(
            validate_range(date("2026-04-02"), date("2026-04-01")),
            Err(PlanningError::InvalidRange)
        );
        assert!(validate_range(date("2026-01-01"), date("2027-06-01")).is_err());
        assert!(validate_range(date("2026-01-01"), date("2026-01-01")).is_ok());
    }
}
