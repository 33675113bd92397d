use chrono::NaiveDate;

/// Inputs for project progress roll-ups.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSample {
    pub progress: i32,
    pub estimated_hours: Option<f64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Progress weighted by estimated hours when every task has a positive
/// estimate, otherwise the plain mean. Empty input is 0.
pub fn weighted_progress(samples: &[ProgressSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let weights: Option<Vec<f64>> = samples
        .iter()
        .map(|s| s.estimated_hours.filter(|h| *h > 0.0))
        .collect();

    let value = match weights {
        Some(weights) => {
            let total: f64 = weights.iter().sum();
            samples
                .iter()
                .zip(&weights)
                .map(|(s, w)| s.progress as f64 * w)
                .sum::<f64>()
                / total
        }
        None => samples.iter().map(|s| s.progress as f64).sum::<f64>() / samples.len() as f64,
    };

    round1(value)
}

/// Share of planned work that should be complete on `today`, assuming linear
/// burn across each task's dates. `None` when no task is dated.
pub fn planned_progress(samples: &[ProgressSample], today: NaiveDate) -> Option<f64> {
    let dated: Vec<(NaiveDate, NaiveDate)> = samples
        .iter()
        .filter_map(|s| match (s.start, s.end) {
            (Some(start), Some(end)) if end >= start => Some((start, end)),
            _ => None,
        })
        .collect();
    if dated.is_empty() {
        return None;
    }

    let total: f64 = dated
        .iter()
        .map(|(start, end)| {
            let length = ((*end - *start).num_days() + 1) as f64;
            let elapsed = ((today - *start).num_days() + 1).clamp(0, length as i64) as f64;
            elapsed / length
        })
        .sum();

    Some(round1(total / dated.len() as f64 * 100.0))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(progress: i32, hours: Option<f64>) -> ProgressSample {
        ProgressSample {
            progress,
            estimated_hours: hours,
            start: None,
            end: None,
        }
    }

    #[test]
    fn weights_by_estimate() {
        let samples = [sample(100, Some(30.0)), sample(0, Some(10.0))];
        assert_eq!(weighted_progress(&samples), 75.0);
    }

    #[test]
    fn falls_back_to_mean_when_estimates_missing() {
        let samples = [sample(100, Some(30.0)), sample(0, None)];
        assert_eq!(weighted_progress(&samples), 50.0);
        assert_eq!(weighted_progress(&[]), 0.0);
    }

    #[test]
    fn planned_progress_is_linear() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let samples = [
            ProgressSample {
                progress: 0,
                estimated_hours: None,
                start: Some(d("2026-02-01")),
                end: Some(d("2026-02-04")),
            },
            ProgressSample {
                progress: 0,
                estimated_hours: None,
                start: Some(d("2026-03-01")),
                end: Some(d("2026-03-02")),
            },
        ];
        // first task halfway through, second not started
        assert_eq!(planned_progress(&samples, d("2026-02-02")), Some(25.0));
        assert_eq!(planned_progress(&[sample(0, None)], d("2026-02-02")), None);
    }
}
