//! Per-subject health dashboard.
//!
//! Combines the subject's ideal heart metrics, their latest reading, a
//! seven-day aggregate and condition advice into one response.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::ideal_metrics::{
    compute_ideal_metrics, condition_risk_notes, IdealHeartMetrics, SubjectProfile,
};
use crate::types::{HeartRateSample, RecordStatus, Timestamp};

/// Days covered by the dashboard aggregate.
pub const DASHBOARD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestRecord {
    pub heart_rate: f64,
    pub status: RecordStatus,
    pub recorded_at: Timestamp,
}

/// Aggregate over the dashboard window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// Rounded to a whole bpm.
    pub avg_heart_rate: i64,
    pub min_heart_rate: f64,
    pub max_heart_rate: f64,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDashboard {
    pub profile: SubjectProfile,
    pub heart_metrics: IdealHeartMetrics,
    pub latest_record: Option<LatestRecord>,
    pub stats_7d: Option<WeeklyStats>,
    pub risk_notes: Vec<String>,
    pub generated_at: Timestamp,
}

/// Assemble a dashboard.
///
/// `latest` is the subject's newest reading regardless of age; `recent`
/// may be any superset of the window, readings older than seven days
/// before `now` are ignored. Non-finite values are left out of the
/// aggregate, which is `None` when nothing remains.
pub fn build_dashboard(
    profile: &SubjectProfile,
    latest: Option<&HeartRateSample>,
    recent: &[HeartRateSample],
    now: Timestamp,
) -> HealthDashboard {
    let cutoff = now
        .checked_sub_signed(Duration::days(DASHBOARD_WINDOW_DAYS))
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
    let values: Vec<f64> = recent
        .iter()
        .filter(|s| s.recorded_at >= cutoff && s.value.is_finite())
        .map(|s| s.value)
        .collect();

    HealthDashboard {
        profile: profile.clone(),
        heart_metrics: compute_ideal_metrics(profile),
        latest_record: latest.map(|s| LatestRecord {
            heart_rate: s.value,
            status: s.status,
            recorded_at: s.recorded_at,
        }),
        stats_7d: weekly_stats(&values),
        risk_notes: condition_risk_notes(&profile.conditions)
            .into_iter()
            .map(str::to_string)
            .collect(),
        generated_at: now,
    }
}

fn weekly_stats(values: &[f64]) -> Option<WeeklyStats> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(WeeklyStats {
        avg_heart_rate: (sum / values.len() as f64).round() as i64,
        min_heart_rate: values.iter().copied().fold(f64::INFINITY, f64::min),
        max_heart_rate: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        total_records: values.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::ideal_metrics::Gender;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 4, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_history() {
        let dashboard = build_dashboard(&SubjectProfile::default(), None, &[], now());
        assert!(dashboard.latest_record.is_none());
        assert!(dashboard.stats_7d.is_none());
        assert!(dashboard.risk_notes.is_empty());
        assert!(dashboard.heart_metrics.assumptions.is_some());
    }

    #[test]
    fn aggregates_only_the_last_week() {
        let samples = [
            HeartRateSample::new(71.0, now() - Duration::hours(1)),
            HeartRateSample::new(80.0, now() - Duration::days(2)),
            HeartRateSample::new(64.0, now() - Duration::days(6)),
            HeartRateSample::new(140.0, now() - Duration::days(9)),
        ];
        let dashboard = build_dashboard(
            &SubjectProfile::default(),
            samples.first(),
            &samples,
            now(),
        );
        let stats = dashboard.stats_7d.expect("stats");
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.avg_heart_rate, 72);
        assert_eq!(stats.min_heart_rate, 64.0);
        assert_eq!(stats.max_heart_rate, 80.0);
    }

    #[test]
    fn latest_record_may_predate_window() {
        let old = HeartRateSample::new(58.0, now() - Duration::days(30))
            .with_status(RecordStatus::Warning);
        let dashboard = build_dashboard(&SubjectProfile::default(), Some(&old), &[], now());
        let latest = dashboard.latest_record.expect("latest");
        assert_eq!(latest.heart_rate, 58.0);
        assert_eq!(latest.status, RecordStatus::Warning);
        assert!(dashboard.stats_7d.is_none());
    }

    #[test]
    fn profile_drives_metrics_and_notes() {
        let profile = SubjectProfile {
            age: Some(60.0),
            gender: Some(Gender::Female),
            weight: Some(70.0),
            conditions: vec!["Diabetes".to_string(), "unknown".to_string()],
        };
        let dashboard = build_dashboard(&profile, None, &[], now());
        assert_eq!(dashboard.heart_metrics, compute_ideal_metrics(&profile));
        assert_eq!(dashboard.risk_notes.len(), 1);
        assert!(dashboard.risk_notes[0].contains("blood glucose"));
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let samples = [
            HeartRateSample::new(f64::NAN, now()),
            HeartRateSample::new(90.0, now()),
        ];
        let dashboard =
            build_dashboard(&SubjectProfile::default(), None, &samples, now());
        assert_eq!(dashboard.stats_7d.expect("stats").total_records, 1);
    }
}
