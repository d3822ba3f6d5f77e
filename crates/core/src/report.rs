//! Heart-rate analysis report returned to clients.
//!
//! [`build_report`] wraps [`compute_stats`] with the query echo, rounded
//! figures, a variability note and a short sample preview.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::stats::{compute_stats, round_to, HrvQuality, TrendDirection};
use crate::types::{HeartRateSample, RecordStatus, Timestamp};

/// Default look-back window in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Default row cap per analysis.
pub const DEFAULT_SAMPLE_LIMIT: usize = 200;
/// Number of samples echoed back in the preview.
pub const PREVIEW_LEN: usize = 10;

const HIGH_VARIABILITY_NOTE: &str =
    "Large heart rate variability - possibly due to stress, intense activity or an abnormality.";
const VERY_LOW_VARIABILITY_NOTE: &str =
    "Very low variability - may be normal for athletes, otherwise consider a check-up.";

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Which samples to analyze: an explicit date range, or the last `days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisQuery {
    pub days: u32,
    pub limit: usize,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
}

impl Default for AnalysisQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_WINDOW_DAYS,
            limit: DEFAULT_SAMPLE_LIMIT,
            start_date: None,
            end_date: None,
        }
    }
}

/// Resolved time bounds for a sample fetch. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl AnalysisQuery {
    /// Explicit start/end dates win; otherwise look back `days` from `now`.
    ///
    /// Fails with `Validation` when the look-back leaves the representable
    /// date range.
    pub fn resolve_window(&self, now: Timestamp) -> Result<TimeWindow, CoreError> {
        if self.start_date.is_some() || self.end_date.is_some() {
            return Ok(TimeWindow {
                from: self.start_date,
                to: self.end_date,
            });
        }

        let from = Duration::try_days(i64::from(self.days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                CoreError::Validation(format!("days is out of range: {}", self.days))
            })?;
        Ok(TimeWindow {
            from: Some(from),
            to: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Two decimal places.
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation, two decimal places.
    pub sd: Option<f64>,
    pub hrv_proxy: Option<HrvQuality>,
    pub variability_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub out_of_range_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub dominant: TrendDirection,
    pub longest_streak: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePreview {
    pub heart_rate: f64,
    pub status: RecordStatus,
    pub at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub range_query: AnalysisQuery,
    pub total_records: usize,
    pub stats: ReportStats,
    pub distribution: Distribution,
    pub trend: TrendReport,
    pub sample_preview: Vec<SamplePreview>,
    pub generated_at: Timestamp,
}

/// Build a report over already-fetched samples, keeping their order.
///
/// Samples whose value is not finite are skipped for the statistics but
/// still appear in the preview.
pub fn build_report(query: &AnalysisQuery, samples: &[HeartRateSample]) -> AnalysisReport {
    let values: Vec<f64> = samples
        .iter()
        .map(|s| s.value)
        .filter(|v| v.is_finite())
        .collect();
    let stats = compute_stats(&values);

    let variability_note = match stats.hrv_quality {
        Some(HrvQuality::High) => Some(HIGH_VARIABILITY_NOTE.to_string()),
        Some(HrvQuality::VeryLow) => Some(VERY_LOW_VARIABILITY_NOTE.to_string()),
        _ => None,
    };

    AnalysisReport {
        range_query: query.clone(),
        total_records: stats.count,
        stats: ReportStats {
            average: stats.average.map(|v| round_to(v, 2)),
            min: stats.min,
            max: stats.max,
            sd: stats.standard_deviation.map(|v| round_to(v, 2)),
            hrv_proxy: stats.hrv_quality,
            variability_note,
        },
        distribution: Distribution {
            out_of_range_pct: stats.out_of_range_percent,
        },
        trend: TrendReport {
            dominant: stats.dominant_trend,
            longest_streak: stats.longest_trend_streak,
        },
        sample_preview: samples
            .iter()
            .take(PREVIEW_LEN)
            .map(|s| SamplePreview {
                heart_rate: s.value,
                status: s.status,
                at: s.recorded_at,
            })
            .collect(),
        generated_at: chrono::Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
