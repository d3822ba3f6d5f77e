//! Simplified history trend summary.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::stats::TrendDirection;

/// Fewer values than this cannot be summarized.
pub const MIN_TREND_POINTS: usize = 3;
/// Only the first this-many values are considered.
pub const MAX_TREND_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub trend: TrendDirection,
    pub analysis: String,
    pub concerns: Vec<String>,
    pub positive_points: Vec<String>,
    pub recommendations: Vec<String>,
    pub data_points: usize,
}

/// Summarize a short heart-rate history by comparing its first and last
/// values.
pub fn summarize_trend(values: &[f64]) -> Result<TrendSummary, CoreError> {
    if values.len() < MIN_TREND_POINTS {
        return Err(CoreError::Validation(format!(
            "not enough data to analyze the trend: need {MIN_TREND_POINTS} readings, got {}",
            values.len()
        )));
    }

    let rates = &values[..values.len().min(MAX_TREND_POINTS)];
    let average = rates.iter().sum::<f64>() / rates.len() as f64;
    let trend = TrendDirection::between(rates[0], rates[rates.len() - 1]);

    let label = match trend {
        TrendDirection::Increasing => "increasing",
        TrendDirection::Decreasing => "decreasing",
        TrendDirection::Stable => "stable",
    };

    let concerns = match trend {
        TrendDirection::Increasing => {
            vec!["A rising heart rate may be caused by stress".to_string()]
        }
        _ => Vec::new(),
    };
    let positive_points = match trend {
        TrendDirection::Stable => vec!["Heart rate is stable".to_string()],
        _ => Vec::new(),
    };

    Ok(TrendSummary {
        trend,
        analysis: format!("Heart rate trend: {label}. Average {average:.1} bpm."),
        concerns,
        positive_points,
        recommendations: vec![
            "Keep monitoring".to_string(),
            "Get regular check-ups".to_string(),
        ],
        data_points: rates.len(),
    })
}
