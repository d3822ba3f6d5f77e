//! Descriptive heart-rate statistics and HRV-proxy classification.
//!
//! [`compute_stats`] is the single entry point: it takes an ordered series
//! of bpm values and returns a [`StatsResult`] with count, mean, extrema,
//! population standard deviation, an HRV-proxy bucket, the share of
//! readings outside the resting band, and the longest monotone trend run.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lower bound (inclusive) of the normal resting band, in bpm.
pub const NORMAL_BAND_MIN: f64 = 60.0;
/// Upper bound (inclusive) of the normal resting band, in bpm.
pub const NORMAL_BAND_MAX: f64 = 100.0;

/// HRV quality is only reported when there are more samples than this.
pub const MIN_SAMPLES_FOR_HRV: usize = 4;

/// SD thresholds (bpm) for the HRV-proxy buckets.
pub const HRV_VERY_LOW_BELOW: f64 = 3.0;
pub const HRV_LOW_BELOW: f64 = 6.0;
pub const HRV_MODERATE_BELOW: f64 = 10.0;

// ---------------------------------------------------------------------------
// HrvQuality
// ---------------------------------------------------------------------------

/// Heart-rate-variability proxy bucket derived from the standard deviation
/// of recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HrvQuality {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl HrvQuality {
    /// Bucket a standard deviation (bpm).
    ///
    /// - `VeryLow`  sd < 3
    /// - `Low`      sd < 6
    /// - `Moderate` sd < 10
    /// - `High`     otherwise
    pub fn from_standard_deviation(sd: f64) -> Self {
        if sd < HRV_VERY_LOW_BELOW {
            Self::VeryLow
        } else if sd < HRV_LOW_BELOW {
            Self::Low
        } else if sd < HRV_MODERATE_BELOW {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

// ---------------------------------------------------------------------------
// TrendDirection
// ---------------------------------------------------------------------------

/// Direction of the comparison between two consecutive samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl TrendDirection {
    /// Classify the step from `prev` to `cur`.
    pub fn between(prev: f64, cur: f64) -> Self {
        if cur > prev {
            Self::Increasing
        } else if cur < prev {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }
}

// ---------------------------------------------------------------------------
// StatsResult
// ---------------------------------------------------------------------------

/// Derived statistics for one analysis call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub count: usize,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Population standard deviation (divides by `count`).
    pub standard_deviation: Option<f64>,
    /// `None` when there are 4 or fewer samples.
    pub hrv_quality: Option<HrvQuality>,
    /// Percentage of samples outside `[60, 100]`, one decimal place.
    pub out_of_range_percent: f64,
    /// Direction of the last comparison that started a new run.
    pub dominant_trend: TrendDirection,
    pub longest_trend_streak: usize,
}

impl StatsResult {
    /// Result for an empty series.
    pub fn empty() -> Self {
        Self {
            count: 0,
            average: None,
            min: None,
            max: None,
            standard_deviation: None,
            hrv_quality: None,
            out_of_range_percent: 0.0,
            dominant_trend: TrendDirection::Stable,
            longest_trend_streak: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute descriptive statistics over an ordered bpm series.
///
/// The series order is significant for the trend fields; callers must pass
/// samples in the same chronological order on every call.
pub fn compute_stats(samples: &[f64]) -> StatsResult {
    if samples.is_empty() {
        return StatsResult::empty();
    }

    let count = samples.len();
    let n = count as f64;
    let average = samples.iter().sum::<f64>() / n;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = samples.iter().map(|x| (x - average).powi(2)).sum::<f64>() / n;
    let standard_deviation = variance.sqrt();

    let hrv_quality = (count > MIN_SAMPLES_FOR_HRV)
        .then(|| HrvQuality::from_standard_deviation(standard_deviation));

    let (dominant_trend, longest_trend_streak) = trend_streak(samples);

    StatsResult {
        count,
        average: Some(average),
        min: Some(min),
        max: Some(max),
        standard_deviation: Some(standard_deviation),
        hrv_quality,
        out_of_range_percent: out_of_range_percent(samples),
        dominant_trend,
        longest_trend_streak,
    }
}

/// Percentage of samples below 60 or above 100 bpm, rounded to one decimal.
///
/// Returns `0.0` for an empty series.
pub fn out_of_range_percent(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let outside = samples
        .iter()
        .filter(|&&hr| hr < NORMAL_BAND_MIN || hr > NORMAL_BAND_MAX)
        .count();
    round_to(outside as f64 * 100.0 / samples.len() as f64, 1)
}

/// Scan consecutive pairs and return `(final direction, longest run)`.
///
/// A run only grows while each step keeps the direction currently being
/// tracked. Any other step, including an equal pair, restarts the run at 1
/// and switches the tracked direction to that step's direction. The
/// returned direction is whatever was tracked when the scan ended, not a
/// majority vote.
pub fn trend_streak(samples: &[f64]) -> (TrendDirection, usize) {
    if samples.is_empty() {
        return (TrendDirection::Stable, 0);
    }

    let mut direction = TrendDirection::Stable;
    let mut streak = 1usize;
    let mut longest = 1usize;

    for pair in samples.windows(2) {
        let step = TrendDirection::between(pair[0], pair[1]);
        let continues = step == direction && step != TrendDirection::Stable;
        if continues {
            streak += 1;
        } else {
            direction = step;
            streak = 1;
        }
        longest = longest.max(streak);
    }

    (direction, longest)
}

/// Round `value` to `places` decimal places (half away from zero).
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: [f64; 7] = [70.0, 72.0, 75.0, 74.0, 78.0, 80.0, 76.0];

    // -- compute_stats ---------------------------------------------------------

    #[test]
    fn empty_series_is_not_an_error() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, StatsResult::empty());
        assert_eq!(stats.count, 0);
        assert!(stats.average.is_none());
        assert!(stats.hrv_quality.is_none());
    }

    #[test]
    fn week_example_uses_population_sd() {
        let stats = compute_stats(&WEEK);
        assert_eq!(stats.count, 7);
        assert_eq!(stats.average, Some(75.0));
        assert_eq!(stats.min, Some(70.0));
        assert_eq!(stats.max, Some(80.0));
        // Sum of squared deviations is 70; 70 / 7 = 10.
        let sd = stats.standard_deviation.expect("sd present");
        assert!((sd - 10f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.hrv_quality, Some(HrvQuality::Low));
    }

    #[test]
    fn count_matches_length_and_average_is_bounded() {
        let series: [&[f64]; 4] = [
            &[88.0],
            &[60.0, 140.0],
            &[101.5, 99.0, 47.25, 62.0, 62.0],
            &WEEK,
        ];
        for s in series {
            let stats = compute_stats(s);
            assert_eq!(stats.count, s.len());
            let avg = stats.average.expect("avg");
            assert!(stats.min.expect("min") <= avg && avg <= stats.max.expect("max"));
        }
    }

    #[test]
    fn hrv_requires_more_than_four_samples() {
        assert!(compute_stats(&[60.0, 90.0, 60.0, 90.0]).hrv_quality.is_none());
        assert!(compute_stats(&[60.0, 90.0, 60.0, 90.0, 60.0])
            .hrv_quality
            .is_some());
    }

    #[test]
    fn compute_is_idempotent() {
        let series = [91.3, 64.2, 77.7, 120.1, 58.9, 58.9, 83.0];
        let a = compute_stats(&series);
        let b = compute_stats(&series);
        assert_eq!(a, b);
        assert_eq!(
            a.standard_deviation.map(f64::to_bits),
            b.standard_deviation.map(f64::to_bits)
        );
    }

    // -- HrvQuality -------------------------------------------------------------

    #[test]
    fn hrv_bucket_boundaries() {
        assert_eq!(HrvQuality::from_standard_deviation(2.99), HrvQuality::VeryLow);
        assert_eq!(HrvQuality::from_standard_deviation(3.0), HrvQuality::Low);
        assert_eq!(HrvQuality::from_standard_deviation(6.0), HrvQuality::Moderate);
        assert_eq!(HrvQuality::from_standard_deviation(9.99), HrvQuality::Moderate);
        assert_eq!(HrvQuality::from_standard_deviation(10.0), HrvQuality::High);
    }

    #[test]
    fn hrv_serializes_kebab_case() {
        let json = serde_json::to_string(&HrvQuality::VeryLow).expect("serialize");
        assert_eq!(json, "\"very-low\"");
    }

    // -- out_of_range_percent ---------------------------------------------------

    #[test]
    fn out_of_range_example() {
        assert_eq!(out_of_range_percent(&[50.0, 65.0, 110.0, 90.0, 55.0]), 60.0);
    }

    #[test]
    fn band_edges_are_in_range() {
        assert_eq!(out_of_range_percent(&[60.0, 100.0]), 0.0);
    }

    #[test]
    fn out_of_range_rounds_to_one_decimal() {
        // 1 of 3 = 33.333...
        assert_eq!(out_of_range_percent(&[59.0, 70.0, 80.0]), 33.3);
    }

    // -- trend_streak -----------------------------------------------------------

    #[test]
    fn single_sample_has_streak_one() {
        assert_eq!(trend_streak(&[72.0]), (TrendDirection::Stable, 1));
    }

    #[test]
    fn steady_rise_counts_steps() {
        // Three increasing steps: the first starts the run, two extend it.
        assert_eq!(
            trend_streak(&[60.0, 61.0, 62.0, 63.0]),
            (TrendDirection::Increasing, 3)
        );
    }

    #[test]
    fn equal_pair_resets_to_stable() {
        assert_eq!(
            trend_streak(&[60.0, 61.0, 62.0, 62.0]),
            (TrendDirection::Stable, 2)
        );
    }

    #[test]
    fn dominant_is_last_direction_not_majority() {
        // Long rise, then one drop at the end.
        let (dir, longest) = trend_streak(&[60.0, 65.0, 70.0, 75.0, 80.0, 78.0]);
        assert_eq!(dir, TrendDirection::Decreasing);
        assert_eq!(longest, 4);
    }

    #[test]
    fn stable_pairs_never_extend() {
        assert_eq!(
            trend_streak(&[70.0, 70.0, 70.0, 70.0]),
            (TrendDirection::Stable, 1)
        );
    }

    #[test]
    fn week_trend() {
        // 70→72→75 up (2), 74 down, 78→80 up (2), 76 down.
        assert_eq!(trend_streak(&WEEK), (TrendDirection::Decreasing, 2));
    }

    // -- round_to ---------------------------------------------------------------

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(75.0, 2), 75.0);
        assert_eq!(round_to(2.25, 1), 2.3);
    }
}
