//! Personalized cardiovascular reference ranges (resting band, max heart
//! rate, training zones) derived from a subject profile.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const BASE_RESTING_MIN: f64 = 60.0;
const BASE_RESTING_MAX: f64 = 80.0;

const RESTING_MIN_FLOOR: f64 = 45.0;
const RESTING_MIN_CEILING: f64 = 85.0;
const RESTING_MAX_CEILING: f64 = 100.0;
/// The resting band is always at least this wide.
const RESTING_MIN_SPAN: f64 = 5.0;

/// Age used for the max-heart-rate formula when none is given.
pub const DEFAULT_AGE: f64 = 40.0;

/// Conditions that raise the resting band (including local aliases).
const RAISING_CONDITIONS: &[&str] = &[
    "hypertension",
    "tang_huyet_ap",
    "diabetes",
    "obesity",
    "tuyen_giap",
    "thyroid",
    "copd",
];

const ATHLETE_CONDITIONS: &[&str] = &["athlete", "van_dong_vien"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Demographic and medical profile of a monitored subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    /// Kilograms.
    pub weight: Option<f64>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetZones {
    pub light: i64,
    pub moderate: i64,
    pub vigorous: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealHeartMetrics {
    pub resting: RestingRange,
    /// Estimated max heart rate (Tanaka formula).
    pub max: i64,
    pub target_zones: TargetZones,
    /// Set when defaults were substituted for missing profile fields.
    pub assumptions: Option<String>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Compute the personalized resting band, max heart rate and target zones.
pub fn compute_ideal_metrics(profile: &SubjectProfile) -> IdealHeartMetrics {
    let mut min_rest = BASE_RESTING_MIN;
    let mut max_rest = BASE_RESTING_MAX;

    if let Some(age) = profile.age {
        if age > 50.0 {
            min_rest += 2.0;
            max_rest += 4.0;
        }
        if age > 65.0 {
            min_rest += 3.0;
            max_rest += 6.0;
        }
    }

    if profile.gender == Some(Gender::Female) {
        min_rest += 2.0;
        max_rest += 3.0;
    }

    if profile
        .conditions
        .iter()
        .any(|c| ATHLETE_CONDITIONS.contains(&c.as_str()))
    {
        min_rest -= 10.0;
        max_rest -= 10.0;
    }

    let raises = profile
        .conditions
        .iter()
        .filter(|c| RAISING_CONDITIONS.contains(&c.to_lowercase().as_str()))
        .count() as f64;
    min_rest += 2.0 * raises;
    max_rest += 4.0 * raises;

    let min_rest = min_rest.clamp(RESTING_MIN_FLOOR, RESTING_MIN_CEILING);
    let max_rest = max_rest
        .min(RESTING_MAX_CEILING)
        .max(min_rest + RESTING_MIN_SPAN);

    let age = profile.age.unwrap_or(DEFAULT_AGE);
    let max_hr = (208.0 - 0.7 * age).round();

    let assumptions = (profile.age.is_none()
        || profile.gender.is_none()
        || profile.weight.is_none())
    .then(|| "Some default values were used due to missing data".to_string());

    IdealHeartMetrics {
        resting: RestingRange {
            min: min_rest.round() as i64,
            max: max_rest.round() as i64,
        },
        max: max_hr as i64,
        target_zones: TargetZones {
            light: (max_hr * 0.5).round() as i64,
            moderate: (max_hr * 0.7).round() as i64,
            vigorous: (max_hr * 0.85).round() as i64,
        },
        assumptions,
    }
}

/// Advice notes for the subject's known conditions, in profile order.
pub fn condition_risk_notes(conditions: &[String]) -> Vec<&'static str> {
    conditions
        .iter()
        .filter_map(|c| match c.to_lowercase().as_str() {
            "hypertension" => Some("Control your blood pressure and limit salt intake."),
            "diabetes" => Some("Monitor blood glucose to reduce cardiovascular complications."),
            "obesity" => Some("Weight loss can improve heart rate and blood pressure."),
            "thyroid" => Some("Thyroid disorders directly affect heart rate."),
            "athlete" => Some("Low resting heart rate is normal for well-trained athletes."),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(age: f64, gender: Gender, conditions: &[&str]) -> SubjectProfile {
        SubjectProfile {
            age: Some(age),
            gender: Some(gender),
            weight: Some(70.0),
            conditions: conditions.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn empty_profile_uses_defaults() {
        let m = compute_ideal_metrics(&SubjectProfile::default());
        assert_eq!(m.resting, RestingRange { min: 60, max: 80 });
        assert_eq!(m.max, 180);
        assert_eq!(
            m.target_zones,
            TargetZones {
                light: 90,
                moderate: 126,
                vigorous: 153
            }
        );
        assert!(m.assumptions.is_some());
    }

    #[test]
    fn older_female_shifts_band_up() {
        let m = compute_ideal_metrics(&profile(70.0, Gender::Female, &[]));
        // +2+3 (age) +2 (female) / +4+6 (age) +3 (female)
        assert_eq!(m.resting, RestingRange { min: 67, max: 93 });
        assert_eq!(m.max, 159);
        assert!(m.assumptions.is_none());
    }

    #[test]
    fn athlete_lowers_band() {
        let m = compute_ideal_metrics(&profile(30.0, Gender::Male, &["athlete"]));
        assert_eq!(m.resting, RestingRange { min: 50, max: 70 });
    }

    #[test]
    fn raising_conditions_accumulate_and_clamp() {
        let m = compute_ideal_metrics(&profile(
            70.0,
            Gender::Female,
            &["Hypertension", "diabetes", "obesity", "copd"],
        ));
        // min: 67 + 8 = 75; max: 93 + 16 = 109 -> clamped to 100.
        assert_eq!(m.resting, RestingRange { min: 75, max: 100 });
    }

    #[test]
    fn band_keeps_minimum_span() {
        let conditions = ["hypertension"; 13];
        let m = compute_ideal_metrics(&profile(30.0, Gender::Male, &conditions));
        assert_eq!(m.resting, RestingRange { min: 85, max: 100 });

        let low = compute_ideal_metrics(&profile(
            30.0,
            Gender::Male,
            &["athlete", "van_dong_vien"],
        ));
        assert_eq!(low.resting.min, 50);
        assert!(low.resting.max - low.resting.min >= 5);
    }

    #[test]
    fn risk_notes_skip_unknown_conditions() {
        let notes = condition_risk_notes(&[
            "Diabetes".to_string(),
            "migraine".to_string(),
            "athlete".to_string(),
        ]);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("blood glucose"));
    }
}
