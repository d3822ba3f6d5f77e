//! Deterministic threshold-ladder classifier.
//!
//! This is the path that is always available: it needs no model and no
//! external process, so the fallback chain ends here.

use crate::diagnosis::{owned, Diagnosis};
use crate::error::CoreError;
use crate::severity::{SeverityLabel, UrgencyLevel};

/// Below this bpm the reading is severe bradycardia.
pub const SEVERE_BRADYCARDIA_BELOW: f64 = 40.0;
/// Below this bpm (and at or above 40) the reading is bradycardia.
pub const BRADYCARDIA_BELOW: f64 = 60.0;
/// Up to and including this bpm the reading is normal.
pub const NORMAL_UP_TO: f64 = 100.0;
/// Up to and including this bpm the reading is tachycardia; above is severe.
pub const TACHYCARDIA_UP_TO: f64 = 140.0;

// ---------------------------------------------------------------------------
// RuleBand
// ---------------------------------------------------------------------------

/// One rung of the threshold ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleBand {
    SevereBradycardia,
    Bradycardia,
    Normal,
    Tachycardia,
    SevereTachycardia,
}

impl RuleBand {
    /// Place a finite heart rate on the ladder. First match wins.
    pub fn for_heart_rate(heart_rate: f64) -> Self {
        if heart_rate < SEVERE_BRADYCARDIA_BELOW {
            Self::SevereBradycardia
        } else if heart_rate < BRADYCARDIA_BELOW {
            Self::Bradycardia
        } else if heart_rate <= NORMAL_UP_TO {
            Self::Normal
        } else if heart_rate <= TACHYCARDIA_UP_TO {
            Self::Tachycardia
        } else {
            Self::SevereTachycardia
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::SevereBradycardia => "Severe bradycardia",
            Self::Bradycardia => "Bradycardia",
            Self::Normal => "Normal heart rate",
            Self::Tachycardia => "Tachycardia",
            Self::SevereTachycardia => "Severe tachycardia",
        }
    }

    pub fn severity(self) -> SeverityLabel {
        match self {
            Self::Normal => SeverityLabel::Low,
            Self::Bradycardia | Self::Tachycardia => SeverityLabel::Medium,
            Self::SevereBradycardia | Self::SevereTachycardia => SeverityLabel::Critical,
        }
    }

    pub fn urgency(self) -> UrgencyLevel {
        match self {
            Self::Normal => UrgencyLevel::Routine,
            Self::Bradycardia | Self::Tachycardia => UrgencyLevel::Urgent,
            Self::SevereBradycardia | Self::SevereTachycardia => UrgencyLevel::Emergency,
        }
    }

    pub fn needs_attention(self) -> bool {
        self != Self::Normal
    }

    pub fn narrative(self, heart_rate: f64) -> String {
        match self {
            Self::SevereBradycardia => format!("Heart rate of {heart_rate} bpm is very low."),
            Self::Bradycardia => {
                format!("Heart rate of {heart_rate} bpm is low; keep monitoring.")
            }
            Self::Normal => {
                format!("Heart rate of {heart_rate} bpm is within the 60-100 range.")
            }
            Self::Tachycardia => format!(
                "Heart rate of {heart_rate} bpm is elevated; possibly due to stress or caffeine."
            ),
            Self::SevereTachycardia => {
                format!("Heart rate of {heart_rate} bpm is very high; emergency risk.")
            }
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            Self::SevereBradycardia => &[
                "See a cardiologist immediately",
                "Avoid strenuous activity",
                "Watch for symptoms",
                "Call emergency services if symptoms worsen",
            ],
            Self::Bradycardia => &[
                "Get a cardiology check-up",
                "Keep tracking your heart rate",
                "Watch for fatigue or dizziness",
                "Maintain a healthy lifestyle",
            ],
            Self::Normal => &[
                "Maintain a healthy lifestyle",
                "Exercise regularly",
                "Eat a balanced diet",
                "Get regular check-ups",
            ],
            Self::Tachycardia => &[
                "Reduce caffeine",
                "Manage stress",
                "See a doctor if it persists",
                "Rest",
                "Avoid alcohol and stimulants",
            ],
            Self::SevereTachycardia => &[
                "Seek emergency care",
                "Lie down and rest",
                "Do not self-medicate",
                "Call emergency services if chest pain or shortness of breath occurs",
            ],
        }
    }

    pub fn risk_factors(self) -> &'static [&'static str] {
        match self {
            Self::SevereBradycardia => &[
                "Atrioventricular block",
                "Sick sinus syndrome",
                "Medication side effects",
            ],
            Self::Bradycardia => &["Medication", "Thyroid disorder"],
            Self::Normal => &[],
            Self::Tachycardia => &["Stress or anxiety", "Sleep deprivation", "Stimulants"],
            Self::SevereTachycardia => &[
                "Severe arrhythmia",
                "Heart failure",
                "Myocardial ischemia",
            ],
        }
    }

    fn diagnosis(self, heart_rate: f64) -> Diagnosis {
        Diagnosis {
            title: self.title().to_string(),
            severity: self.severity(),
            narrative: self.narrative(heart_rate),
            recommendations: owned(self.recommendations()),
            risk_factors: owned(self.risk_factors()),
            needs_attention: self.needs_attention(),
            urgency_level: self.urgency(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Reject missing or non-finite readings.
pub fn validate_heart_rate(heart_rate: Option<f64>) -> Result<f64, CoreError> {
    match heart_rate {
        Some(hr) if hr.is_finite() => Ok(hr),
        Some(hr) => Err(CoreError::InvalidInput(format!(
            "heart rate must be a finite number, got {hr}"
        ))),
        None => Err(CoreError::InvalidInput("heart rate is missing".to_string())),
    }
}

/// Classify a reading, failing with `InvalidInput` when it is unusable.
pub fn try_classify(heart_rate: Option<f64>) -> Result<Diagnosis, CoreError> {
    let hr = validate_heart_rate(heart_rate)?;
    Ok(RuleBand::for_heart_rate(hr).diagnosis(hr))
}

/// Classify a reading on the threshold ladder.
///
/// Never fails: unusable input yields [`degraded_diagnosis`].
pub fn classify(heart_rate: f64) -> Diagnosis {
    classify_reading(Some(heart_rate))
}

/// Like [`classify`] but accepts a possibly-missing reading.
pub fn classify_reading(heart_rate: Option<f64>) -> Diagnosis {
    try_classify(heart_rate).unwrap_or_else(|_| degraded_diagnosis())
}

/// Diagnosis returned when the heart rate is missing or invalid.
pub fn degraded_diagnosis() -> Diagnosis {
    Diagnosis {
        title: "Heart rate data missing or invalid".to_string(),
        severity: SeverityLabel::Low,
        narrative: "Cannot assess: the heart rate reading is not a number.".to_string(),
        recommendations: vec!["Repeat the measurement with the sensor seated firmly".to_string()],
        risk_factors: Vec::new(),
        needs_attention: false,
        urgency_level: UrgencyLevel::Routine,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::diagnosis::{MAX_RECOMMENDATIONS, MAX_RISK_FACTORS};

    fn severity_urgency(hr: f64) -> (SeverityLabel, UrgencyLevel) {
        let d = classify(hr);
        (d.severity, d.urgency_level)
    }

    #[test]
    fn normal_band_is_low_routine() {
        let mut hr = 60.0;
        while hr <= 100.0 {
            assert_eq!(
                severity_urgency(hr),
                (SeverityLabel::Low, UrgencyLevel::Routine),
                "hr = {hr}"
            );
            hr += 0.5;
        }
    }

    #[test]
    fn lower_boundaries() {
        assert_eq!(
            severity_urgency(40.0),
            (SeverityLabel::Medium, UrgencyLevel::Urgent)
        );
        assert_eq!(
            severity_urgency(39.999),
            (SeverityLabel::Critical, UrgencyLevel::Emergency)
        );
        assert_eq!(
            severity_urgency(59.99),
            (SeverityLabel::Medium, UrgencyLevel::Urgent)
        );
    }

    #[test]
    fn upper_boundaries() {
        assert_eq!(
            severity_urgency(100.0),
            (SeverityLabel::Low, UrgencyLevel::Routine)
        );
        assert_eq!(
            severity_urgency(100.001),
            (SeverityLabel::Medium, UrgencyLevel::Urgent)
        );
        assert_eq!(
            severity_urgency(140.0),
            (SeverityLabel::Medium, UrgencyLevel::Urgent)
        );
        assert_eq!(
            severity_urgency(140.5),
            (SeverityLabel::Critical, UrgencyLevel::Emergency)
        );
    }

    #[test]
    fn severity_never_drops_moving_away_from_normal() {
        let mut prev = SeverityLabel::Low;
        for hr in (100..=220).map(f64::from) {
            let s = classify(hr).severity;
            assert!(s >= prev, "severity dropped at {hr}");
            prev = s;
        }
        prev = SeverityLabel::Low;
        for hr in (0..=60).rev().map(f64::from) {
            let s = classify(hr).severity;
            assert!(s >= prev, "severity dropped at {hr}");
            prev = s;
        }
    }

    #[test]
    fn list_sizes_per_band() {
        let cases = [(30.0, 4, 3), (50.0, 4, 2), (80.0, 4, 0), (120.0, 5, 3), (160.0, 4, 3)];
        for (hr, recs, risks) in cases {
            let d = classify(hr);
            assert_eq!(d.recommendations.len(), recs, "hr = {hr}");
            assert_eq!(d.risk_factors.len(), risks, "hr = {hr}");
            assert!(d.recommendations.len() <= MAX_RECOMMENDATIONS);
            assert!(d.risk_factors.len() <= MAX_RISK_FACTORS);
        }
    }

    #[test]
    fn narrative_mentions_reading() {
        assert_eq!(
            classify(72.0).narrative,
            "Heart rate of 72 bpm is within the 60-100 range."
        );
        assert!(classify(38.5).narrative.contains("38.5 bpm"));
    }

    #[test]
    fn nan_degrades_without_error() {
        let d = classify(f64::NAN);
        assert_eq!(d, degraded_diagnosis());
        assert_eq!(d.severity, SeverityLabel::Low);
        assert!(!d.needs_attention);
    }

    #[test]
    fn missing_reading_degrades() {
        assert_eq!(classify_reading(None), degraded_diagnosis());
        assert_eq!(classify(f64::INFINITY), degraded_diagnosis());
    }

    #[test]
    fn try_classify_reports_invalid_input() {
        assert_matches!(try_classify(Some(f64::NAN)), Err(CoreError::InvalidInput(_)));
        assert_matches!(try_classify(None), Err(CoreError::InvalidInput(_)));
        assert!(try_classify(Some(75.0)).is_ok());
    }
}
