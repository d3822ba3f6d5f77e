//! Candidate pools and randomized selection for model-based diagnoses.
//!
//! Pools depend on the heart-rate range, the severity label, and the model
//! confidence. Selection shuffles the pool with a caller-supplied RNG and
//! keeps the first few entries, so results vary per call unless the RNG is
//! seeded.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::severity::SeverityLabel;

/// At most this many recommendations are kept after shuffling.
pub const PICK_RECOMMENDATIONS: usize = 5;
/// At most this many risk factors are kept after shuffling.
pub const PICK_RISK_FACTORS: usize = 4;

/// Confidence (percent) above which a symptom-watch recommendation is added.
pub const CONFIDENT_RECOMMENDATION_ABOVE: f64 = 80.0;
/// Confidence (percent) above which an undetected-risk entry is added.
pub const CONFIDENT_RISK_ABOVE: f64 = 85.0;

/// Build the recommendation candidates for a reading.
pub fn recommendation_pool(
    heart_rate: f64,
    severity: SeverityLabel,
    confidence: f64,
) -> Vec<&'static str> {
    let mut pool = Vec::with_capacity(6);

    if heart_rate < 60.0 {
        pool.extend(["Add gentle physical activity", "Track your heart rate daily"]);
    } else if heart_rate > 100.0 {
        pool.extend([
            "Cut back on caffeine and alcohol",
            "Practice relaxation techniques",
        ]);
    } else {
        pool.extend(["Keep a regular exercise routine", "Eat a balanced diet"]);
    }

    match severity {
        SeverityLabel::Low => pool.extend([
            "Schedule a check-up every 6 months",
            "Keep an eye on your BMI",
        ]),
        SeverityLabel::Medium => pool.extend([
            "See a cardiologist within 3 months",
            "Learn stress management techniques",
            "Monitor your blood pressure at home",
        ]),
        SeverityLabel::High => pool.extend([
            "See a cardiology specialist now",
            "Get blood work done",
            "Start a DASH or Mediterranean diet",
        ]),
        SeverityLabel::Critical => pool.extend([
            "Go to the emergency room immediately",
            "Do not drive alone",
            "Have your medical history ready",
        ]),
    }

    if confidence > CONFIDENT_RECOMMENDATION_ABOVE {
        pool.push("Watch closely for any new symptoms");
    }

    pool
}

/// Build the risk-factor candidates for a reading.
///
/// May be empty: a low-severity reading between 50 and 120 bpm with
/// moderate confidence has no candidates.
pub fn risk_factor_pool(
    heart_rate: f64,
    severity: SeverityLabel,
    confidence: f64,
) -> Vec<&'static str> {
    let mut pool = Vec::with_capacity(8);

    if heart_rate < 50.0 {
        pool.extend(["Advanced age", "Cardiac medication side effects"]);
    } else if heart_rate > 120.0 {
        pool.extend([
            "Prolonged stress",
            "Chronic sleep deprivation",
            "Endocrine disorder",
        ]);
    }

    match severity {
        SeverityLabel::Low => {}
        SeverityLabel::Medium => pool.extend([
            "Sedentary lifestyle",
            "Smoking",
            "Family history of heart disease",
        ]),
        SeverityLabel::High => pool.extend([
            "High blood pressure",
            "High blood cholesterol",
            "Obesity or overweight",
            "Type 2 diabetes",
        ]),
        SeverityLabel::Critical => pool.extend([
            "Coronary artery disease",
            "Congestive heart failure",
            "Severe arrhythmia",
            "Thrombosis or embolism",
        ]),
    }

    if confidence > CONFIDENT_RISK_ABOVE {
        pool.push("Undetected risk factors");
    }

    pool
}

/// Shuffle `pool` and keep at most `limit` entries.
pub fn pick<R: Rng + ?Sized>(mut pool: Vec<&'static str>, limit: usize, rng: &mut R) -> Vec<String> {
    pool.shuffle(rng);
    pool.into_iter().take(limit).map(str::to_string).collect()
}

pub fn personalized_recommendations<R: Rng + ?Sized>(
    heart_rate: f64,
    severity: SeverityLabel,
    confidence: f64,
    rng: &mut R,
) -> Vec<String> {
    pick(
        recommendation_pool(heart_rate, severity, confidence),
        PICK_RECOMMENDATIONS,
        rng,
    )
}

pub fn personalized_risk_factors<R: Rng + ?Sized>(
    heart_rate: f64,
    severity: SeverityLabel,
    confidence: f64,
    rng: &mut R,
) -> Vec<String> {
    pick(
        risk_factor_pool(heart_rate, severity, confidence),
        PICK_RISK_FACTORS,
        rng,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
