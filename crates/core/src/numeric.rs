//! Numeric-model classification path.
//!
//! Wraps a [`LoadedModel`] and turns its prediction into a [`Diagnosis`]
//! with a tier-specific narrative and randomly personalized lists.

use rand::Rng;

use crate::diagnosis::Diagnosis;
use crate::error::CoreError;
use crate::model::{LoadedModel, Prediction};
use crate::personalization::{personalized_recommendations, personalized_risk_factors};
use crate::rules::validate_heart_rate;

/// Classifier backed by an injected, already-loaded model.
#[derive(Debug, Clone)]
pub struct NumericClassifier {
    model: LoadedModel,
}

impl NumericClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self { model }
    }

    /// Score `heart_rate` and build a diagnosis.
    ///
    /// The RNG drives recommendation and risk-factor selection only; the
    /// tier, title, narrative and urgency are deterministic.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        heart_rate: f64,
        rng: &mut R,
    ) -> Result<Diagnosis, CoreError> {
        let hr = validate_heart_rate(Some(heart_rate))?;
        let prediction = self.model.predict(hr)?;
        Ok(build_diagnosis(hr, &prediction, rng))
    }
}

fn build_diagnosis<R: Rng + ?Sized>(
    heart_rate: f64,
    prediction: &Prediction,
    rng: &mut R,
) -> Diagnosis {
    let tier = prediction.tier;
    let severity = tier.label();
    let confidence = prediction.confidence;

    Diagnosis {
        title: tier.title().to_string(),
        severity,
        narrative: narrative(tier.index(), heart_rate, confidence),
        recommendations: personalized_recommendations(heart_rate, severity, confidence, rng),
        risk_factors: personalized_risk_factors(heart_rate, severity, confidence, rng),
        needs_attention: tier.index() >= 1,
        urgency_level: tier.urgency(),
    }
}

fn narrative(tier: usize, hr: f64, confidence: f64) -> String {
    match tier {
        0 => format!(
            "Model assessment: a heart rate of {hr} bpm is normal ({confidence:.1}% confidence). \
             No signs of abnormality."
        ),
        1 => format!(
            "Model assessment: a heart rate of {hr} bpm shows signs that need attention \
             ({confidence:.1}% confidence). Further monitoring is recommended."
        ),
        2 => format!(
            "Model warning: a heart rate of {hr} bpm indicates moderate cardiovascular risk \
             ({confidence:.1}% confidence). Pay attention."
        ),
        3 => format!(
            "Model warning: a heart rate of {hr} bpm indicates high cardiovascular risk \
             ({confidence:.1}% confidence). Early intervention is needed."
        ),
        _ => format!(
            "Model alert: a heart rate of {hr} bpm indicates very high cardiovascular risk \
             ({confidence:.1}% confidence). Act immediately."
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
