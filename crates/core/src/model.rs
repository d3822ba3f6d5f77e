//! Loaded numeric severity model.
//!
//! A [`LoadedModel`] pairs a [`SeverityModel`] with the normalization
//! parameters used to standardize raw bpm input. It is built once at
//! startup (see [`LoadedModel::load`]) and handed to the classifier; there
//! is no process-wide cache.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::severity::{SeverityTier, SEVERITY_CLASSES};
use crate::stats::round_to;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Per-feature standardization parameters, as exported by training.
///
/// Only the first feature (heart rate) is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl NormalizationParams {
    pub fn new(mean: f64, std: f64) -> Self {
        Self {
            mean: vec![mean],
            std: vec![std],
        }
    }

    /// Ensure the heart-rate feature has a finite mean and a non-zero std.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.heart_rate_feature().map(|_| ())
    }

    /// `(x - mean) / std` for the heart-rate feature.
    ///
    /// Fails on params that would not pass [`validate`](Self::validate).
    pub fn standardize(&self, heart_rate: f64) -> Result<f64, CoreError> {
        let (mean, std) = self.heart_rate_feature()?;
        Ok((heart_rate - mean) / std)
    }

    fn heart_rate_feature(&self) -> Result<(f64, f64), CoreError> {
        let (Some(&mean), Some(&std)) = (self.mean.first(), self.std.first()) else {
            return Err(CoreError::Validation(
                "normalization params must contain at least one mean and std".to_string(),
            ));
        };
        if !mean.is_finite() {
            return Err(CoreError::Validation(format!(
                "normalization mean must be finite, got {mean}"
            )));
        }
        if !std.is_finite() || std == 0.0 {
            return Err(CoreError::Validation(format!(
                "normalization std must be finite and non-zero, got {std}"
            )));
        }
        Ok((mean, std))
    }
}

// ---------------------------------------------------------------------------
// SeverityModel
// ---------------------------------------------------------------------------

/// A scorer producing one probability per severity class.
pub trait SeverityModel: Send + Sync {
    /// Score a standardized heart rate.
    fn predict(&self, standardized: f64) -> Result<[f64; SEVERITY_CLASSES], CoreError>;
}

/// Single-input dense layer with softmax activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxModel {
    pub weights: [f64; SEVERITY_CLASSES],
    pub biases: [f64; SEVERITY_CLASSES],
}

impl SeverityModel for SoftmaxModel {
    fn predict(&self, standardized: f64) -> Result<[f64; SEVERITY_CLASSES], CoreError> {
        let mut logits = [0.0; SEVERITY_CLASSES];
        for (i, logit) in logits.iter_mut().enumerate() {
            *logit = self.weights[i] * standardized + self.biases[i];
        }
        let peak = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut exps = logits.map(|l| (l - peak).exp());
        let total: f64 = exps.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(CoreError::Internal(
                "softmax produced a non-finite partition sum".to_string(),
            ));
        }
        for p in exps.iter_mut() {
            *p /= total;
        }
        Ok(exps)
    }
}

// ---------------------------------------------------------------------------
// LoadedModel
// ---------------------------------------------------------------------------

/// Result of scoring one heart rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub tier: SeverityTier,
    /// Winning class probability as a percentage, one decimal place.
    pub confidence: f64,
    pub probabilities: [f64; SEVERITY_CLASSES],
}

/// A model plus its normalization parameters. Cheap to clone.
#[derive(Clone)]
pub struct LoadedModel {
    model: Arc<dyn SeverityModel>,
    normalization: NormalizationParams,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("normalization", &self.normalization)
            .finish_non_exhaustive()
    }
}

impl LoadedModel {
    pub fn new(
        model: Arc<dyn SeverityModel>,
        normalization: NormalizationParams,
    ) -> Result<Self, CoreError> {
        normalization.validate()?;
        Ok(Self {
            model,
            normalization,
        })
    }

    /// Read a [`SoftmaxModel`] and its normalization params from JSON files.
    pub fn load(model_path: &Path, normalization_path: &Path) -> Result<Self, CoreError> {
        let model: SoftmaxModel = read_json(model_path)?;
        let normalization: NormalizationParams = read_json(normalization_path)?;
        Self::new(Arc::new(model), normalization)
    }

    pub fn normalization(&self) -> &NormalizationParams {
        &self.normalization
    }

    /// Standardize `heart_rate`, score it, and take the argmax class.
    ///
    /// Ties resolve to the lowest class. Non-finite probabilities are an
    /// error so the caller can fall back to another path.
    pub fn predict(&self, heart_rate: f64) -> Result<Prediction, CoreError> {
        let probabilities = self
            .model
            .predict(self.normalization.standardize(heart_rate)?)?;

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(CoreError::Internal(
                "model returned a non-finite probability".to_string(),
            ));
        }

        let mut best = 0usize;
        let mut best_p = 0.0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > best_p {
                best_p = p;
                best = i;
            }
        }

        Ok(Prediction {
            tier: SeverityTier::from_index(best)?,
            confidence: round_to(best_p * 100.0, 1),
            probabilities,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Internal(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CoreError::Validation(format!("failed to parse {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
