//! External predictor interface and wire types.
//!
//! Defines [`ExternalPredictor`], the trait every out-of-process scoring
//! backend implements, along with [`ExternalRequest`],
//! [`ExternalResponse`] and [`PredictorError`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pulse_core::diagnosis::{Diagnosis, MAX_RECOMMENDATIONS, MAX_RISK_FACTORS};
use pulse_core::severity::SeverityTier;

/// Defaults sent when the caller has no demographic data.
pub const DEFAULT_AGE: f64 = 50.0;
pub const DEFAULT_SEX: u8 = 1;
pub const DEFAULT_RESTING_BP: f64 = 120.0;
pub const DEFAULT_CHOLESTEROL: f64 = 200.0;

/// External results at or above this tier need attention.
pub const ATTENTION_TIER: usize = 2;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Payload sent to the external predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRequest {
    pub heart_rate: f64,
    pub age: f64,
    /// 1 = male, 0 = female (training-set encoding).
    pub sex: u8,
    pub resting_blood_pressure: f64,
    pub cholesterol: f64,
}

impl ExternalRequest {
    /// A request with default covariates.
    pub fn new(heart_rate: f64) -> Self {
        Self {
            heart_rate,
            age: DEFAULT_AGE,
            sex: DEFAULT_SEX,
            resting_blood_pressure: DEFAULT_RESTING_BP,
            cholesterol: DEFAULT_CHOLESTEROL,
        }
    }
}

/// Result returned by the external predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResponse {
    pub severity_index: u8,
    pub narrative: String,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl ExternalResponse {
    /// Convert into a [`Diagnosis`].
    ///
    /// Rejects out-of-range tiers and empty recommendation lists; trims
    /// oversized lists to the diagnosis limits.
    pub fn into_diagnosis(self) -> Result<Diagnosis, PredictorError> {
        let tier = SeverityTier::from_index(self.severity_index as usize)
            .map_err(|e| PredictorError::InvalidResponse(e.to_string()))?;
        if self.recommendations.is_empty() {
            return Err(PredictorError::InvalidResponse(
                "response carries no recommendations".to_string(),
            ));
        }

        let mut recommendations = self.recommendations;
        recommendations.truncate(MAX_RECOMMENDATIONS);
        let mut risk_factors = self.risk_factors;
        risk_factors.truncate(MAX_RISK_FACTORS);

        Ok(Diagnosis {
            title: tier.title().to_string(),
            severity: tier.label(),
            narrative: self.narrative,
            recommendations,
            risk_factors,
            needs_attention: tier.index() >= ATTENTION_TIER,
            urgency_level: tier.urgency(),
        })
    }
}

// ---------------------------------------------------------------------------
// PredictorError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling an external predictor.
#[derive(Debug)]
pub enum PredictorError {
    /// The predictor did not answer within its time budget.
    Timeout {
        /// Elapsed wall-clock time before the call was abandoned.
        elapsed_ms: u64,
    },
    /// The predictor process ran but exited with a non-zero code.
    ExecutionFailed {
        exit_code: i32,
        stderr: String,
    },
    /// The request could not be encoded.
    InvalidRequest(String),
    /// The predictor answered with something that is not a valid response.
    InvalidResponse(String),
    /// An I/O error occurred while spawning or talking to the process.
    IoError(std::io::Error),
}

impl fmt::Display for PredictorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { elapsed_ms } => write!(f, "Predictor timed out after {elapsed_ms}ms"),
            Self::ExecutionFailed { exit_code, stderr } => {
                write!(f, "Predictor failed with exit code {exit_code}: {stderr}")
            }
            Self::InvalidRequest(msg) => write!(f, "Invalid predictor request: {msg}"),
            Self::InvalidResponse(msg) => write!(f, "Invalid predictor response: {msg}"),
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for PredictorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalPredictor
// ---------------------------------------------------------------------------

/// An out-of-process scoring backend (subprocess, remote service, ...).
///
/// Implementations must stop any in-flight work when the returned future
/// is dropped.
#[async_trait]
pub trait ExternalPredictor: Send + Sync {
    async fn predict(&self, request: &ExternalRequest) -> Result<ExternalResponse, PredictorError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
