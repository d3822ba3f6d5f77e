//! Diagnosis service: the external → numeric → rules fallback chain.
//!
//! [`DiagnosisService::diagnose`] always produces a [`DiagnosisOutcome`].
//! Richer paths are tried first; any failure in one is logged at `warn`
//! and the next path takes over. The threshold ladder cannot fail.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use pulse_core::diagnosis::{Diagnosis, DiagnosisOutcome, DiagnosisSource};
use pulse_core::model::LoadedModel;
use pulse_core::numeric::NumericClassifier;
use pulse_core::rules;

use crate::config::{DiagnosisConfig, DEFAULT_PREDICTOR_TIMEOUT_SECS};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::predictor::external::{
    ExternalPredictor, ExternalRequest, DEFAULT_AGE, DEFAULT_CHOLESTEROL, DEFAULT_RESTING_BP,
    DEFAULT_SEX,
};
use crate::predictor::process::ProcessPredictor;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One diagnosis request. Only `heart_rate` drives the local paths; the
/// covariates are forwarded to the external predictor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub heart_rate: Option<f64>,
    pub age: Option<f64>,
    pub sex: Option<u8>,
    pub resting_blood_pressure: Option<f64>,
    pub cholesterol: Option<f64>,
}

impl DiagnosisRequest {
    pub fn new(heart_rate: f64) -> Self {
        Self {
            heart_rate: Some(heart_rate),
            ..Default::default()
        }
    }

    fn external_request(&self, heart_rate: f64) -> ExternalRequest {
        ExternalRequest {
            heart_rate,
            age: self.age.unwrap_or(DEFAULT_AGE),
            sex: self.sex.unwrap_or(DEFAULT_SEX),
            resting_blood_pressure: self.resting_blood_pressure.unwrap_or(DEFAULT_RESTING_BP),
            cholesterol: self.cholesterol.unwrap_or(DEFAULT_CHOLESTEROL),
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Severity classifier with an optional external predictor and an optional
/// numeric model in front of the threshold ladder.
pub struct DiagnosisService {
    external: Option<Arc<dyn ExternalPredictor>>,
    numeric: Option<NumericClassifier>,
    external_timeout: Duration,
    /// Held only while picking recommendations, never across an await.
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for DiagnosisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosisService")
            .field("external", &self.external.is_some())
            .field("numeric", &self.numeric)
            .field("external_timeout", &self.external_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for DiagnosisService {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisService {
    /// A service with only the threshold ladder enabled.
    pub fn new() -> Self {
        Self {
            external: None,
            numeric: None,
            external_timeout: Duration::from_secs(DEFAULT_PREDICTOR_TIMEOUT_SECS),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn with_external(mut self, predictor: Arc<dyn ExternalPredictor>) -> Self {
        self.external = Some(predictor);
        self
    }

    pub fn with_numeric(mut self, classifier: NumericClassifier) -> Self {
        self.numeric = Some(classifier);
        self
    }

    /// Upper bound on one external call. Elapsing counts as unavailable.
    pub fn with_external_timeout(mut self, timeout: Duration) -> Self {
        self.external_timeout = timeout;
        self
    }

    /// Replace the random source, e.g. with a seeded one for tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Wire up the paths enabled in `config`.
    ///
    /// The numeric model is loaded here, once; a model that fails to load
    /// is a startup error rather than a silent fallback.
    pub fn from_config(config: &DiagnosisConfig) -> DiagnosisResult<Self> {
        let mut service = Self::new().with_external_timeout(config.predictor_timeout());

        if let Some(predictor) = ProcessPredictor::from_config(config) {
            tracing::info!(
                program = %config.predictor_program,
                timeout_secs = config.predictor_timeout_secs,
                "External predictor enabled",
            );
            service = service.with_external(Arc::new(predictor));
        }

        if let (Some(model_path), Some(norm_path)) =
            (&config.model_path, &config.normalization_path)
        {
            let model = LoadedModel::load(model_path, norm_path)
                .map_err(|e| DiagnosisError::ModelUnavailable(e.to_string()))?;
            tracing::info!(model = %model_path.display(), "Numeric model loaded");
            service = service.with_numeric(NumericClassifier::new(model));
        }

        Ok(service)
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    pub fn has_numeric(&self) -> bool {
        self.numeric.is_some()
    }

    /// Classify a reading, falling back until a path succeeds.
    pub async fn diagnose(&self, request: &DiagnosisRequest) -> DiagnosisOutcome {
        let heart_rate = match rules::validate_heart_rate(request.heart_rate) {
            Ok(hr) => hr,
            Err(e) => {
                tracing::warn!(error = %e, "Unusable heart rate, returning degraded diagnosis");
                return DiagnosisOutcome::new(rules::degraded_diagnosis(), DiagnosisSource::RuleBased);
            }
        };

        if self.external.is_some() {
            match self.diagnose_external(request, heart_rate).await {
                Ok(diagnosis) => return self.finish(heart_rate, diagnosis, DiagnosisSource::ExternalModel),
                Err(e) => tracing::warn!(heart_rate, error = %e, "External path failed, falling back"),
            }
        }

        self.diagnose_local(heart_rate)
    }

    /// Like [`diagnose`](Self::diagnose), but gives up when `cancel` fires.
    ///
    /// Cancelling drops the in-flight external call, which kills any child
    /// process it started.
    pub async fn diagnose_cancellable(
        &self,
        request: &DiagnosisRequest,
        cancel: &CancellationToken,
    ) -> DiagnosisResult<DiagnosisOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Diagnosis cancelled");
                Err(DiagnosisError::Cancelled)
            }
            outcome = self.diagnose(request) => Ok(outcome),
        }
    }

    async fn diagnose_external(
        &self,
        request: &DiagnosisRequest,
        heart_rate: f64,
    ) -> DiagnosisResult<Diagnosis> {
        let Some(predictor) = &self.external else {
            return Err(DiagnosisError::ExternalUnavailable("not configured".to_string()));
        };
        let payload = request.external_request(heart_rate);

        let response = tokio::time::timeout(self.external_timeout, predictor.predict(&payload))
            .await
            .map_err(|_| {
                DiagnosisError::ExternalUnavailable(format!(
                    "no answer within {}ms",
                    self.external_timeout.as_millis()
                ))
            })?
            .map_err(|e| DiagnosisError::ExternalUnavailable(e.to_string()))?;

        response
            .into_diagnosis()
            .map_err(|e| DiagnosisError::ExternalUnavailable(e.to_string()))
    }

    fn diagnose_numeric(&self, heart_rate: f64) -> DiagnosisResult<Diagnosis> {
        let Some(classifier) = &self.numeric else {
            return Err(DiagnosisError::ModelUnavailable("not configured".to_string()));
        };
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        classifier
            .classify(heart_rate, &mut *rng)
            .map_err(|e| DiagnosisError::ModelUnavailable(e.to_string()))
    }

    fn diagnose_local(&self, heart_rate: f64) -> DiagnosisOutcome {
        if self.numeric.is_some() {
            match self.diagnose_numeric(heart_rate) {
                Ok(diagnosis) => return self.finish(heart_rate, diagnosis, DiagnosisSource::NumericModel),
                Err(e) => tracing::warn!(heart_rate, error = %e, "Numeric path failed, falling back"),
            }
        }
        self.finish(heart_rate, rules::classify(heart_rate), DiagnosisSource::RuleBased)
    }

    fn finish(&self, heart_rate: f64, diagnosis: Diagnosis, source: DiagnosisSource) -> DiagnosisOutcome {
        tracing::info!(
            heart_rate,
            source = ?source,
            severity = diagnosis.severity.as_str(),
            "Diagnosis complete",
        );
        DiagnosisOutcome::new(diagnosis, source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_matches::assert_matches;
    use pulse_core::severity::SeverityLabel;

    use super::*;

    #[test]
    fn external_request_fills_defaults() {
        let request = DiagnosisRequest {
            heart_rate: Some(90.0),
            age: Some(67.0),
            ..Default::default()
        };
        let payload = request.external_request(90.0);
        assert_eq!(payload.age, 67.0);
        assert_eq!(payload.sex, 1);
        assert_eq!(payload.resting_blood_pressure, 120.0);
        assert_eq!(payload.cholesterol, 200.0);
    }

    #[tokio::test]
    async fn rules_only_service() {
        let service = DiagnosisService::new();
        let outcome = service.diagnose(&DiagnosisRequest::new(150.0)).await;
        assert_eq!(outcome.source, DiagnosisSource::RuleBased);
        assert_eq!(outcome.diagnosis.severity, SeverityLabel::Critical);
    }

    #[tokio::test]
    async fn missing_heart_rate_is_degraded() {
        let service = DiagnosisService::new();
        let outcome = service.diagnose(&DiagnosisRequest::default()).await;
        assert_eq!(outcome.diagnosis, rules::degraded_diagnosis());
    }

    #[test]
    fn from_default_config_has_no_models() {
        let service = DiagnosisService::from_config(&DiagnosisConfig::default()).expect("service");
        assert!(!service.has_external());
        assert!(!service.has_numeric());
    }

    #[test]
    fn missing_model_file_is_a_startup_error() {
        let config = DiagnosisConfig {
            model_path: Some(PathBuf::from("/nonexistent/model.json")),
            normalization_path: Some(PathBuf::from("/nonexistent/normalization.json")),
            ..Default::default()
        };
        assert_matches!(
            DiagnosisService::from_config(&config),
            Err(DiagnosisError::ModelUnavailable(_))
        );
    }
}
