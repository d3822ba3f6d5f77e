//! Label prediction from the history-trained model.
//!
//! The history model is a separate script that takes its inputs as
//! command-line flags and prints one JSON object. It is not part of the
//! diagnosis fallback chain; callers use it directly.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use pulse_core::ideal_metrics::{Gender, SubjectProfile};

use super::external::PredictorError;
use super::subprocess::{self, ProcessInput};
use crate::config::{DiagnosisConfig, DEFAULT_PREDICTOR_TIMEOUT_SECS};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Inputs for one history-model prediction. Unset fields are left off the
/// command line so the script's own defaults apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRequest {
    pub heart_rate: f64,
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub weight: Option<f64>,
    pub conditions: Vec<String>,
    /// Hour of day the reading was taken, 0-23.
    pub hour: Option<u8>,
}

impl HistoryRequest {
    pub fn new(heart_rate: f64) -> Self {
        Self {
            heart_rate,
            ..Default::default()
        }
    }

    /// A request carrying the demographics of `profile`.
    pub fn for_profile(heart_rate: f64, profile: &SubjectProfile) -> Self {
        Self {
            heart_rate,
            age: profile.age,
            gender: profile.gender,
            weight: profile.weight,
            conditions: profile.conditions.clone(),
            hour: None,
        }
    }

    pub fn with_hour(mut self, hour: u8) -> Self {
        self.hour = Some(hour);
        self
    }

    fn validate(&self) -> Result<(), PredictorError> {
        if !self.heart_rate.is_finite() {
            return Err(PredictorError::InvalidRequest(
                "heart rate must be a finite number".to_string(),
            ));
        }
        if let Some(hour) = self.hour.filter(|h| *h > 23) {
            return Err(PredictorError::InvalidRequest(format!(
                "hour must be between 0 and 23, got {hour}"
            )));
        }
        for (name, value) in [("age", self.age), ("weight", self.weight)] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(PredictorError::InvalidRequest(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        Ok(())
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec!["--heartRate".to_string(), self.heart_rate.to_string()];
        if let Some(age) = self.age {
            args.extend(["--age".to_string(), age.to_string()]);
        }
        if let Some(gender) = self.gender {
            args.extend(["--gender".to_string(), gender_arg(gender).to_string()]);
        }
        if let Some(weight) = self.weight {
            args.extend(["--weight".to_string(), weight.to_string()]);
        }
        let conditions: Vec<&str> = self
            .conditions
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if !conditions.is_empty() {
            args.extend(["--conditions".to_string(), conditions.join(",")]);
        }
        if let Some(hour) = self.hour {
            args.extend(["--hour".to_string(), hour.to_string()]);
        }
        args
    }
}

fn gender_arg(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
        Gender::Other => "other",
    }
}

/// Output of the history-model script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPrediction {
    pub success: bool,
    pub prediction: HistoryLabel,
    pub input: HistoryInputEcho,
    #[serde(default)]
    pub meta: HistoryModelMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLabel {
    pub label: String,
    pub label_index: i64,
    /// One probability per class, in label-index order.
    pub probabilities: Vec<f64>,
    /// Label name to class index.
    #[serde(default)]
    pub label_map: BTreeMap<String, i64>,
}

impl HistoryLabel {
    /// Probability of the predicted class, when the script reported it.
    pub fn confidence(&self) -> Option<f64> {
        usize::try_from(self.label_index)
            .ok()
            .and_then(|i| self.probabilities.get(i).copied())
    }
}

/// The inputs as the script understood them, defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInputEcho {
    pub heart_rate: f64,
    pub age: f64,
    pub gender: String,
    pub weight: f64,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub hour: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryModelMeta {
    pub feature_names_count: usize,
    pub conditions_vector_count: usize,
}

// ---------------------------------------------------------------------------
// HistoryPredictor
// ---------------------------------------------------------------------------

/// Runs `program script --heartRate ...` and parses a [`HistoryPrediction`].
#[derive(Debug, Clone)]
pub struct HistoryPredictor {
    program: String,
    script: PathBuf,
    working_directory: Option<PathBuf>,
    timeout: Duration,
}

impl HistoryPredictor {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            working_directory: None,
            timeout: Duration::from_secs(DEFAULT_PREDICTOR_TIMEOUT_SECS),
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from config. Returns `None` when no history script is set.
    ///
    /// Shares the interpreter, working directory and timeout of the
    /// severity predictor.
    pub fn from_config(config: &DiagnosisConfig) -> Option<Self> {
        let script = config.history_script.clone()?;
        let mut predictor = Self::new(config.predictor_program.clone(), script)
            .with_timeout(config.predictor_timeout());
        if let Some(dir) = &config.predictor_workdir {
            predictor = predictor.with_working_directory(dir.clone());
        }
        Some(predictor)
    }

    /// Predict a label for `request`.
    ///
    /// Invalid requests are rejected before anything is spawned. The script
    /// reports its own failures as JSON on stdout, so a failed run carries
    /// stdout when stderr is empty.
    pub async fn predict(&self, request: &HistoryRequest) -> Result<HistoryPrediction, PredictorError> {
        request.validate()?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script).args(request.args());
        let output = subprocess::run_command(
            &mut cmd,
            ProcessInput {
                payload: None,
                working_directory: self.working_directory.clone(),
                timeout: self.timeout,
            },
        )
        .await?;

        if output.exit_code != 0 {
            let detail = if output.stderr.trim().is_empty() {
                &output.stdout
            } else {
                &output.stderr
            };
            tracing::warn!(
                script = %self.script.display(),
                exit_code = output.exit_code,
                "History model failed",
            );
            return Err(PredictorError::ExecutionFailed {
                exit_code: output.exit_code,
                stderr: detail.trim().to_string(),
            });
        }

        let prediction: HistoryPrediction = subprocess::parse_json_stdout(&output.stdout)?;
        if !prediction.success {
            return Err(PredictorError::InvalidResponse(
                "history model reported failure".to_string(),
            ));
        }
        tracing::debug!(
            label = %prediction.prediction.label,
            elapsed_ms = output.elapsed_ms,
            "History model finished",
        );
        Ok(prediction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
