//! Predictor backed by a model script run as a child process.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::external::{ExternalPredictor, ExternalRequest, ExternalResponse, PredictorError};
use super::subprocess::{self, ProcessInput};
use crate::config::{DiagnosisConfig, DEFAULT_PREDICTOR_TIMEOUT_SECS};

/// Runs `program script`, writes the request as JSON to stdin and reads an
/// [`ExternalResponse`] from stdout.
#[derive(Debug, Clone)]
pub struct ProcessPredictor {
    program: String,
    script: PathBuf,
    working_directory: Option<PathBuf>,
    timeout: Duration,
}

impl ProcessPredictor {
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

    /// Build from config. Returns `None` when no predictor script is set.
    pub fn from_config(config: &DiagnosisConfig) -> Option<Self> {
        let script = config.predictor_script.clone()?;
        let mut predictor = Self::new(config.predictor_program.clone(), script)
            .with_timeout(config.predictor_timeout());
        if let Some(dir) = &config.predictor_workdir {
            predictor = predictor.with_working_directory(dir.clone());
        }
        Some(predictor)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl ExternalPredictor for ProcessPredictor {
    async fn predict(&self, request: &ExternalRequest) -> Result<ExternalResponse, PredictorError> {
        let payload = serde_json::to_value(request)
            .map_err(|e| PredictorError::InvalidRequest(e.to_string()))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script);
        let output = subprocess::run_command(
            &mut cmd,
            ProcessInput {
                payload: Some(payload),
                working_directory: self.working_directory.clone(),
                timeout: self.timeout,
            },
        )
        .await?;

        if output.exit_code != 0 {
            return Err(PredictorError::ExecutionFailed {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        tracing::debug!(
            script = %self.script.display(),
            elapsed_ms = output.elapsed_ms,
            "Predictor finished",
        );
        subprocess::parse_json_stdout(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
