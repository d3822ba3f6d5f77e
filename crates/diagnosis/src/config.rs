use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pulse_core::report::{AnalysisQuery, DEFAULT_SAMPLE_LIMIT, DEFAULT_WINDOW_DAYS};

use crate::error::{DiagnosisError, DiagnosisResult};

/// Default bound on one external predictor call.
pub const DEFAULT_PREDICTOR_TIMEOUT_SECS: u64 = 5;

/// Diagnosis service configuration loaded from environment variables.
///
/// Both model-backed paths are optional; with neither configured the
/// service runs on the threshold ladder alone.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisConfig {
    /// Interpreter used to run the predictor script (default: `python3`).
    pub predictor_program: String,
    /// Predictor script. `None` disables the external path.
    pub predictor_script: Option<PathBuf>,
    /// History-model script. `None` disables history predictions.
    pub history_script: Option<PathBuf>,
    /// Working directory for the predictor process.
    pub predictor_workdir: Option<PathBuf>,
    /// Upper bound on one external call (default: `5`).
    pub predictor_timeout_secs: u64,
    /// Softmax model JSON. `None` disables the numeric path.
    pub model_path: Option<PathBuf>,
    /// Normalization JSON; required when `model_path` is set.
    pub normalization_path: Option<PathBuf>,
    /// Look-back window for analyses without explicit dates (default: `7`).
    pub analysis_default_days: u32,
    /// Row cap for analyses (default: `200`).
    pub analysis_default_limit: usize,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            predictor_program: "python3".to_string(),
            predictor_script: None,
            history_script: None,
            predictor_workdir: None,
            predictor_timeout_secs: DEFAULT_PREDICTOR_TIMEOUT_SECS,
            model_path: None,
            normalization_path: None,
            analysis_default_days: DEFAULT_WINDOW_DAYS,
            analysis_default_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }
}

impl DiagnosisConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default   |
    /// |----------------------------|-----------|
    /// | `PREDICTOR_PROGRAM`        | `python3` |
    /// | `PREDICTOR_SCRIPT`         | unset     |
    /// | `HISTORY_PREDICTOR_SCRIPT` | unset     |
    /// | `PREDICTOR_WORKDIR`        | unset     |
    /// | `PREDICTOR_TIMEOUT_SECS`   | `5`       |
    /// | `MODEL_PATH`               | unset     |
    /// | `NORMALIZATION_PATH`       | unset     |
    /// | `ANALYSIS_DEFAULT_DAYS`    | `7`       |
    /// | `ANALYSIS_DEFAULT_LIMIT`   | `200`     |
    pub fn from_env() -> DiagnosisResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> DiagnosisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            predictor_program: get("PREDICTOR_PROGRAM").unwrap_or(defaults.predictor_program),
            predictor_script: get("PREDICTOR_SCRIPT").map(PathBuf::from),
            history_script: get("HISTORY_PREDICTOR_SCRIPT").map(PathBuf::from),
            predictor_workdir: get("PREDICTOR_WORKDIR").map(PathBuf::from),
            predictor_timeout_secs: parse_or(
                "PREDICTOR_TIMEOUT_SECS",
                get("PREDICTOR_TIMEOUT_SECS"),
                defaults.predictor_timeout_secs,
            )?,
            model_path: get("MODEL_PATH").map(PathBuf::from),
            normalization_path: get("NORMALIZATION_PATH").map(PathBuf::from),
            analysis_default_days: parse_or(
                "ANALYSIS_DEFAULT_DAYS",
                get("ANALYSIS_DEFAULT_DAYS"),
                defaults.analysis_default_days,
            )?,
            analysis_default_limit: parse_or(
                "ANALYSIS_DEFAULT_LIMIT",
                get("ANALYSIS_DEFAULT_LIMIT"),
                defaults.analysis_default_limit,
            )?,
        };

        if config.model_path.is_some() && config.normalization_path.is_none() {
            return Err(DiagnosisError::Config(
                "NORMALIZATION_PATH must be set when MODEL_PATH is set".to_string(),
            ));
        }
        if config.predictor_timeout_secs == 0 {
            return Err(DiagnosisError::Config(
                "PREDICTOR_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_secs(self.predictor_timeout_secs)
    }

    /// Analysis query using the configured window and row cap.
    pub fn default_analysis_query(&self) -> AnalysisQuery {
        AnalysisQuery {
            days: self.analysis_default_days,
            limit: self.analysis_default_limit,
            ..Default::default()
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> DiagnosisResult<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| DiagnosisError::Config(format!("{key} must be a valid number, got '{v}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = DiagnosisConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, DiagnosisConfig::default());
        assert_eq!(config.predictor_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn reads_all_variables() {
        let config = DiagnosisConfig::from_lookup(lookup(&[
            ("PREDICTOR_PROGRAM", "/opt/venv/bin/python3"),
            ("PREDICTOR_SCRIPT", "predict.py"),
            ("HISTORY_PREDICTOR_SCRIPT", "predict_history_model.py"),
            ("PREDICTOR_TIMEOUT_SECS", "12"),
            ("MODEL_PATH", "model.json"),
            ("NORMALIZATION_PATH", "normalization.json"),
            ("ANALYSIS_DEFAULT_DAYS", "30"),
            ("ANALYSIS_DEFAULT_LIMIT", "500"),
        ]))
        .expect("config");
        assert_eq!(config.predictor_program, "/opt/venv/bin/python3");
        assert_eq!(config.predictor_script, Some(PathBuf::from("predict.py")));
        assert_eq!(
            config.history_script,
            Some(PathBuf::from("predict_history_model.py"))
        );
        assert_eq!(config.predictor_timeout_secs, 12);
        assert_eq!(config.default_analysis_query().days, 30);
        assert_eq!(config.default_analysis_query().limit, 500);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            DiagnosisConfig::from_lookup(lookup(&[("PREDICTOR_SCRIPT", "  ")])).expect("config");
        assert!(config.predictor_script.is_none());
    }

    #[test]
    fn bad_number_is_a_config_error() {
        assert_matches!(
            DiagnosisConfig::from_lookup(lookup(&[("PREDICTOR_TIMEOUT_SECS", "soon")])),
            Err(DiagnosisError::Config(_))
        );
        assert_matches!(
            DiagnosisConfig::from_lookup(lookup(&[("PREDICTOR_TIMEOUT_SECS", "0")])),
            Err(DiagnosisError::Config(_))
        );
    }

    #[test]
    fn model_requires_normalization() {
        assert_matches!(
            DiagnosisConfig::from_lookup(lookup(&[("MODEL_PATH", "model.json")])),
            Err(DiagnosisError::Config(_))
        );
    }
}
