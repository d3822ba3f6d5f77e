//! Async services around `pulse_core`: the diagnosis fallback chain,
//! external predictors, the sample analyzer and environment config.

pub mod analysis;
pub mod config;
pub mod error;
pub mod predictor;
pub mod service;

pub use analysis::{HeartRateAnalyzer, SampleQuery, SampleSource};
pub use config::DiagnosisConfig;
pub use error::{DiagnosisError, DiagnosisResult};
pub use service::{DiagnosisRequest, DiagnosisService};
