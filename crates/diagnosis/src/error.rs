use pulse_core::error::CoreError;

/// Service-level error type.
///
/// Wraps [`CoreError`] for domain errors and adds variants for the async
/// collaborators. `ExternalUnavailable` never leaves the fallback chain;
/// `ModelUnavailable` reaches callers only from startup wiring.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    /// A domain-level error from `pulse_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The external predictor failed, timed out, or returned garbage.
    #[error("External predictor unavailable: {0}")]
    ExternalUnavailable(String),

    /// No numeric model is configured, or scoring failed.
    #[error("Numeric model unavailable: {0}")]
    ModelUnavailable(String),

    /// The sample store could not be queried.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller cancelled the request before it finished.
    #[error("Request cancelled")]
    Cancelled,
}

/// Convenience type alias for service return values.
pub type DiagnosisResult<T> = Result<T, DiagnosisError>;
