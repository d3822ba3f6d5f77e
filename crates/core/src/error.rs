#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A caller-supplied value failed a domain rule (bad config, too few samples, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A heart-rate reading that is missing or not a finite number.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
