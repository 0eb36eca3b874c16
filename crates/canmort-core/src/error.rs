use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageEngineError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Extended amortization of {requested} months is shorter than the remaining {remaining} months")]
    ExtensionShorterThanRemaining { requested: u32, remaining: u32 },

    #[error("Extended amortization of {requested} months exceeds the maximum of {maximum} months")]
    ExtensionExceedsMaximum { requested: u32, maximum: u32 },

    #[error("Skip limit reached: {limit} payments already skipped in {year}")]
    SkipLimitExceeded { year: i32, limit: u32 },

    #[error("Simulation cancelled after {completed_iterations} iterations")]
    Cancelled { completed_iterations: u32 },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MortgageEngineError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        MortgageEngineError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by caller input rather than engine state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MortgageEngineError::InvalidInput { .. }
                | MortgageEngineError::ExtensionShorterThanRemaining { .. }
                | MortgageEngineError::ExtensionExceedsMaximum { .. }
                | MortgageEngineError::SkipLimitExceeded { .. }
                | MortgageEngineError::DateError(_)
        )
    }
}

impl From<serde_json::Error> for MortgageEngineError {
    fn from(e: serde_json::Error) -> Self {
        MortgageEngineError::SerializationError(e.to_string())
    }
}
