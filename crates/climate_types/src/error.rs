//! Error types for climate computations.

/// Result type alias
pub type Result<T> = std::result::Result<T, ClimateError>;

/// Errors raised by the pure climate computations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClimateError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),
}
