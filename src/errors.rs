use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

use crate::context::Backend;

// Every failure an assignment or configuration call can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    // The requested backend's engine is not present; raised when selecting it
    #[error("backend `{0}` is not supported in this environment")]
    UnsupportedBackend(Backend),

    // Malformed expression, or an operand of the wrong kind (missing unit, fractional integer, ...)
    #[error("parse error: {0}")]
    Parse(String),

    // The expression (or the target) names a length, counter or function that does not exist
    #[error("undefined reference: {0}")]
    UndefinedReference(String),

    // An evaluator was asked to run while its engine is missing
    #[error("engine for backend `{0}` is unavailable")]
    EngineUnavailable(Backend),

    // Overflow, division by zero, non-finite results
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    // Bad key or value in a configuration option string
    #[error("configuration error: {0}")]
    Config(String),
}

impl CalcError {
    pub(crate) fn too_large() -> Self {
        CalcError::Arithmetic("dimension too large".into())
    }

    pub(crate) fn division_by_zero() -> Self {
        CalcError::Arithmetic("division by zero".into())
    }
}

// Type alias for results that use `CalcError` as the error type
pub type Result<T> = std::result::Result<T, CalcError>;
