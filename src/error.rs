//! Error types for SSA operations

use thiserror::Error;

/// Result type for SSA operations that never reach a numerical backend
pub type Result<T> = std::result::Result<T, SsaError>;

/// Domain errors raised by the SSA engine.
///
/// Failures coming out of a factorization routine are not represented here:
/// they travel through `anyhow::Error` untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SsaError {
    /// The input series is not one-dimensional, too short or not finite
    #[error("Invalid series: {0}")]
    Validation(String),

    /// Unknown backend or embedding name, window or rank out of range
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// An operation that needs a decomposition was called before `decompose`
    #[error("'{0}' cannot be called before decompose")]
    BadCall(&'static str),

    /// Malformed group mapping, out-of-range index or name conflict
    #[error("Invalid group definition: {0}")]
    GroupDefinition(String),

    /// Unknown group name
    #[error("Unknown group name '{0}'")]
    Lookup(String),
}
