//! Error taxonomy shared by every engine in the crate.
//!
//! All validation happens eagerly, at construction or on operation entry, so
//! a caller either receives a complete result or one of these variants.
//! Nothing is clamped or truncated silently.

use thiserror::Error;

/// Errors produced by the analysis engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A parameter lies outside its mathematical domain.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An iterative routine exhausted its budget before meeting tolerance.
    #[error(
        "no convergence after {iterations} iterations: achieved {achieved:e}, requested {requested:e}"
    )]
    Convergence {
        /// Iterations consumed.
        iterations: usize,
        /// Last achieved error estimate.
        achieved: f64,
        /// Requested tolerance.
        requested: f64,
    },

    /// The requested integral is provably infinite.
    #[error("divergent integral: {0}")]
    DivergentIntegral(String),

    /// A recursive system has a pole on or outside the unit circle.
    #[error("unstable system: {0}")]
    UnstableSystem(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(msg.into())
    }
}

/// Rejects NaN and infinities for a named scalar parameter.
pub(crate) fn ensure_finite(value: f64, name: &str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::invalid(format!("{name} must be finite, got {value}")))
    }
}
