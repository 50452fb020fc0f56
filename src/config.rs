//! Numeric configuration shared by the integration, propagation and
//! process-statistics routines.

use crate::error::{AnalysisError, Result};

/// Order of a Taylor expansion used to propagate moments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApproximationOrder {
    /// Linearization (delta method).
    First,
    /// Keeps curvature terms.
    Second,
}

/// Tuning knobs for the numeric routines.
///
/// | knob | default |
/// |---|---|
/// | `tolerance` | `1e-9` |
/// | `max_iterations` | `1000` |
/// | `approximation_order` | unset: each expansion uses its own order |
/// | `max_relative_spread` | `0.1` |
///
/// `max_relative_spread` bounds σ/|μ| for every small-spread Taylor
/// expansion. Inputs at or above it are rejected instead of extrapolated.
///
/// An unset `approximation_order` lets each propagation routine pick its
/// natural order: second for ratios and general Taylor propagation, first
/// (the delta method) for harmonic combinations.
///
/// # Examples
/// ```
/// use u_probkit::config::{AnalysisConfig, ApproximationOrder};
/// let cfg = AnalysisConfig::default()
///     .with_tolerance(1e-12)
///     .unwrap()
///     .with_approximation_order(ApproximationOrder::First);
/// assert_eq!(cfg.tolerance(), 1e-12);
/// assert_eq!(cfg.max_iterations(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    tolerance: f64,
    max_iterations: usize,
    approximation_order: Option<ApproximationOrder>,
    max_relative_spread: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 1000,
            approximation_order: None,
            max_relative_spread: 0.1,
        }
    }
}

impl AnalysisConfig {
    /// Sets the absolute error tolerance.
    ///
    /// # Errors
    /// Returns `Err` unless `tolerance` is finite and strictly positive.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "tolerance must be finite and > 0, got {tolerance}"
            )));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Sets the iteration budget of iterative routines.
    ///
    /// # Errors
    /// Returns `Err` if `max_iterations` is zero.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(AnalysisError::invalid("max_iterations must be at least 1"));
        }
        self.max_iterations = max_iterations;
        Ok(self)
    }

    pub fn with_approximation_order(mut self, order: ApproximationOrder) -> Self {
        self.approximation_order = Some(order);
        self
    }

    /// Sets the σ/|μ| threshold of the small-spread regime.
    ///
    /// # Errors
    /// Returns `Err` unless `limit ∈ (0, 1)`.
    pub fn with_max_relative_spread(mut self, limit: f64) -> Result<Self> {
        if !(limit > 0.0 && limit < 1.0) {
            return Err(AnalysisError::invalid(format!(
                "max_relative_spread must lie in (0, 1), got {limit}"
            )));
        }
        self.max_relative_spread = limit;
        Ok(self)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// The explicitly requested order, if any.
    pub fn approximation_order(&self) -> Option<ApproximationOrder> {
        self.approximation_order
    }

    /// The requested order, or `default` when none was set.
    pub fn order_or(&self, default: ApproximationOrder) -> ApproximationOrder {
        self.approximation_order.unwrap_or(default)
    }

    pub fn max_relative_spread(&self) -> f64 {
        self.max_relative_spread
    }
}
