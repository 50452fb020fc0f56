//! Input distributions.
//!
//! The propagation engines accept independent scalar inputs drawn from one
//! of two families, each with analytical moments:
//!
//! | Distribution | Parameters | Mean | Variance | 4th central moment |
//! |---|---|---|---|---|
//! | [`Normal`] | μ, σ² | μ | σ² | 3σ⁴ |
//! | [`Uniform`] | low, high | (a+b)/2 | (b−a)²/12 | (b−a)⁴/80 |
//!
//! [`RandomVariable`] is the tagged union the engines consume.

use crate::error::{AnalysisError, Result};
use crate::special;

// ============================================================================
// Normal Distribution
// ============================================================================

/// Normal (Gaussian) distribution N(μ, σ²).
///
/// # Mathematical Definition
/// - PDF: φ(x) = (1/(σ√(2π))) exp(−(x−μ)²/(2σ²))
/// - CDF: Φ((x−μ)/σ)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    variance: f64,
}

impl Normal {
    /// Creates N(mean, variance).
    ///
    /// # Errors
    /// Returns `Err` if `variance ≤ 0` or either parameter is not finite.
    ///
    /// # Examples
    /// ```
    /// use u_probkit::distributions::Normal;
    /// let r = Normal::new(100.0, 4.0).unwrap();
    /// assert_eq!(r.std_dev(), 2.0);
    /// assert!(Normal::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(mean: f64, variance: f64) -> Result<Self> {
        if !mean.is_finite() || !variance.is_finite() || variance <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "Normal requires finite μ and σ² > 0, got μ={mean}, σ²={variance}"
            )));
        }
        Ok(Self { mean, variance })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// σ/|μ|; infinite for a zero-mean input.
    pub fn relative_spread(&self) -> f64 {
        self.std_dev() / self.mean.abs()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let sigma = self.std_dev();
        special::standard_normal_pdf((x - self.mean) / sigma) / sigma
    }

    pub fn cdf(&self, x: f64) -> f64 {
        special::standard_normal_cdf((x - self.mean) / self.std_dev())
    }
}

// ============================================================================
// Uniform Distribution
// ============================================================================

/// Continuous uniform distribution on `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniform {
    low: f64,
    high: f64,
}

impl Uniform {
    /// Creates U[low, high].
    ///
    /// # Errors
    /// Returns `Err` if `low >= high` or either bound is not finite.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(AnalysisError::invalid(format!(
                "Uniform requires low < high, got low={low}, high={high}"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn mean(&self) -> f64 {
        0.5 * (self.low + self.high)
    }

    pub fn variance(&self) -> f64 {
        let w = self.width();
        w * w / 12.0
    }

    /// PDF: 1/(high−low) on the support, 0 elsewhere.
    pub fn pdf(&self, x: f64) -> f64 {
        if (self.low..=self.high).contains(&x) {
            1.0 / self.width()
        } else {
            0.0
        }
    }

    /// CDF clamped to [0, 1].
    pub fn cdf(&self, x: f64) -> f64 {
        ((x - self.low) / self.width()).clamp(0.0, 1.0)
    }

    /// Inverse CDF; `None` if `p ∉ [0, 1]`.
    pub fn quantile(&self, p: f64) -> Option<f64> {
        (0.0..=1.0)
            .contains(&p)
            .then(|| self.low + p * self.width())
    }
}

// ============================================================================
// Tagged Union
// ============================================================================

/// An independent scalar input to a propagation engine.
///
/// # Examples
/// ```
/// use u_probkit::distributions::{Normal, RandomVariable, Uniform};
/// let inputs = [
///     RandomVariable::from(Normal::new(10.0, 0.25).unwrap()),
///     RandomVariable::from(Uniform::new(0.0, 0.5).unwrap()),
/// ];
/// assert_eq!(inputs[0].mean(), 10.0);
/// assert!((inputs[1].variance() - 0.25 / 12.0).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RandomVariable {
    Normal(Normal),
    Uniform(Uniform),
}

impl RandomVariable {
    pub fn mean(&self) -> f64 {
        match self {
            RandomVariable::Normal(n) => n.mean(),
            RandomVariable::Uniform(u) => u.mean(),
        }
    }

    pub fn variance(&self) -> f64 {
        match self {
            RandomVariable::Normal(n) => n.variance(),
            RandomVariable::Uniform(u) => u.variance(),
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// E[(X − μ)⁴]: 3σ⁴ for Normal, 9σ⁴/5 for Uniform.
    pub fn fourth_central_moment(&self) -> f64 {
        let v = self.variance();
        match self {
            RandomVariable::Normal(_) => 3.0 * v * v,
            RandomVariable::Uniform(_) => 1.8 * v * v,
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            RandomVariable::Normal(n) => n.pdf(x),
            RandomVariable::Uniform(u) => u.pdf(x),
        }
    }

    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            RandomVariable::Normal(n) => n.cdf(x),
            RandomVariable::Uniform(u) => u.cdf(x),
        }
    }
}

impl From<Normal> for RandomVariable {
    fn from(n: Normal) -> Self {
        RandomVariable::Normal(n)
    }
}

impl From<Uniform> for RandomVariable {
    fn from(u: Uniform) -> Self {
        RandomVariable::Uniform(u)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn uniform_quantile_roundtrip(
            low in -100.0_f64..0.0,
            high in 1.0_f64..100.0,
            p in 0.0_f64..=1.0,
        ) {
            let u = Uniform::new(low, high).unwrap();
            let x = u.quantile(p).unwrap();
            prop_assert!((u.cdf(x) - p).abs() < 1e-12);
        }

        #[test]
        fn normal_cdf_in_01(mean in -50.0_f64..50.0, var in 0.01_f64..100.0, x in -200.0_f64..200.0) {
            let n = Normal::new(mean, var).unwrap();
            let c = n.cdf(x);
            prop_assert!((0.0..=1.0).contains(&c));
        }
    }
}
