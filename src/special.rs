//! Special functions.
//!
//! Closed-form building blocks for the reliability and moment engines:
//! the Gaussian PDF/CDF, the Gamma function, and the exponential
//! integral E1 that appears in the MTTF of an exponentially growing hazard.

use crate::error::{AnalysisError, Result};

/// 1/√(2π) ≈ 0.3989422804014327
const FRAC_1_SQRT_2PI: f64 = 0.3989422804014326779399460599343818684758586311649;

/// Euler–Mascheroni constant γ.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Iteration cap shared by the E1 series and continued fraction.
const E1_MAX_ITER: usize = 200;
const E1_EPS: f64 = 4.0 * f64::EPSILON;
const TINY: f64 = 1e-300;

/// Standard normal PDF φ(x) = (1/√(2π)) exp(-x²/2).
///
/// # Examples
/// ```
/// use u_probkit::special::standard_normal_pdf;
/// let peak = standard_normal_pdf(0.0);
/// assert!((peak - 0.3989422804014327).abs() < 1e-15);
/// ```
pub fn standard_normal_pdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Approximation of the standard normal CDF Φ(x) = P(Z ≤ x) for Z ~ N(0,1).
///
/// # Algorithm
/// Abramowitz & Stegun formula 26.2.17, polynomial in `k = 1/(1 + 0.2316419|x|)`
/// evaluated by Horner's rule, with Φ(-x) = 1 - Φ(x).
///
/// # Accuracy
/// Maximum absolute error < 7.5 × 10⁻⁸.
///
/// # Examples
/// ```
/// use u_probkit::special::standard_normal_cdf;
/// assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!((standard_normal_cdf(1.96) - 0.975).abs() < 1e-3);
/// ```
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x.is_infinite() {
        return if x > 0.0 { 1.0 } else { 0.0 };
    }

    let abs_x = x.abs();
    let k = 1.0 / (1.0 + 0.2316419 * abs_x);
    let poly = k
        * (0.319381530
            + k * (-0.356563782 + k * (1.781477937 + k * (-1.821255978 + k * 1.330274429))));
    let upper_tail = standard_normal_pdf(abs_x) * poly;

    if x >= 0.0 {
        1.0 - upper_tail
    } else {
        upper_tail
    }
}

/// Lanczos approximation (g = 7) of ln Γ(x).
///
/// # Accuracy
/// Relative error < 2 × 10⁻¹⁰ for x > 0.
///
/// # Examples
/// ```
/// use u_probkit::special::ln_gamma;
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const LANCZOS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;
    let pi = std::f64::consts::PI;

    if x < 0.5 {
        // Γ(x)·Γ(1−x) = π/sin(πx)
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let series = LANCZOS[1..]
        .iter()
        .enumerate()
        .fold(LANCZOS[0], |acc, (i, &c)| acc + c / (z + i as f64 + 1.0));
    let t = z + G + 0.5;
    0.5 * (2.0 * pi).ln() + (z + 0.5) * t.ln() - t + series.ln()
}

/// Gamma function Γ(x) = exp(ln Γ(x)) for x > 0.
///
/// # Examples
/// ```
/// use u_probkit::special::gamma;
/// assert!((gamma(5.0) - 24.0).abs() < 1e-8);
/// assert!((gamma(0.5) - std::f64::consts::PI.sqrt()).abs() < 1e-10);
/// ```
pub fn gamma(x: f64) -> f64 {
    ln_gamma(x).exp()
}

// ============================================================================
// Exponential Integral
// ============================================================================

/// Exponential integral E1(x) = ∫₁^∞ e^{-xv}/v dv for x > 0.
///
/// # Algorithm
/// - `x ≤ 1`: power series `E1(x) = −γ − ln x − Σ_{k≥1} (−x)^k / (k·k!)`.
/// - `x > 1`: continued fraction evaluated with the modified Lentz method.
///
/// Reference: Abramowitz & Stegun (1964), formulas 5.1.11 and 5.1.22;
/// Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.3.
///
/// # Accuracy
/// Relative error near machine precision; at least 12 significant digits
/// across the domain.
///
/// # Errors
/// - [`AnalysisError::InvalidInput`] if `x ≤ 0` or `x` is NaN.
/// - [`AnalysisError::Convergence`] if the expansion fails to settle.
///
/// # Examples
/// ```
/// use u_probkit::special::exponential_integral_e1;
/// let e1 = exponential_integral_e1(1.0).unwrap();
/// assert!((e1 - 0.219383934395520).abs() < 1e-12);
/// assert!(exponential_integral_e1(0.0).is_err());
/// ```
pub fn exponential_integral_e1(x: f64) -> Result<f64> {
    check_e1_domain(x)?;
    if x.is_infinite() {
        return Ok(0.0);
    }
    if x <= 1.0 {
        e1_series(x)
    } else {
        Ok(e1_continued_fraction(x)? * (-x).exp())
    }
}

/// Scaled exponential integral eˣ·E1(x) for x > 0.
///
/// Stays finite where `E1(x)` underflows, which keeps products such as
/// `e^{λ₀/β}·E1(λ₀/β)` accurate for large arguments. Behaves like `1/x`
/// as `x → ∞`.
///
/// # Examples
/// ```
/// use u_probkit::special::scaled_exponential_integral_e1;
/// let s = scaled_exponential_integral_e1(800.0).unwrap();
/// assert!((s * 800.0 - 1.0).abs() < 2e-3);
/// ```
pub fn scaled_exponential_integral_e1(x: f64) -> Result<f64> {
    check_e1_domain(x)?;
    if x.is_infinite() {
        return Ok(0.0);
    }
    if x <= 1.0 {
        Ok(e1_series(x)? * x.exp())
    } else {
        e1_continued_fraction(x)
    }
}

fn check_e1_domain(x: f64) -> Result<()> {
    if x.is_nan() || x <= 0.0 {
        return Err(AnalysisError::invalid(format!(
            "E1 is defined for x > 0, got {x}"
        )));
    }
    Ok(())
}

fn e1_series(x: f64) -> Result<f64> {
    let mut sum = 0.0;
    // term_k = (−1)^{k+1} x^k / k!
    let mut term = 1.0;
    for k in 1..=E1_MAX_ITER {
        let kf = k as f64;
        term *= -x / kf;
        let contribution = -term / kf;
        sum += contribution;
        if contribution.abs() < E1_EPS * sum.abs() {
            return Ok(-EULER_GAMMA - x.ln() + sum);
        }
    }
    Err(AnalysisError::Convergence {
        iterations: E1_MAX_ITER,
        achieved: (term / E1_MAX_ITER as f64).abs(),
        requested: E1_EPS,
    })
}

/// Continued fraction for eˣ·E1(x), valid for x > 1.
fn e1_continued_fraction(x: f64) -> Result<f64> {
    let mut b = x + 1.0;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    let mut delta = f64::INFINITY;

    for i in 1..=E1_MAX_ITER {
        let an = -((i * i) as f64);
        b += 2.0;
        d = 1.0 / (an * d + b);
        c = b + an / c;
        delta = c * d;
        h *= delta;
        if (delta - 1.0).abs() < E1_EPS {
            return Ok(h);
        }
    }
    Err(AnalysisError::Convergence {
        iterations: E1_MAX_ITER,
        achieved: (delta - 1.0).abs(),
        requested: E1_EPS,
    })
}
