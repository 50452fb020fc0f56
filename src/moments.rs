//! Moment propagation.
//!
//! Mean and variance of scalar functions of independent random inputs,
//! either through closed-form Taylor expansions, exact quadrature over a
//! Uniform input, or seeded Monte Carlo as a cross-check.
//!
//! Every result says how it was obtained through [`Approximation`]: exact
//! (up to quadrature tolerance) or a Taylor expansion of a given order,
//! together with the smallness assumption that was checked.
//!
//! # Small-spread regime
//!
//! Taylor results are only requested inside the regime they are valid in:
//! each Normal input must satisfy `σ/|μ| < max_relative_spread`
//! (see [`AnalysisConfig`]). Inputs outside it are rejected, never
//! extrapolated.

use log::debug;

use crate::config::{AnalysisConfig, ApproximationOrder};
use crate::distributions::{Normal, RandomVariable, Uniform};
use crate::error::{ensure_finite, AnalysisError, Result};
use crate::integrate::{definite_integral, QuadratureMethod};
use crate::random::{create_rng, sample};
use crate::stats::MomentAccumulator;

/// Finite-difference step, as a fraction of each input's standard deviation.
const DIFF_STEP: f64 = 1e-3;

// ============================================================================
// Result types
// ============================================================================

/// A checked smallness condition `σ/|μ| < limit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmallSpread {
    /// Largest σ/|μ| among the inputs.
    pub relative_spread: f64,
    pub limit: f64,
}

/// How a set of moments was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Approximation {
    /// Exact up to quadrature tolerance.
    Exact,
    Taylor {
        order: ApproximationOrder,
        assumption: Option<SmallSpread>,
    },
}

impl Approximation {
    pub fn is_exact(&self) -> bool {
        matches!(self, Approximation::Exact)
    }
}

/// Mean and variance of a derived quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagatedMoments {
    pub mean: f64,
    pub variance: f64,
    pub approximation: Approximation,
}

impl PropagatedMoments {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// The Normal with the same first two moments.
    ///
    /// # Errors
    /// Returns `Err` when the variance is zero (a degenerate quantity).
    pub fn normal_approximation(&self) -> Result<Normal> {
        Normal::new(self.mean, self.variance)
    }
}

/// Sample moments from [`monte_carlo_moments`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloMoments {
    pub mean: f64,
    /// Unbiased sample variance.
    pub variance: f64,
    pub samples: usize,
}

impl MonteCarloMoments {
    /// Standard error of the mean estimate.
    pub fn standard_error(&self) -> f64 {
        (self.variance / self.samples as f64).sqrt()
    }
}

fn check_spread(inputs: &[Normal], config: &AnalysisConfig) -> Result<SmallSpread> {
    let limit = config.max_relative_spread();
    let relative_spread = inputs
        .iter()
        .map(Normal::relative_spread)
        .fold(0.0, f64::max);
    if !(relative_spread < limit) {
        return Err(AnalysisError::invalid(format!(
            "relative spread σ/|μ| = {relative_spread} is outside the small-spread regime (< {limit})"
        )));
    }
    Ok(SmallSpread {
        relative_spread,
        limit,
    })
}

// ============================================================================
// Closed-form expansions
// ============================================================================

/// Moments of `P = V²/R` for a constant `V` and `R ~ N(R0, σ²)`.
///
/// Second order:
/// - `E[P] ≈ V²/R0 + V²σ²/R0³`
/// - `Var[P] ≈ V⁴σ²/R0⁴ + 3V⁴σ⁴/R0⁶`
///
/// The curvature term of the variance uses the raw fourth moment
/// `E[δ⁴] = 3σ⁴`. First order keeps only the leading terms.
///
/// # Errors
/// Returns `Err` if `V` is not finite or `σ/|R0|` is outside the
/// small-spread regime.
///
/// # Examples
/// ```
/// use u_probkit::config::AnalysisConfig;
/// use u_probkit::distributions::Normal;
/// use u_probkit::moments::propagate_ratio_moments;
/// let r = Normal::new(100.0, 25.0).unwrap();
/// let m = propagate_ratio_moments(10.0, &r, &AnalysisConfig::default()).unwrap();
/// assert!((m.mean - 1.0025).abs() < 1e-12);
/// ```
pub fn propagate_ratio_moments(
    v: f64,
    r: &Normal,
    config: &AnalysisConfig,
) -> Result<PropagatedMoments> {
    ensure_finite(v, "numerator")?;
    let assumption = check_spread(std::slice::from_ref(r), config)?;
    let order = config.order_or(ApproximationOrder::Second);

    let (r0, s2) = (r.mean(), r.variance());
    let v2 = v * v;
    let v4 = v2 * v2;
    let r0_2 = r0 * r0;

    let mut mean = v2 / r0;
    let mut variance = v4 * s2 / (r0_2 * r0_2);
    if order == ApproximationOrder::Second {
        mean += v2 * s2 / (r0_2 * r0);
        variance += 3.0 * v4 * s2 * s2 / (r0_2 * r0_2 * r0_2);
    }
    debug!("ratio V²/R: mean={mean}, variance={variance} ({order:?})");

    Ok(PropagatedMoments {
        mean,
        variance,
        approximation: Approximation::Taylor {
            order,
            assumption: Some(assumption),
        },
    })
}

/// Moments of `τ = C1·C2/(C1 + C2)` for independent Normal inputs.
///
/// With `s = μ1 + μ2`, the delta method gives
/// - `E[τ] ≈ μ1μ2/s`
/// - `Var[τ] ≈ (μ2²/s²)²σ1² + (μ1²/s²)²σ2²`
///
/// which for identical inputs is `N(μ/2, σ²/8)`. This first-order result
/// is what an unset [`AnalysisConfig::approximation_order`] gives. An
/// explicit second order adds the curvature correction
/// `−(μ2²σ1² + μ1²σ2²)/s³` to the mean, and the Gaussian curvature and
/// cross terms to the variance.
///
/// # Errors
/// Returns `Err` if either input is outside the small-spread regime or the
/// means sum to zero.
///
/// # Examples
/// ```
/// use u_probkit::config::{AnalysisConfig, ApproximationOrder};
/// use u_probkit::distributions::Normal;
/// use u_probkit::moments::harmonic_combination_moments;
/// let c = Normal::new(10.0, 0.25).unwrap();
/// let m = harmonic_combination_moments(&c, &c, &AnalysisConfig::default()).unwrap();
/// assert!((m.mean - 5.0).abs() < 1e-12);
/// assert!((m.variance - 0.25 / 8.0).abs() < 1e-12);
///
/// let second = AnalysisConfig::default().with_approximation_order(ApproximationOrder::Second);
/// let curved = harmonic_combination_moments(&c, &c, &second).unwrap();
/// assert!(curved.mean < m.mean);
/// ```
pub fn harmonic_combination_moments(
    c1: &Normal,
    c2: &Normal,
    config: &AnalysisConfig,
) -> Result<PropagatedMoments> {
    let assumption = check_spread(&[*c1, *c2], config)?;
    let order = config.order_or(ApproximationOrder::First);

    let (m1, m2) = (c1.mean(), c2.mean());
    let (v1, v2) = (c1.variance(), c2.variance());
    let s = m1 + m2;
    if s == 0.0 {
        return Err(AnalysisError::invalid(
            "harmonic combination undefined: input means sum to zero",
        ));
    }
    let s2 = s * s;
    let s3 = s2 * s;

    let g1 = m2 * m2 / s2;
    let g2 = m1 * m1 / s2;
    let mut mean = m1 * m2 / s;
    let mut variance = g1 * g1 * v1 + g2 * g2 * v2;

    if order == ApproximationOrder::Second {
        let h11 = -2.0 * m2 * m2 / s3;
        let h22 = -2.0 * m1 * m1 / s3;
        let h12 = 2.0 * m1 * m2 / s3;
        mean += 0.5 * (h11 * v1 + h22 * v2);
        // Normal inputs: E[δ⁴] − σ⁴ = 2σ⁴.
        variance += 0.5 * (h11 * h11 * v1 * v1 + h22 * h22 * v2 * v2) + h12 * h12 * v1 * v2;
    }
    debug!("harmonic combination: mean={mean}, variance={variance} ({order:?})");

    Ok(PropagatedMoments {
        mean,
        variance,
        approximation: Approximation::Taylor {
            order,
            assumption: Some(assumption),
        },
    })
}

// ============================================================================
// Quadrature over a Uniform input
// ============================================================================

/// `E[g(a)]` and `Var[g(a)]` for `a ~ U[low, high]`, by quadrature of
/// `g(a)·1/(high − low)`.
///
/// Typically `g` is a squared transfer magnitude `|H|²` evaluated at a
/// fixed frequency, with `a` an uncertain system coefficient.
///
/// # Errors
/// Returns `Err` if `g` is not finite on the support or the quadrature
/// does not converge.
///
/// # Examples
/// ```
/// use u_probkit::config::AnalysisConfig;
/// use u_probkit::distributions::Uniform;
/// use u_probkit::moments::expected_squared_magnitude_over_uniform;
/// let a = Uniform::new(0.0, 0.5).unwrap();
/// let cfg = AnalysisConfig::default();
/// // DC gain of y[n] = a·y[n−1] + x[n]
/// let dc = expected_squared_magnitude_over_uniform(|a| 1.0 / (1.0 - a).powi(2), &a, &cfg).unwrap();
/// assert!((dc.mean - 2.0).abs() < 1e-8);
/// ```
pub fn expected_squared_magnitude_over_uniform<F>(
    g: F,
    dist: &Uniform,
    config: &AnalysisConfig,
) -> Result<PropagatedMoments>
where
    F: Fn(f64) -> f64,
{
    let (low, high) = (dist.low(), dist.high());
    let density = 1.0 / dist.width();
    let method = QuadratureMethod::AdaptiveSimpson;

    let mean = density * definite_integral(&g, low, high, method, config)?;
    let variance = density
        * definite_integral(
            |a| {
                let d = g(a) - mean;
                d * d
            },
            low,
            high,
            method,
            config,
        )?;
    debug!("E[|H|²] over U[{low}, {high}] = {mean} (variance {variance})");

    Ok(PropagatedMoments {
        mean,
        variance,
        approximation: Approximation::Exact,
    })
}

// ============================================================================
// General propagation
// ============================================================================

/// Taylor propagation of any scalar `f` of independent inputs.
///
/// Derivatives are central differences with a step of `10⁻³·σᵢ`.
///
/// - First order: `E ≈ f(μ)`, `Var ≈ Σ fᵢ²σᵢ²`
/// - Second order adds `½Σ fᵢᵢσᵢ²` to the mean and
///   `¼Σ fᵢᵢ²(μ₄ᵢ − σᵢ⁴) + Σ_{i<j} fᵢⱼ²σᵢ²σⱼ²` to the variance, where
///   `μ₄` is the input's fourth central moment.
///
/// # Errors
/// Returns `Err` if there are no inputs, any input is outside the
/// small-spread regime, or `f` is not finite near the mean.
///
/// # Examples
/// ```
/// use u_probkit::config::AnalysisConfig;
/// use u_probkit::distributions::{Normal, RandomVariable};
/// use u_probkit::moments::taylor_moments;
/// let x = RandomVariable::from(Normal::new(4.0, 0.01).unwrap());
/// let y = RandomVariable::from(Normal::new(5.0, 0.04).unwrap());
/// let m = taylor_moments(|v| v[0] * v[1], &[x, y], &AnalysisConfig::default()).unwrap();
/// assert!((m.mean - 20.0).abs() < 1e-6);
/// ```
pub fn taylor_moments<F>(
    f: F,
    inputs: &[RandomVariable],
    config: &AnalysisConfig,
) -> Result<PropagatedMoments>
where
    F: Fn(&[f64]) -> f64,
{
    if inputs.is_empty() {
        return Err(AnalysisError::invalid("taylor_moments needs at least one input"));
    }
    let limit = config.max_relative_spread();
    let relative_spread = inputs
        .iter()
        .map(|x| x.std_dev() / x.mean().abs())
        .fold(0.0, f64::max);
    if !(relative_spread < limit) {
        return Err(AnalysisError::invalid(format!(
            "relative spread σ/|μ| = {relative_spread} is outside the small-spread regime (< {limit})"
        )));
    }
    let order = config.order_or(ApproximationOrder::Second);

    let n = inputs.len();
    let mu: Vec<f64> = inputs.iter().map(RandomVariable::mean).collect();
    let var: Vec<f64> = inputs.iter().map(RandomVariable::variance).collect();
    let step: Vec<f64> = inputs.iter().map(|x| DIFF_STEP * x.std_dev()).collect();

    let mut point = mu.clone();
    let eval = |point: &[f64]| -> Result<f64> {
        let y = f(point);
        ensure_finite(y, "propagated function")?;
        Ok(y)
    };
    let f0 = eval(&point)?;

    let mut gradient = vec![0.0; n];
    let mut curvature = vec![0.0; n];
    for i in 0..n {
        point[i] = mu[i] + step[i];
        let plus = eval(&point)?;
        point[i] = mu[i] - step[i];
        let minus = eval(&point)?;
        point[i] = mu[i];
        gradient[i] = (plus - minus) / (2.0 * step[i]);
        curvature[i] = (plus - 2.0 * f0 + minus) / (step[i] * step[i]);
    }

    let mut mean = f0;
    let mut variance: f64 = (0..n).map(|i| gradient[i] * gradient[i] * var[i]).sum();

    if order == ApproximationOrder::Second {
        for i in 0..n {
            mean += 0.5 * curvature[i] * var[i];
            let excess = inputs[i].fourth_central_moment() - var[i] * var[i];
            variance += 0.25 * curvature[i] * curvature[i] * excess;
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let mut corner = |si: f64, sj: f64| {
                    point[i] = mu[i] + si * step[i];
                    point[j] = mu[j] + sj * step[j];
                    eval(&point)
                };
                let cross = (corner(1.0, 1.0)? - corner(1.0, -1.0)? - corner(-1.0, 1.0)?
                    + corner(-1.0, -1.0)?)
                    / (4.0 * step[i] * step[j]);
                point[i] = mu[i];
                point[j] = mu[j];
                variance += cross * cross * var[i] * var[j];
            }
        }
    }
    debug!("taylor propagation over {n} inputs: mean={mean}, variance={variance} ({order:?})");

    Ok(PropagatedMoments {
        mean,
        variance,
        approximation: Approximation::Taylor {
            order,
            assumption: Some(SmallSpread {
                relative_spread,
                limit,
            }),
        },
    })
}

/// Seeded Monte Carlo estimate of the mean and variance of `f(inputs)`.
///
/// The same seed always yields the same estimate.
///
/// # Errors
/// Returns `Err` if there are no inputs, fewer than two samples are
/// requested, or `f` produces a non-finite value.
pub fn monte_carlo_moments<F>(
    f: F,
    inputs: &[RandomVariable],
    samples: usize,
    seed: u64,
) -> Result<MonteCarloMoments>
where
    F: Fn(&[f64]) -> f64,
{
    if inputs.is_empty() {
        return Err(AnalysisError::invalid("monte_carlo_moments needs at least one input"));
    }
    if samples < 2 {
        return Err(AnalysisError::invalid(format!(
            "need at least 2 samples, got {samples}"
        )));
    }

    let mut rng = create_rng(seed);
    let mut draw = vec![0.0; inputs.len()];
    let mut acc = MomentAccumulator::new();
    for _ in 0..samples {
        for (slot, input) in draw.iter_mut().zip(inputs) {
            *slot = sample(input, &mut rng);
        }
        let y = f(&draw);
        ensure_finite(y, "sampled function")?;
        acc.update(y);
    }

    let mean = acc.mean().unwrap_or(0.0);
    let variance = acc.sample_variance().unwrap_or(0.0);
    debug!("monte carlo ({samples} samples, seed {seed}): mean={mean}, variance={variance}");
    Ok(MonteCarloMoments {
        mean,
        variance,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn second_order() -> AnalysisConfig {
        AnalysisConfig::default().with_approximation_order(ApproximationOrder::Second)
    }

    fn first_order() -> AnalysisConfig {
        AnalysisConfig::default().with_approximation_order(ApproximationOrder::First)
    }

    fn normal(mean: f64, variance: f64) -> Normal {
        Normal::new(mean, variance).unwrap()
    }

    // --- ratio ---

    #[test]
    fn test_ratio_second_order_formulas() {
        let (v, r0, s2) = (10.0, 100.0, 25.0);
        let m = propagate_ratio_moments(v, &normal(r0, s2), &AnalysisConfig::default()).unwrap();
        let expected_mean = v * v / r0 + v * v * s2 / r0.powi(3);
        let expected_var = v.powi(4) * s2 / r0.powi(4) + 3.0 * v.powi(4) * s2 * s2 / r0.powi(6);
        assert!((m.mean - expected_mean).abs() < 1e-14);
        assert!((m.variance - expected_var).abs() < 1e-15);
        assert!(!m.approximation.is_exact());
    }

    #[test]
    fn test_ratio_first_order_drops_corrections() {
        let m = propagate_ratio_moments(10.0, &normal(100.0, 25.0), &first_order()).unwrap();
        assert!((m.mean - 1.0).abs() < 1e-15);
        assert!((m.variance - 0.0025).abs() < 1e-15);
        assert!(matches!(
            m.approximation,
            Approximation::Taylor {
                order: ApproximationOrder::First,
                ..
            }
        ));
    }

    #[test]
    fn test_ratio_reports_assumption() {
        let m = propagate_ratio_moments(1.0, &normal(50.0, 4.0), &AnalysisConfig::default())
            .unwrap();
        match m.approximation {
            Approximation::Taylor {
                assumption: Some(a),
                ..
            } => {
                assert!((a.relative_spread - 0.04).abs() < 1e-15);
                assert_eq!(a.limit, 0.1);
            }
            other => panic!("unexpected approximation {other:?}"),
        }
    }

    #[test]
    fn test_ratio_rejects_large_spread() {
        let wide = normal(10.0, 4.0); // σ/μ = 0.2
        assert!(matches!(
            propagate_ratio_moments(1.0, &wide, &AnalysisConfig::default()),
            Err(AnalysisError::InvalidInput(_))
        ));
        let relaxed = AnalysisConfig::default()
            .with_max_relative_spread(0.5)
            .unwrap();
        assert!(propagate_ratio_moments(1.0, &wide, &relaxed).is_ok());
        assert!(propagate_ratio_moments(1.0, &normal(0.0, 1.0), &relaxed).is_err());
    }

    #[test]
    fn test_ratio_against_monte_carlo() {
        let r = normal(100.0, 25.0);
        let m = propagate_ratio_moments(10.0, &r, &AnalysisConfig::default()).unwrap();
        let mc = monte_carlo_moments(|x| 100.0 / x[0], &[r.into()], 200_000, 2024).unwrap();
        assert!((m.mean - mc.mean).abs() < 1e-3, "{} vs {}", m.mean, mc.mean);
        assert!(
            (m.variance - mc.variance).abs() / mc.variance < 0.05,
            "{} vs {}",
            m.variance,
            mc.variance
        );
    }

    // --- harmonic ---

    #[test]
    fn test_harmonic_identical_inputs() {
        let c = normal(20.0, 1.0);
        let m = harmonic_combination_moments(&c, &c, &first_order()).unwrap();
        assert!((m.mean - 10.0).abs() < 1e-14);
        assert!((m.variance - 1.0 / 8.0).abs() < 1e-15);
        let approx = m.normal_approximation().unwrap();
        assert_eq!(approx.mean(), m.mean);
    }

    #[test]
    fn test_harmonic_default_is_first_order() {
        let c = normal(20.0, 1.0);
        let m = harmonic_combination_moments(&c, &c, &AnalysisConfig::default()).unwrap();
        assert!((m.mean - 10.0).abs() < 1e-14);
        assert!((m.variance - 0.125).abs() < 1e-15);
        assert!(matches!(
            m.approximation,
            Approximation::Taylor { order: ApproximationOrder::First, .. }
        ));
    }

    #[test]
    fn test_harmonic_second_order_lowers_mean() {
        let c = normal(20.0, 1.0);
        let first = harmonic_combination_moments(&c, &c, &first_order()).unwrap();
        let second = harmonic_combination_moments(&c, &c, &second_order()).unwrap();
        // correction −(μ²σ² + μ²σ²)/(2μ)³ = −σ²/(4μ)
        assert!((first.mean - second.mean - 1.0 / 80.0).abs() < 1e-14);
        assert!(second.variance > first.variance);
    }

    #[test]
    fn test_harmonic_matches_general_taylor() {
        let (a, b) = (normal(10.0, 0.3), normal(30.0, 2.0));
        let cfg = second_order();
        let closed = harmonic_combination_moments(&a, &b, &cfg).unwrap();
        let general =
            taylor_moments(|v| v[0] * v[1] / (v[0] + v[1]), &[a.into(), b.into()], &cfg).unwrap();
        assert!((closed.mean - general.mean).abs() < 1e-7);
        assert!((closed.variance - general.variance).abs() < 1e-7);
    }

    #[test]
    fn test_harmonic_rejects_cancelling_means() {
        let cfg = AnalysisConfig::default();
        assert!(harmonic_combination_moments(&normal(5.0, 0.01), &normal(-5.0, 0.01), &cfg).is_err());
    }

    // --- uniform quadrature ---

    #[test]
    fn test_squared_magnitude_at_dc_and_nyquist() {
        let a = Uniform::new(0.0, 0.5).unwrap();
        let cfg = AnalysisConfig::default();
        let dc = expected_squared_magnitude_over_uniform(|a| 1.0 / (1.0 - a).powi(2), &a, &cfg)
            .unwrap();
        let nyquist =
            expected_squared_magnitude_over_uniform(|a| 1.0 / (1.0 + a).powi(2), &a, &cfg)
                .unwrap();
        assert!((dc.mean - 2.0).abs() < 1e-8);
        assert!((nyquist.mean - 2.0 / 3.0).abs() < 1e-8);
        assert!(dc.approximation.is_exact());
        // E[g²] = 14/3 at DC
        assert!((dc.variance - 2.0 / 3.0).abs() < 1e-8, "{}", dc.variance);
    }

    #[test]
    fn test_squared_magnitude_rejects_pole_in_support() {
        let a = Uniform::new(0.5, 1.0).unwrap();
        let result = expected_squared_magnitude_over_uniform(
            |a| 1.0 / (1.0 - a).powi(2),
            &a,
            &AnalysisConfig::default(),
        );
        assert!(result.is_err());
    }

    // --- general taylor ---

    #[test]
    fn test_taylor_linear_is_exact() {
        let x = RandomVariable::from(normal(4.0, 0.09));
        let y = RandomVariable::from(Uniform::new(9.0, 11.0).unwrap());
        let m = taylor_moments(|v| 2.0 * v[0] + 3.0 * v[1], &[x, y], &AnalysisConfig::default())
            .unwrap();
        assert!((m.mean - 38.0).abs() < 1e-6);
        let expected_var = 4.0 * 0.09 + 9.0 * (4.0 / 12.0);
        assert!((m.variance - expected_var).abs() < 1e-6, "{}", m.variance);
    }

    #[test]
    fn test_taylor_product_recovers_exact_variance() {
        let (mx, vx, my, vy) = (4.0, 0.01, 5.0, 0.04);
        let inputs: [RandomVariable; 2] = [normal(mx, vx).into(), normal(my, vy).into()];
        let m = taylor_moments(|v| v[0] * v[1], &inputs, &AnalysisConfig::default()).unwrap();
        let exact = mx * mx * vy + my * my * vx + vx * vy;
        assert!((m.mean - mx * my).abs() < 1e-6);
        assert!((m.variance - exact).abs() < 1e-6, "{} vs {exact}", m.variance);
    }

    #[test]
    fn test_taylor_ratio_mean_matches_closed_form() {
        let r = normal(100.0, 25.0);
        let cfg = AnalysisConfig::default();
        let closed = propagate_ratio_moments(10.0, &r, &cfg).unwrap();
        let general = taylor_moments(|v| 100.0 / v[0], &[r.into()], &cfg).unwrap();
        assert!((closed.mean - general.mean).abs() < 1e-8);
    }

    #[test]
    fn test_taylor_rejects_empty_and_wide() {
        let cfg = AnalysisConfig::default();
        assert!(taylor_moments(|_| 0.0, &[], &cfg).is_err());
        let centred = RandomVariable::from(Uniform::new(-1.0, 1.0).unwrap());
        assert!(taylor_moments(|v| v[0], &[centred], &cfg).is_err());
    }

    // --- monte carlo ---

    #[test]
    fn test_monte_carlo_is_reproducible() {
        let x = [RandomVariable::from(normal(1.0, 0.5))];
        let a = monte_carlo_moments(|v| v[0] * v[0], &x, 5_000, 11).unwrap();
        let b = monte_carlo_moments(|v| v[0] * v[0], &x, 5_000, 11).unwrap();
        assert_eq!(a, b);
        assert!(a.standard_error() > 0.0);
    }

    #[test]
    fn test_monte_carlo_validation() {
        let x = [RandomVariable::from(normal(1.0, 0.5))];
        assert!(monte_carlo_moments(|v| v[0], &x, 1, 0).is_err());
        assert!(monte_carlo_moments(|v| v[0], &[], 100, 0).is_err());
        assert!(monte_carlo_moments(|_| f64::NAN, &x, 100, 0).is_err());
    }
}
