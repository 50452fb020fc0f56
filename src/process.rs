//! Second-order statistics of discrete-time wide-sense-stationary processes.
//!
//! A process is described by its mean and autocovariance
//! `C[k] = E[(x[n] − μ)(x[n+k] − μ)]`; the autocorrelation is
//! `R[k] = C[k] + μ²`. Spectra are those of the autocovariance, so the
//! mean only adds a spectral line of weight `μ²` at `ω = 0`.
//!
//! | Operation | Mean | Autocovariance | Spectrum |
//! |---|---|---|---|
//! | FIR filter `h` | μ·H(0) | C_x ∗ r_h | S_x·\|H(ω)\|² |
//! | product of independent X, Y | μ_xμ_y | C_xC_y + μ_y²C_x + μ_x²C_y | lag sum |
//! | AR(1) `y = a·y + x` | μ_x/(1−a) | σ²a^{\|k\|}/(1−a²) | σ²/(1−2a cos ω + a²) |
//!
//! `r_h[m] = Σₙ h[n]h[n+m]` is the deterministic autocorrelation of the
//! impulse response.

use std::f64::consts::PI;

use log::{debug, trace};

use crate::config::AnalysisConfig;
use crate::error::{ensure_finite, AnalysisError, Result};
use crate::random::{create_rng, standard_normal};
use crate::stats::CompensatedSum;

/// Frequencies checked on `[0, π]` when validating a finite autocovariance.
const PSD_GRID: usize = 256;
/// Consecutive negligible lags that end an open-ended lag sum.
const QUIET_LAGS: usize = 16;

// ============================================================================
// Autocovariance
// ============================================================================

/// An even autocovariance sequence, evaluated lazily at any lag.
#[derive(Debug, Clone, PartialEq)]
pub enum Autocovariance {
    /// `C[0..=K]`, zero beyond `K`.
    Finite(Vec<f64>),
    /// `variance · ratio^{|k|}`.
    Geometric { variance: f64, ratio: f64 },
    /// Input covariance convolved with an impulse-response autocorrelation
    /// `kernel[m] = r_h[m]`, `m = 0..L`.
    Filtered {
        input: Box<Autocovariance>,
        kernel: Vec<f64>,
    },
    /// Covariance of the product of two independent processes.
    Product {
        x: Box<Autocovariance>,
        y: Box<Autocovariance>,
        mean_x: f64,
        mean_y: f64,
    },
}

impl Autocovariance {
    /// `C[k]`; even in `k` by construction.
    pub fn at(&self, k: i64) -> f64 {
        let lag = k.unsigned_abs();
        match self {
            Autocovariance::Finite(c) => usize::try_from(lag)
                .ok()
                .and_then(|i| c.get(i))
                .copied()
                .unwrap_or(0.0),
            Autocovariance::Geometric { variance, ratio } => {
                if lag == 0 {
                    *variance
                } else {
                    variance * ratio.powf(lag as f64)
                }
            }
            Autocovariance::Filtered { input, kernel } => {
                let mut acc = CompensatedSum::default();
                for (m, r) in kernel.iter().enumerate() {
                    let m = m as i64;
                    if m == 0 {
                        acc.add(r * input.at(k));
                    } else {
                        let pair = input.at(k.saturating_sub(m)) + input.at(k.saturating_add(m));
                        acc.add(r * pair);
                    }
                }
                acc.total()
            }
            Autocovariance::Product {
                x,
                y,
                mean_x,
                mean_y,
            } => {
                let (cx, cy) = (x.at(k), y.at(k));
                cx * cy + mean_y * mean_y * cx + mean_x * mean_x * cy
            }
        }
    }

    pub fn variance(&self) -> f64 {
        self.at(0)
    }

    /// Power spectral density `S(ω) = Σₖ C[k]·e^{−iωk}`.
    ///
    /// Closed forms are used for geometric sequences and for filtering;
    /// products fall back to a lag sum that stops once lags fall below
    /// `tolerance · C[0]`.
    ///
    /// # Errors
    /// Returns [`AnalysisError::Convergence`] when an open-ended lag sum
    /// needs more than `max_iterations` lags.
    pub fn power_spectral_density(&self, omega: f64, config: &AnalysisConfig) -> Result<f64> {
        ensure_finite(omega, "frequency")?;
        match self {
            Autocovariance::Finite(c) => Ok(finite_spectrum(c, omega)),
            Autocovariance::Geometric { variance, ratio } => {
                let a = *ratio;
                Ok(variance * (1.0 - a * a) / (1.0 - 2.0 * a * omega.cos() + a * a))
            }
            Autocovariance::Filtered { input, kernel } => {
                Ok(input.power_spectral_density(omega, config)? * finite_spectrum(kernel, omega))
            }
            Autocovariance::Product {
                x,
                y,
                mean_x,
                mean_y,
            } => {
                let cross = match pointwise_product(x, y) {
                    Some(closed) => closed.power_spectral_density(omega, config)?,
                    None => {
                        let support = match (x.support(), y.support()) {
                            (Some(a), Some(b)) => Some(a.min(b)),
                            (s, None) | (None, s) => s,
                        };
                        lag_sum(|k| x.at(k) * y.at(k), support, omega, config)?
                    }
                };
                Ok(cross
                    + mean_y * mean_y * x.power_spectral_density(omega, config)?
                    + mean_x * mean_x * y.power_spectral_density(omega, config)?)
            }
        }
    }

    /// Last lag with a possibly non-zero value, if finite.
    fn support(&self) -> Option<usize> {
        match self {
            Autocovariance::Finite(c) => Some(c.len().saturating_sub(1)),
            Autocovariance::Geometric { ratio, .. } => (*ratio == 0.0).then_some(0),
            Autocovariance::Filtered { input, kernel } => {
                input.support().map(|s| s + kernel.len().saturating_sub(1))
            }
            Autocovariance::Product { x, y, .. } => Some(x.support()?.max(y.support()?)),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Autocovariance::Finite(c) => validate_finite(c),
            Autocovariance::Geometric { variance, ratio } => {
                ensure_finite(*variance, "variance")?;
                ensure_finite(*ratio, "correlation ratio")?;
                if *variance < 0.0 || ratio.abs() >= 1.0 {
                    return Err(AnalysisError::invalid(format!(
                        "geometric autocovariance needs variance ≥ 0 and |ratio| < 1, got {variance}, {ratio}"
                    )));
                }
                Ok(())
            }
            Autocovariance::Filtered { input, kernel } => {
                input.validate()?;
                if kernel.is_empty() || kernel.iter().any(|v| !v.is_finite()) {
                    return Err(AnalysisError::invalid(
                        "filter kernel must be non-empty and finite",
                    ));
                }
                Ok(())
            }
            Autocovariance::Product {
                x,
                y,
                mean_x,
                mean_y,
            } => {
                ensure_finite(*mean_x, "mean")?;
                ensure_finite(*mean_y, "mean")?;
                x.validate()?;
                y.validate()
            }
        }
    }
}

/// `c[0] + 2·Σ c[k]·cos(ωk)`.
fn finite_spectrum(c: &[f64], omega: f64) -> f64 {
    let mut acc = CompensatedSum::default();
    acc.add(c.first().copied().unwrap_or(0.0));
    for (k, ck) in c.iter().enumerate().skip(1) {
        acc.add(2.0 * ck * (omega * k as f64).cos());
    }
    acc.total()
}

fn validate_finite(c: &[f64]) -> Result<()> {
    let Some(&c0) = c.first() else {
        return Err(AnalysisError::invalid("autocovariance needs at least C[0]"));
    };
    if c.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::invalid("autocovariance values must be finite"));
    }
    if c0 < 0.0 {
        return Err(AnalysisError::invalid(format!("C[0] must be ≥ 0, got {c0}")));
    }
    if let Some((k, ck)) = c.iter().enumerate().find(|(_, ck)| ck.abs() > c0) {
        return Err(AnalysisError::invalid(format!(
            "|C[{k}]| = {} exceeds C[0] = {c0}",
            ck.abs()
        )));
    }
    let slack = 1e-12 * c.iter().map(|v| v.abs()).sum::<f64>();
    for j in 0..=PSD_GRID {
        let omega = PI * j as f64 / PSD_GRID as f64;
        let s = finite_spectrum(c, omega);
        if s < -slack {
            return Err(AnalysisError::invalid(format!(
                "sequence is not a valid autocovariance: S({omega:.4}) = {s} < 0"
            )));
        }
    }
    Ok(())
}

/// Closed form of `C_x[k]·C_y[k]` where one exists.
fn pointwise_product(x: &Autocovariance, y: &Autocovariance) -> Option<Autocovariance> {
    match (x, y) {
        (
            Autocovariance::Geometric {
                variance: vx,
                ratio: ax,
            },
            Autocovariance::Geometric {
                variance: vy,
                ratio: ay,
            },
        ) => Some(Autocovariance::Geometric {
            variance: vx * vy,
            ratio: ax * ay,
        }),
        (Autocovariance::Finite(c), other) | (other, Autocovariance::Finite(c)) => Some(
            Autocovariance::Finite(
                c.iter()
                    .enumerate()
                    .map(|(k, ck)| ck * other.at(k as i64))
                    .collect(),
            ),
        ),
        _ => None,
    }
}

fn lag_sum<F>(c: F, support: Option<usize>, omega: f64, config: &AnalysisConfig) -> Result<f64>
where
    F: Fn(i64) -> f64,
{
    let c0 = c(0);
    let mut acc = CompensatedSum::default();
    acc.add(c0);

    if let Some(last) = support {
        for k in 1..=last as i64 {
            acc.add(2.0 * c(k) * (omega * k as f64).cos());
        }
        return Ok(acc.total());
    }

    let threshold = config.tolerance() * c0.abs();
    let mut quiet = 0;
    for k in 1..=config.max_iterations() {
        let term = c(k as i64);
        acc.add(2.0 * term * (omega * k as f64).cos());
        if term.abs() <= threshold {
            quiet += 1;
            if quiet == QUIET_LAGS {
                trace!("lag sum settled after {k} lags");
                return Ok(acc.total());
            }
        } else {
            quiet = 0;
        }
    }
    let last = c(config.max_iterations() as i64).abs();
    Err(AnalysisError::Convergence {
        iterations: config.max_iterations(),
        achieved: last / c0.abs().max(f64::MIN_POSITIVE),
        requested: config.tolerance(),
    })
}

// ============================================================================
// WSS process
// ============================================================================

/// A wide-sense-stationary process: constant mean, lag-only covariance.
///
/// # Examples
/// ```
/// use u_probkit::process::WssProcess;
/// let x = WssProcess::from_autocovariance(2.0, vec![1.0, 0.5]).unwrap();
/// assert_eq!(x.variance(), 1.0);
/// assert_eq!(x.autocorrelation(-1), 0.5 + 4.0);
/// assert_eq!(x.autocorrelation(3), 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WssProcess {
    mean: f64,
    autocovariance: Autocovariance,
}

impl WssProcess {
    /// # Errors
    /// Returns `Err` if the mean is not finite or the autocovariance is not
    /// a valid one (negative variance, `|C[k]| > C[0]`, a negative
    /// spectrum, `|ratio| ≥ 1`).
    pub fn new(mean: f64, autocovariance: Autocovariance) -> Result<Self> {
        ensure_finite(mean, "mean")?;
        autocovariance.validate()?;
        Ok(Self {
            mean,
            autocovariance,
        })
    }

    pub fn from_autocovariance(mean: f64, lags: Vec<f64>) -> Result<Self> {
        Self::new(mean, Autocovariance::Finite(lags))
    }

    /// Uncorrelated samples with the given mean and variance.
    pub fn white_noise(mean: f64, variance: f64) -> Result<Self> {
        Self::from_autocovariance(mean, vec![variance])
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn autocovariance(&self) -> &Autocovariance {
        &self.autocovariance
    }

    pub fn variance(&self) -> f64 {
        self.autocovariance.variance()
    }

    /// `R[k] = C[k] + μ²`.
    pub fn autocorrelation(&self, k: i64) -> f64 {
        self.autocovariance.at(k) + self.mean * self.mean
    }

    /// Spectrum of the fluctuating part; see [`Autocovariance::power_spectral_density`].
    pub fn power_spectral_density(&self, omega: f64, config: &AnalysisConfig) -> Result<f64> {
        self.autocovariance.power_spectral_density(omega, config)
    }
}

// ============================================================================
// LTI systems
// ============================================================================

/// A causal FIR filter `y[n] = Σₘ h[m]·x[n−m]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LtiSystem {
    impulse_response: Vec<f64>,
}

impl LtiSystem {
    /// # Errors
    /// Returns `Err` if `h` is empty or contains non-finite taps.
    pub fn fir(h: Vec<f64>) -> Result<Self> {
        if h.is_empty() {
            return Err(AnalysisError::invalid("impulse response needs at least one tap"));
        }
        if h.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::invalid("impulse response taps must be finite"));
        }
        Ok(Self {
            impulse_response: h,
        })
    }

    pub fn impulse_response(&self) -> &[f64] {
        &self.impulse_response
    }

    /// `H(0) = Σ h[n]`.
    pub fn dc_gain(&self) -> f64 {
        self.impulse_response.iter().sum()
    }

    /// `|H(ω)|²`.
    pub fn magnitude_squared(&self, omega: f64) -> f64 {
        let (mut re, mut im) = (0.0, 0.0);
        for (n, h) in self.impulse_response.iter().enumerate() {
            let phase = omega * n as f64;
            re += h * phase.cos();
            im -= h * phase.sin();
        }
        re * re + im * im
    }

    /// `r_h[m] = Σₙ h[n]·h[n+m]` for `m = 0..L`.
    pub fn impulse_autocorrelation(&self) -> Vec<f64> {
        let h = &self.impulse_response;
        (0..h.len())
            .map(|m| h.iter().zip(&h[m..]).map(|(a, b)| a * b).sum())
            .collect()
    }
}

/// Output statistics of an LTI system driven by a WSS process.
///
/// `μ_y = μ_x·H(0)` and `C_y = C_x ∗ r_h`, so `S_y(ω) = S_x(ω)·|H(ω)|²`.
/// A finite input covariance yields a finite output covariance.
///
/// # Examples
/// ```
/// use u_probkit::process::{lti_output_statistics, LtiSystem, WssProcess};
/// let noise = WssProcess::white_noise(1.0, 1.0).unwrap();
/// let sum2 = LtiSystem::fir(vec![1.0, 1.0]).unwrap();
/// let y = lti_output_statistics(&noise, &sum2);
/// assert_eq!(y.mean(), 2.0);
/// assert_eq!(y.variance(), 2.0);
/// assert_eq!(y.autocovariance().at(1), 1.0);
/// ```
pub fn lti_output_statistics(input: &WssProcess, system: &LtiSystem) -> WssProcess {
    let filtered = Autocovariance::Filtered {
        input: Box::new(input.autocovariance.clone()),
        kernel: system.impulse_autocorrelation(),
    };
    let autocovariance = match filtered.support() {
        Some(last) if matches!(input.autocovariance, Autocovariance::Finite(_)) => {
            Autocovariance::Finite((0..=last as i64).map(|k| filtered.at(k)).collect())
        }
        _ => filtered,
    };
    let mean = input.mean * system.dc_gain();
    debug!(
        "LTI output: mean={mean}, variance={} ({} taps)",
        autocovariance.variance(),
        system.impulse_response.len()
    );
    WssProcess {
        mean,
        autocovariance,
    }
}

/// Product `Z = X·Y` of independent WSS processes.
///
/// - `μ_Z = μ_xμ_y`
/// - `Var[Z] = σ_x²σ_y² + μ_x²σ_y² + μ_y²σ_x²`
/// - `R_Z[k] = R_x[k]·R_y[k]`
///
/// # Examples
/// ```
/// use u_probkit::process::{product_of_independent_processes, WssProcess};
/// let x = WssProcess::white_noise(2.0, 1.0).unwrap();
/// let y = WssProcess::white_noise(3.0, 4.0).unwrap();
/// let z = product_of_independent_processes(&x, &y);
/// assert_eq!(z.mean(), 6.0);
/// assert_eq!(z.variance(), 1.0 * 4.0 + 4.0 * 4.0 + 9.0 * 1.0);
/// ```
pub fn product_of_independent_processes(x: &WssProcess, y: &WssProcess) -> WssProcess {
    let z = WssProcess {
        mean: x.mean * y.mean,
        autocovariance: Autocovariance::Product {
            x: Box::new(x.autocovariance.clone()),
            y: Box::new(y.autocovariance.clone()),
            mean_x: x.mean,
            mean_y: y.mean,
        },
    };
    debug!("process product: mean={}, variance={}", z.mean, z.variance());
    z
}

// ============================================================================
// AR(1)
// ============================================================================

/// First-order autoregression `y[n] = a·y[n−1] + x[n]` driven by white
/// noise `x` with mean `μ_x` and variance `σ²`.
///
/// # Examples
/// ```
/// use u_probkit::process::ArProcess;
/// let ar = ArProcess::new(0.8, 1.0).unwrap();
/// let stats = ar.statistics();
/// assert!((stats.variance - 1.0 / 0.36).abs() < 1e-12);
/// assert!(ArProcess::new(1.0, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArProcess {
    coefficient: f64,
    noise_variance: f64,
    noise_mean: f64,
}

/// Steady-state statistics of an [`ArProcess`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArStatistics {
    pub mean: f64,
    pub variance: f64,
    pub process: WssProcess,
}

impl ArStatistics {
    /// `Var[y]·a^{|k|}`.
    pub fn autocovariance(&self, k: i64) -> f64 {
        self.process.autocovariance().at(k)
    }

    pub fn autocorrelation(&self, k: i64) -> f64 {
        self.process.autocorrelation(k)
    }
}

impl ArProcess {
    /// # Errors
    /// - [`AnalysisError::UnstableSystem`] if `|a| ≥ 1`.
    /// - [`AnalysisError::InvalidInput`] for non-finite parameters or a
    ///   negative noise variance.
    pub fn new(coefficient: f64, noise_variance: f64) -> Result<Self> {
        ensure_finite(coefficient, "AR coefficient")?;
        ensure_finite(noise_variance, "noise variance")?;
        if coefficient.abs() >= 1.0 {
            return Err(AnalysisError::UnstableSystem(format!(
                "AR(1) pole at {coefficient} is not inside the unit circle"
            )));
        }
        if noise_variance < 0.0 {
            return Err(AnalysisError::invalid(format!(
                "noise variance must be ≥ 0, got {noise_variance}"
            )));
        }
        Ok(Self {
            coefficient,
            noise_variance,
            noise_mean: 0.0,
        })
    }

    pub fn with_noise_mean(mut self, mean: f64) -> Result<Self> {
        ensure_finite(mean, "noise mean")?;
        self.noise_mean = mean;
        Ok(self)
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    pub fn noise_mean(&self) -> f64 {
        self.noise_mean
    }

    pub fn statistics(&self) -> ArStatistics {
        let a = self.coefficient;
        let mean = self.noise_mean / (1.0 - a);
        let variance = self.noise_variance / (1.0 - a * a);
        debug!("AR(1) a={a}: mean={mean}, variance={variance}");
        ArStatistics {
            mean,
            variance,
            process: WssProcess {
                mean,
                autocovariance: Autocovariance::Geometric { variance, ratio: a },
            },
        }
    }

    /// `|H(ω)|² = 1/(1 − 2a·cos ω + a²)`.
    pub fn gain_squared(&self, omega: f64) -> f64 {
        let a = self.coefficient;
        1.0 / (1.0 - 2.0 * a * omega.cos() + a * a)
    }

    /// A seeded sample path with Gaussian driving noise.
    ///
    /// The recursion starts from a draw of the stationary distribution and
    /// discards `burn_in` steps before recording `len` samples.
    pub fn simulate(&self, len: usize, burn_in: usize, seed: u64) -> Vec<f64> {
        let mut rng = create_rng(seed);
        let stationary = self.statistics();
        let sigma = self.noise_variance.sqrt();
        let mut y = stationary.mean + stationary.variance.sqrt() * standard_normal(&mut rng);
        let mut path = Vec::with_capacity(len);
        for step in 0..burn_in + len {
            y = self.coefficient * y + self.noise_mean + sigma * standard_normal(&mut rng);
            if step >= burn_in {
                path.push(y);
            }
        }
        path
    }
}

/// Steady-state mean, variance and autocovariance of a zero-mean-driven
/// AR(1) process.
///
/// # Errors
/// Returns [`AnalysisError::UnstableSystem`] if `|a| ≥ 1`.
pub fn ar_process_statistics(coefficient: f64, noise_variance: f64) -> Result<ArStatistics> {
    Ok(ArProcess::new(coefficient, noise_variance)?.statistics())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn ar_autocovariance_even_geometric(a in -0.99_f64..0.99, s2 in 0.01_f64..10.0, k in 0_i64..30) {
            let st = ar_process_statistics(a, s2).unwrap();
            prop_assert_eq!(st.autocovariance(k), st.autocovariance(-k));
            let expected = st.variance * a.powi(k as i32);
            prop_assert!((st.autocovariance(k) - expected).abs() <= 1e-12 * st.variance);
        }

        #[test]
        fn filtered_spectrum_non_negative(
            taps in proptest::collection::vec(-2.0_f64..2.0, 1..6),
            a in -0.9_f64..0.9,
            w in 0.0_f64..PI,
        ) {
            let cfg = AnalysisConfig::default();
            let x = ar_process_statistics(a, 1.0).unwrap().process;
            let y = lti_output_statistics(&x, &LtiSystem::fir(taps).unwrap());
            prop_assert!(y.power_spectral_density(w, &cfg).unwrap() >= -1e-12);
            prop_assert!(y.variance() >= -1e-12);
        }

        #[test]
        fn product_variance_formula(
            mx in -5.0_f64..5.0, vx in 0.0_f64..4.0,
            my in -5.0_f64..5.0, vy in 0.0_f64..4.0,
        ) {
            let x = WssProcess::white_noise(mx, vx).unwrap();
            let y = WssProcess::white_noise(my, vy).unwrap();
            let z = product_of_independent_processes(&x, &y);
            let expected = vx * vy + mx * mx * vy + my * my * vx;
            prop_assert!((z.variance() - expected).abs() <= 1e-12 * expected.max(1.0));
        }
    }
}
