//! Numerically stable accumulation.
//!
//! Quadrature panels, lag sums and Monte Carlo estimates all reduce long
//! streams of `f64` values; these helpers keep that reduction free of
//! catastrophic cancellation.
//!
//! - **Sums**: Neumaier compensated summation, O(ε) error independent of n.
//!   Reference: Neumaier (1974), *ZAMM* 54(1), pp. 39–51.
//! - **Moments**: Welford's online algorithm.
//!   Reference: Welford (1962), *Technometrics* 4(3), pp. 419–420.

/// Neumaier compensated sum of an iterator of values.
///
/// # Examples
/// ```
/// use u_probkit::stats::compensated_sum;
/// let s = compensated_sum([1e16, 1.0, -1e16]);
/// assert_eq!(s, 1.0);
/// ```
pub fn compensated_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut acc = CompensatedSum::default();
    for x in values {
        acc.add(x);
    }
    acc.total()
}

/// Running Neumaier sum, for loops that interleave accumulation with
/// convergence checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Streaming accumulator for mean and variance.
///
/// # Examples
/// ```
/// use u_probkit::stats::MomentAccumulator;
/// let mut acc = MomentAccumulator::new();
/// for &x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     acc.update(x);
/// }
/// assert!((acc.mean().unwrap() - 5.0).abs() < 1e-15);
/// assert!((acc.sample_variance().unwrap() - 4.571428571428571).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MomentAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl MomentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` until at least one sample has been seen.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Unbiased variance (denominator `n − 1`); `None` for fewer than 2 samples.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }

    /// Population variance (denominator `n`); `None` when empty.
    pub fn population_variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensated_sum_recovers_lost_bits() {
        let data = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(compensated_sum(data), 2.0);
    }

    #[test]
    fn test_compensated_sum_empty() {
        assert_eq!(compensated_sum(std::iter::empty()), 0.0);
    }

    #[test]
    fn test_many_small_terms() {
        let s = compensated_sum(std::iter::repeat(0.1).take(1_000_000));
        assert!((s - 100_000.0).abs() < 1e-8, "got {s}");
    }

    #[test]
    fn test_running_sum_matches_batch() {
        let data: Vec<f64> = (1..=100).map(|i| 1.0 / i as f64).collect();
        let mut running = CompensatedSum::default();
        for &x in &data {
            running.add(x);
        }
        assert_eq!(running.total(), compensated_sum(data.iter().copied()));
    }

    #[test]
    fn test_accumulator_empty_and_single() {
        let mut acc = MomentAccumulator::new();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.population_variance(), None);
        acc.update(3.0);
        assert_eq!(acc.mean(), Some(3.0));
        assert_eq!(acc.sample_variance(), None);
        assert_eq!(acc.population_variance(), Some(0.0));
    }

    #[test]
    fn test_accumulator_large_offset() {
        // Naive E[X²] − E[X]² loses every digit here.
        let mut acc = MomentAccumulator::new();
        for &x in &[1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0] {
            acc.update(x);
        }
        assert!((acc.sample_variance().unwrap() - 30.0).abs() < 1e-6);
    }
}
