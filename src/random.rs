//! Seeded sampling of the input distributions.
//!
//! Monte Carlo cross-checks and AR sample paths draw from here. For
//! reproducible runs, build the generator with [`create_rng`] and a fixed
//! seed; the stream is deterministic for a given seed on the same platform.

use rand::Rng;

use crate::distributions::{Normal, RandomVariable, Uniform};

/// Creates a fast, seeded random number generator (`SmallRng`).
///
/// # Examples
/// ```
/// use u_probkit::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!((0.0..1.0).contains(&x));
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// One standard normal draw (Box–Muller, cosine branch).
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 ∈ (0, 1] keeps ln(u1) finite.
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

pub fn sample_normal<R: Rng + ?Sized>(dist: &Normal, rng: &mut R) -> f64 {
    dist.mean() + dist.std_dev() * standard_normal(rng)
}

pub fn sample_uniform<R: Rng + ?Sized>(dist: &Uniform, rng: &mut R) -> f64 {
    dist.low() + rng.random::<f64>() * dist.width()
}

/// One draw from any supported input distribution.
///
/// # Examples
/// ```
/// use u_probkit::distributions::{RandomVariable, Uniform};
/// use u_probkit::random::{create_rng, sample};
/// let rv = RandomVariable::from(Uniform::new(0.0, 0.5).unwrap());
/// let mut rng = create_rng(7);
/// let x = sample(&rv, &mut rng);
/// assert!((0.0..=0.5).contains(&x));
/// ```
pub fn sample<R: Rng + ?Sized>(var: &RandomVariable, rng: &mut R) -> f64 {
    match var {
        RandomVariable::Normal(n) => sample_normal(n, rng),
        RandomVariable::Uniform(u) => sample_uniform(u, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MomentAccumulator;

    #[test]
    fn test_same_seed_same_stream() {
        let rv = RandomVariable::from(Normal::new(1.0, 2.0).unwrap());
        let mut a = create_rng(99);
        let mut b = create_rng(99);
        for _ in 0..100 {
            assert_eq!(sample(&rv, &mut a), sample(&rv, &mut b));
        }
    }

    #[test]
    fn test_normal_sample_moments() {
        let dist = Normal::new(3.0, 4.0).unwrap();
        let mut rng = create_rng(12345);
        let mut acc = MomentAccumulator::new();
        for _ in 0..200_000 {
            acc.update(sample_normal(&dist, &mut rng));
        }
        let mean = acc.mean().unwrap();
        let var = acc.sample_variance().unwrap();
        // standard errors: 2/√n ≈ 0.0045 for the mean, ≈ 0.013 for the variance
        assert!((mean - 3.0).abs() < 0.03, "mean {mean}");
        assert!((var - 4.0).abs() < 0.08, "variance {var}");
    }

    #[test]
    fn test_uniform_sample_support_and_mean() {
        let dist = Uniform::new(-2.0, 6.0).unwrap();
        let mut rng = create_rng(5);
        let mut acc = MomentAccumulator::new();
        for _ in 0..100_000 {
            let x = sample_uniform(&dist, &mut rng);
            assert!((-2.0..6.0).contains(&x));
            acc.update(x);
        }
        assert!((acc.mean().unwrap() - 2.0).abs() < 0.05);
    }
}
