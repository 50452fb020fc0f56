//! End-to-end checks of the published worked examples.
//!
//! ## Test Organization
//!
//! 1. **Numeric kernel** - E1 reference values, quadrature agreement
//! 2. **Reliability** - Redundant network, chain sizing, hazard limits
//! 3. **Moment propagation** - Ratio, |H|² over a Uniform, harmonic mean
//! 4. **Process statistics** - AR(1), filtering, products
//! 5. **Determinism** - Repeated calls return identical bits

use approx::{assert_abs_diff_eq, assert_relative_eq};

use u_probkit::config::{AnalysisConfig, ApproximationOrder};
use u_probkit::distributions::{Normal, Uniform};
use u_probkit::integrate::{definite_integral, QuadratureMethod};
use u_probkit::moments::{
    expected_squared_magnitude_over_uniform, harmonic_combination_moments,
    monte_carlo_moments, propagate_ratio_moments, Approximation,
};
use u_probkit::process::{
    ar_process_statistics, lti_output_statistics, product_of_independent_processes, ArProcess,
    LtiSystem, WssProcess,
};
use u_probkit::reliability::{
    mttf, mttf_from_reliability, min_nodes_for_target, parallel_reliability,
    reliability_from_hazard, series_reliability, Hazard, Probability, Topology,
};
use u_probkit::special::exponential_integral_e1;
use u_probkit::AnalysisError;

// ============================================================================
// Numeric Kernel
// ============================================================================

#[test]
fn test_e1_reference_values() {
    assert_relative_eq!(exponential_integral_e1(1.0).unwrap(), 0.219383934, max_relative = 1e-6);
    assert_relative_eq!(exponential_integral_e1(0.1).unwrap(), 1.82292395, max_relative = 1e-6);
    assert!(matches!(
        exponential_integral_e1(0.0),
        Err(AnalysisError::InvalidInput(_))
    ));
    assert!(exponential_integral_e1(-1.0).is_err());
}

#[test]
fn test_quadrature_methods_agree_on_gaussian_mass() {
    let cfg = AnalysisConfig::default();
    let n = Normal::new(0.0, 1.0).unwrap();
    for method in [QuadratureMethod::AdaptiveSimpson, QuadratureMethod::GaussLegendre] {
        let mass = definite_integral(|x| n.pdf(x), -1.0, 1.0, method, &cfg).unwrap();
        assert_abs_diff_eq!(mass, 0.682689492137086, epsilon = 1e-8);
    }
}

// ============================================================================
// Reliability
// ============================================================================

#[test]
fn test_redundant_network() {
    let p = Probability::new(0.9).unwrap();
    let mut net = Topology::new();
    let paths: Vec<_> = (0..3)
        .map(|i| {
            let a = net.add_component(format!("a{i}"), p);
            let b = net.add_component(format!("b{i}"), p);
            net.add_series(&[a, b]).unwrap()
        })
        .collect();
    let root = net.add_parallel(&paths).unwrap();
    assert_abs_diff_eq!(net.reliability(root).unwrap(), 0.993141, epsilon = 1e-6);
}

#[test]
fn test_basic_rules() {
    let p = Probability::new(0.7).unwrap();
    assert_abs_diff_eq!(series_reliability(&[p, p]), 0.49, epsilon = 1e-15);
    assert_abs_diff_eq!(parallel_reliability(&[p, p, p]), 1.0 - 0.027, epsilon = 1e-15);
}

#[test]
fn test_chain_sizing() {
    let n = min_nodes_for_target(0.9, 0.99).unwrap();
    assert!(0.9_f64.powf(n as f64) >= 0.99);
    assert!(0.9_f64.powf((n + 1) as f64) < 0.99);
    assert!(matches!(
        min_nodes_for_target(1.0, 0.5),
        Err(AnalysisError::InvalidInput(_))
    ));
}

#[test]
fn test_growth_hazard_limits() {
    let cfg = AnalysisConfig::default();
    let lambda0 = 0.02;
    let nearly_constant = Hazard::exponential_growth(lambda0, 1e-12).unwrap();
    for t in [1.0, 10.0, 50.0] {
        assert_abs_diff_eq!(
            reliability_from_hazard(&nearly_constant, t, &cfg).unwrap(),
            (-lambda0 * t).exp(),
            epsilon = 1e-9
        );
    }
    assert!(matches!(
        mttf(&Hazard::exponential_growth(lambda0, -0.1).unwrap(), &cfg),
        Err(AnalysisError::DivergentIntegral(_))
    ));
}

#[test]
fn test_growth_mttf_closed_form_against_quadrature() {
    let cfg = AnalysisConfig::default();
    let (lambda0, beta) = (0.05, 0.2);
    let h = Hazard::exponential_growth(lambda0, beta).unwrap();
    let closed = mttf(&h, &cfg).unwrap();
    let numeric = mttf_from_reliability(
        |t| reliability_from_hazard(&h, t, &cfg).unwrap_or(f64::NAN),
        &cfg,
    )
    .unwrap();
    assert_relative_eq!(closed, numeric, max_relative = 1e-6);
}

// ============================================================================
// Moment Propagation
// ============================================================================

#[test]
fn test_ratio_moments() {
    let r = Normal::new(50.0, 1.0).unwrap();
    let m = propagate_ratio_moments(5.0, &r, &AnalysisConfig::default()).unwrap();
    assert_relative_eq!(m.mean, 25.0 / 50.0 + 25.0 / 125_000.0, max_relative = 1e-14);
    assert_relative_eq!(
        m.variance,
        625.0 / 6_250_000.0 + 3.0 * 625.0 / 1.5625e10,
        max_relative = 1e-14
    );

    let mc = monte_carlo_moments(|x| 25.0 / x[0], &[r.into()], 100_000, 3).unwrap();
    assert_abs_diff_eq!(m.mean, mc.mean, epsilon = 5.0 * mc.standard_error());
}

#[test]
fn test_squared_magnitude_over_uniform_coefficient() {
    let cfg = AnalysisConfig::default();
    let a = Uniform::new(0.0, 0.5).unwrap();
    let gain_at = |omega: f64| {
        move |coef: f64| {
            ArProcess::new(coef, 1.0)
                .map(|ar| ar.gain_squared(omega))
                .unwrap_or(f64::NAN)
        }
    };
    let dc = expected_squared_magnitude_over_uniform(gain_at(0.0), &a, &cfg).unwrap();
    let nyquist =
        expected_squared_magnitude_over_uniform(gain_at(std::f64::consts::PI), &a, &cfg).unwrap();
    assert_abs_diff_eq!(dc.mean, 2.0, epsilon = 1e-8);
    assert_abs_diff_eq!(nyquist.mean, 2.0 / 3.0, epsilon = 1e-8);
    assert_eq!(dc.approximation, Approximation::Exact);
}

#[test]
fn test_harmonic_combination() {
    let c = Normal::new(8.0, 0.16).unwrap();
    let cfg = AnalysisConfig::default().with_approximation_order(ApproximationOrder::First);
    let m = harmonic_combination_moments(&c, &c, &cfg).unwrap();
    let approx = m.normal_approximation().unwrap();
    assert_relative_eq!(approx.mean(), 4.0, max_relative = 1e-14);
    assert_relative_eq!(approx.variance(), 0.02, max_relative = 1e-12);
}

// ============================================================================
// Process Statistics
// ============================================================================

#[test]
fn test_ar_worked_case() {
    let s = ar_process_statistics(0.8, 1.0).unwrap();
    assert_abs_diff_eq!(s.variance, 2.7778, epsilon = 1e-3);
    assert_abs_diff_eq!(s.autocovariance(1) / s.autocovariance(0), 0.8, epsilon = 1e-6);
    for a in [1.0, -1.2] {
        assert!(matches!(
            ar_process_statistics(a, 1.0),
            Err(AnalysisError::UnstableSystem(_))
        ));
    }
}

#[test]
fn test_filter_then_multiply() {
    let cfg = AnalysisConfig::default();
    let x = WssProcess::white_noise(1.0, 0.5).unwrap();
    let smoother = LtiSystem::fir(vec![0.25, 0.5, 0.25]).unwrap();
    let y = lti_output_statistics(&x, &smoother);
    assert_abs_diff_eq!(y.mean(), 1.0, epsilon = 1e-15);
    assert_abs_diff_eq!(y.variance(), 0.5 * 0.375, epsilon = 1e-15);

    let carrier = ar_process_statistics(0.5, 0.75).unwrap().process;
    let z = product_of_independent_processes(&y, &carrier);
    assert_abs_diff_eq!(z.mean(), 0.0, epsilon = 1e-15);
    for k in 0..4 {
        assert_relative_eq!(
            z.autocorrelation(k),
            y.autocorrelation(k) * carrier.autocorrelation(k),
            max_relative = 1e-12
        );
    }
    assert!(z.power_spectral_density(0.5, &cfg).unwrap() > 0.0);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_repeated_calls_are_bit_identical() {
    let cfg = AnalysisConfig::default();
    let h = Hazard::custom(|t| 0.1 + 0.01 * t);
    let a = reliability_from_hazard(&h, 7.5, &cfg).unwrap();
    let b = reliability_from_hazard(&h, 7.5, &cfg).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());

    let ar = ArProcess::new(0.4, 1.0).unwrap();
    assert_eq!(ar.simulate(32, 8, 9), ar.simulate(32, 8, 9));
}
