//! Network reliability.
//!
//! Success probabilities of components combined through series/parallel
//! structure, and time-varying reliability derived from a hazard rate.
//!
//! # Composition rules
//!
//! | Structure | Reliability |
//! |---|---|
//! | series   | R = Π pᵢ |
//! | parallel | R = 1 − Π (1 − pᵢ) |
//!
//! Components are assumed to fail independently. A [`Topology`] therefore
//! only admits trees: every node has at most one parent.
//!
//! # Hazard model
//!
//! | Hazard | λ(t) | R(t) | MTTF |
//! |---|---|---|---|
//! | constant | λ | e^{−λt} | 1/λ |
//! | exponential growth | λ₀e^{βt} | exp(−(λ₀/β)(e^{βt}−1)) | (1/β)e^{λ₀/β}E1(λ₀/β) |
//! | Weibull | (k/η)(t/η)^{k−1} | exp(−(t/η)^k) | ηΓ(1+1/k) |
//! | custom | any λ(t) ≥ 0 | numeric | numeric |

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::config::AnalysisConfig;
use crate::error::{ensure_finite, AnalysisError, Result};
use crate::integrate::{definite_integral, improper_integral, QuadratureMethod, TailSubstitution};
use crate::special;

/// Doublings of the survival horizon tried for a custom hazard's MTTF.
const MAX_HORIZON_DOUBLINGS: usize = 64;
/// Inner cumulative-hazard quadratures run this much tighter than the
/// outer integral they feed.
const INNER_TOLERANCE_FACTOR: f64 = 1e-3;

// ============================================================================
// Probability
// ============================================================================

/// A success probability in `[0, 1]`.
///
/// Values outside the interval are rejected, never clamped.
///
/// # Examples
/// ```
/// use u_probkit::reliability::Probability;
/// assert_eq!(Probability::new(0.9).unwrap().complement(), 1.0 - 0.9);
/// assert!(Probability::new(1.2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Probability(f64);

impl Probability {
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(AnalysisError::invalid(format!(
                "probability must lie in [0, 1], got {p}"
            )));
        }
        Ok(Self(p))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn complement(self) -> f64 {
        1.0 - self.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = AnalysisError;

    fn try_from(p: f64) -> Result<Self> {
        Probability::new(p)
    }
}

/// Reliability of components in series: `Π pᵢ`.
///
/// An empty chain has reliability 1; any zero forces 0.
///
/// # Examples
/// ```
/// use u_probkit::reliability::{series_reliability, Probability};
/// let p = Probability::new(0.9).unwrap();
/// assert!((series_reliability(&[p, p]) - 0.81).abs() < 1e-15);
/// ```
pub fn series_reliability(nodes: &[Probability]) -> f64 {
    nodes.iter().map(|p| p.value()).product()
}

/// Reliability of redundant components in parallel: `1 − Π (1 − pᵢ)`.
///
/// An empty group has reliability 0.
pub fn parallel_reliability(nodes: &[Probability]) -> f64 {
    1.0 - nodes.iter().map(|p| p.complement()).product::<f64>()
}

// ============================================================================
// Series-chain sizing
// ============================================================================

fn check_chain_inputs(p: f64, alpha: f64) -> Result<()> {
    if !(p > 0.0 && p < 1.0) {
        return Err(AnalysisError::invalid(format!(
            "node reliability must lie in (0, 1), got {p}"
        )));
    }
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(AnalysisError::invalid(format!(
            "target reliability must lie in (0, 1], got {alpha}"
        )));
    }
    Ok(())
}

/// Largest `n` such that a series chain of `n` nodes of reliability `p`
/// still meets the target: `pⁿ ≥ α`, i.e. `⌊ln α / ln p⌋`.
///
/// The floor is corrected against direct exponentiation, so rounding in
/// the logarithms never moves the answer across the boundary.
///
/// # Errors
/// Returns `Err` if `p ∉ (0, 1)` or `α ∉ (0, 1]`.
///
/// # Examples
/// ```
/// use u_probkit::reliability::min_nodes_for_target;
/// assert_eq!(min_nodes_for_target(0.99, 0.9).unwrap(), 10);
/// assert_eq!(min_nodes_for_target(0.5, 0.25).unwrap(), 2);
/// ```
pub fn min_nodes_for_target(p: f64, alpha: f64) -> Result<u64> {
    check_chain_inputs(p, alpha)?;
    let mut n = (alpha.ln() / p.ln()).floor() as u64;
    while p.powf((n + 1) as f64) >= alpha {
        n += 1;
    }
    while n > 0 && p.powf(n as f64) < alpha {
        n -= 1;
    }
    debug!("series chain: p={p}, target={alpha} -> at most {n} nodes");
    Ok(n)
}

/// Approximate chain length `−ln α / (1 − p)`.
///
/// Uses `ln p ≈ −(1 − p)`, accurate as `p → 1`. This is an approximation,
/// not an exact bound; use [`min_nodes_for_target`] for the exact count.
///
/// # Errors
/// Returns `Err` if `p ∉ (0, 1)` or `α ∉ (0, 1]`.
pub fn asymptotic_series_bound(p: f64, alpha: f64) -> Result<f64> {
    check_chain_inputs(p, alpha)?;
    Ok(-alpha.ln() / (1.0 - p))
}

// ============================================================================
// Hazard rates
// ============================================================================

/// An arbitrary non-negative hazard function, integrated numerically.
#[derive(Clone)]
pub struct CustomHazard(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl CustomHazard {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn rate(&self, t: f64) -> f64 {
        (self.0)(t)
    }
}

impl fmt::Debug for CustomHazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomHazard(..)")
    }
}

/// Instantaneous failure rate λ(t), conditional on survival to `t`.
#[derive(Debug, Clone)]
pub enum Hazard {
    Constant { rate: f64 },
    /// λ(t) = initial · e^{growth·t}.
    ExponentialGrowth { initial: f64, growth: f64 },
    /// λ(t) = (shape/scale)·(t/scale)^{shape−1}.
    Weibull { shape: f64, scale: f64 },
    Custom(CustomHazard),
}

impl Hazard {
    pub fn constant(rate: f64) -> Result<Self> {
        let h = Hazard::Constant { rate };
        h.validate()?;
        Ok(h)
    }

    pub fn exponential_growth(initial: f64, growth: f64) -> Result<Self> {
        let h = Hazard::ExponentialGrowth { initial, growth };
        h.validate()?;
        Ok(h)
    }

    pub fn weibull(shape: f64, scale: f64) -> Result<Self> {
        let h = Hazard::Weibull { shape, scale };
        h.validate()?;
        Ok(h)
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Hazard::Custom(CustomHazard::new(f))
    }

    /// Checks parameter domains. Called by every operation, so hand-built
    /// variants are caught too.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Hazard::Constant { rate } => {
                ensure_finite(rate, "hazard rate")?;
                if rate < 0.0 {
                    return Err(AnalysisError::invalid(format!(
                        "hazard rate must be ≥ 0, got {rate}"
                    )));
                }
            }
            Hazard::ExponentialGrowth { initial, growth } => {
                ensure_finite(initial, "initial hazard")?;
                ensure_finite(growth, "hazard growth")?;
                if initial < 0.0 {
                    return Err(AnalysisError::invalid(format!(
                        "initial hazard must be ≥ 0, got {initial}"
                    )));
                }
            }
            Hazard::Weibull { shape, scale } => {
                if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0) {
                    return Err(AnalysisError::invalid(format!(
                        "Weibull needs shape > 0 and scale > 0, got shape={shape}, scale={scale}"
                    )));
                }
            }
            Hazard::Custom(_) => {}
        }
        Ok(())
    }

    /// λ(t).
    pub fn rate(&self, t: f64) -> f64 {
        match self {
            Hazard::Constant { rate } => *rate,
            Hazard::ExponentialGrowth { initial, growth } => initial * (growth * t).exp(),
            Hazard::Weibull { shape, scale } => {
                shape / scale * (t / scale).powf(shape - 1.0)
            }
            Hazard::Custom(c) => c.rate(t),
        }
    }

    /// Cumulative hazard `H(t) = ∫₀^t λ(u) du`.
    ///
    /// # Errors
    /// Returns `Err` for `t < 0`, invalid parameters, a custom hazard that
    /// integrates to a negative value, or a quadrature failure.
    pub fn cumulative(&self, t: f64, config: &AnalysisConfig) -> Result<f64> {
        self.validate()?;
        ensure_finite(t, "time")?;
        if t < 0.0 {
            return Err(AnalysisError::invalid(format!("time must be ≥ 0, got {t}")));
        }
        if t == 0.0 {
            return Ok(0.0);
        }
        let h = match self {
            Hazard::Constant { rate } => rate * t,
            Hazard::ExponentialGrowth { initial, growth } => {
                if *growth == 0.0 {
                    initial * t
                } else {
                    // expm1 keeps the β → 0 limit λ₀t exact.
                    initial / growth * (growth * t).exp_m1()
                }
            }
            Hazard::Weibull { shape, scale } => (t / scale).powf(*shape),
            Hazard::Custom(c) => {
                let h = definite_integral(
                    |u| c.rate(u),
                    0.0,
                    t,
                    QuadratureMethod::AdaptiveSimpson,
                    config,
                )?;
                if h < 0.0 {
                    return Err(AnalysisError::invalid(format!(
                        "custom hazard integrates to {h} on [0, {t}]; hazards must be non-negative"
                    )));
                }
                h
            }
        };
        Ok(h)
    }
}

/// Survival probability `R(t) = exp(−∫₀^t λ(u) du)`.
///
/// Closed forms are used for the named hazards; a custom hazard is
/// integrated with the numeric kernel.
///
/// # Examples
/// ```
/// use u_probkit::config::AnalysisConfig;
/// use u_probkit::reliability::{reliability_from_hazard, Hazard};
/// let cfg = AnalysisConfig::default();
/// let h = Hazard::exponential_growth(0.01, 0.1).unwrap();
/// let r = reliability_from_hazard(&h, 10.0, &cfg).unwrap();
/// let expected = (-(0.01 / 0.1) * (1.0_f64.exp() - 1.0)).exp();
/// assert!((r - expected).abs() < 1e-12);
/// ```
pub fn reliability_from_hazard(hazard: &Hazard, t: f64, config: &AnalysisConfig) -> Result<f64> {
    let r = (-hazard.cumulative(t, config)?).exp();
    debug!("R({t}) = {r} for {hazard:?}");
    Ok(r)
}

/// Probability of surviving a further `dt` given survival to `t`:
/// `R(t + dt) / R(t) = exp(−∫_t^{t+dt} λ(u) du)`.
pub fn conditional_reliability(
    hazard: &Hazard,
    t: f64,
    dt: f64,
    config: &AnalysisConfig,
) -> Result<f64> {
    ensure_finite(dt, "duration")?;
    if dt < 0.0 {
        return Err(AnalysisError::invalid(format!("duration must be ≥ 0, got {dt}")));
    }
    let start = hazard.cumulative(t, config)?;
    let window = hazard.cumulative(t + dt, config)? - start;
    // Only quadrature round-off may push the window below zero.
    if window < -config.tolerance() * start.abs().max(1.0) {
        return Err(AnalysisError::invalid(format!(
            "hazard integrates to {window} < 0 over [{t}, {}]",
            t + dt
        )));
    }
    Ok((-window.max(0.0)).exp())
}

/// Mean time to failure `∫₀^∞ R(t) dt` for a hazard model.
///
/// # Errors
/// - [`AnalysisError::DivergentIntegral`] when survival does not decay to
///   zero: a zero hazard, or an exponentially *decaying* hazard
///   (`growth < 0`), whose cumulative hazard stays below `λ₀/|β|`.
/// - [`AnalysisError::InvalidInput`] when a custom hazard integrates to a
///   negative cumulative hazard.
/// - [`AnalysisError::Convergence`] when a custom hazard's survival cannot
///   be driven below tolerance, or its quadrature fails.
///
/// # Examples
/// ```
/// use u_probkit::config::AnalysisConfig;
/// use u_probkit::reliability::{mttf, Hazard};
/// let cfg = AnalysisConfig::default();
/// assert!((mttf(&Hazard::constant(0.5).unwrap(), &cfg).unwrap() - 2.0).abs() < 1e-15);
/// assert!(mttf(&Hazard::exponential_growth(0.01, -0.1).unwrap(), &cfg).is_err());
/// ```
pub fn mttf(hazard: &Hazard, config: &AnalysisConfig) -> Result<f64> {
    hazard.validate()?;
    let value = match *hazard {
        Hazard::Constant { rate } => {
            if rate == 0.0 {
                return Err(AnalysisError::DivergentIntegral(
                    "zero hazard never fails".into(),
                ));
            }
            1.0 / rate
        }
        Hazard::ExponentialGrowth { initial, growth } => {
            if initial == 0.0 {
                return Err(AnalysisError::DivergentIntegral(
                    "zero hazard never fails".into(),
                ));
            }
            if growth < 0.0 {
                return Err(AnalysisError::DivergentIntegral(format!(
                    "decaying hazard: R(∞) = exp(−{}) > 0",
                    initial / -growth
                )));
            }
            let x = initial / growth;
            if growth == 0.0 || !x.is_finite() {
                // β too small to resolve: the constant-hazard limit.
                1.0 / initial
            } else {
                // (1/β)·e^{x}·E1(x), x = λ₀/β, evaluated without overflow.
                special::scaled_exponential_integral_e1(x)? / growth
            }
        }
        Hazard::Weibull { shape, scale } => scale * special::gamma(1.0 + 1.0 / shape),
        Hazard::Custom(ref c) => custom_mttf(c, config)?,
    };
    debug!("MTTF = {value} for {hazard:?}");
    Ok(value)
}

/// Mean time to failure from a survival function: `∫₀^∞ R(t) dt`.
///
/// Integrated over a rational tail substitution, which assumes
/// `t²·R(t) → 0` (any lifetime with finite variance).
///
/// # Errors
/// Returns `Err` if `R(0) ∉ [0, 1]` or the quadrature fails.
///
/// # Examples
/// ```
/// use u_probkit::config::AnalysisConfig;
/// use u_probkit::reliability::mttf_from_reliability;
/// let cfg = AnalysisConfig::default();
/// let m = mttf_from_reliability(|t| (-0.25 * t).exp(), &cfg).unwrap();
/// assert!((m - 4.0).abs() < 1e-7);
/// ```
pub fn mttf_from_reliability<F>(reliability: F, config: &AnalysisConfig) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    let r0 = reliability(0.0);
    if !(0.0..=1.0).contains(&r0) {
        return Err(AnalysisError::invalid(format!(
            "survival function must start in [0, 1], got R(0)={r0}"
        )));
    }
    improper_integral(
        reliability,
        0.0,
        TailSubstitution::Rational,
        QuadratureMethod::AdaptiveSimpson,
        config,
    )
}

/// MTTF of a custom hazard: find a horizon where survival has fallen
/// below tolerance, then integrate `exp(−H(t))` up to it.
fn custom_mttf(hazard: &CustomHazard, config: &AnalysisConfig) -> Result<f64> {
    let inner = config
        .clone()
        .with_tolerance(config.tolerance() * INNER_TOLERANCE_FACTOR)?;
    let cutoff = -(config.tolerance() * INNER_TOLERANCE_FACTOR).ln();
    let integrate_rate = |a: f64, b: f64| {
        definite_integral(|u| hazard.rate(u), a, b, QuadratureMethod::AdaptiveSimpson, &inner)
    };

    let mut horizon = 1.0;
    let mut cumulative = integrate_rate(0.0, horizon)?;
    let mut doublings = 0;
    while cumulative < cutoff {
        if cumulative < 0.0 {
            return Err(AnalysisError::invalid(format!(
                "custom hazard integrates to H({horizon})={cumulative} < 0"
            )));
        }
        if doublings == MAX_HORIZON_DOUBLINGS {
            return Err(AnalysisError::Convergence {
                iterations: doublings,
                achieved: (-cumulative).exp(),
                requested: config.tolerance(),
            });
        }
        cumulative += integrate_rate(horizon, 2.0 * horizon)?;
        horizon *= 2.0;
        doublings += 1;
    }
    debug!("custom hazard: survival below cutoff by t={horizon} (H={cumulative})");

    // Errors from the inner quadrature cannot cross the f64 closure
    // boundary; park the first one and surface it afterwards.
    let failure: RefCell<Option<AnalysisError>> = RefCell::new(None);
    let survival = |t: f64| match integrate_rate(0.0, t) {
        Ok(h) => (-h).exp(),
        Err(e) => {
            failure.borrow_mut().get_or_insert(e);
            f64::NAN
        }
    };
    let outcome = definite_integral(survival, 0.0, horizon, QuadratureMethod::AdaptiveSimpson, config);
    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    outcome
}

// ============================================================================
// Topology
// ============================================================================

/// Index of a node inside a [`Topology`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a leaf component knows about its own reliability.
#[derive(Debug, Clone)]
pub enum ComponentReliability {
    Fixed(Probability),
    /// Time-varying; only evaluable at a mission time.
    Hazard(Hazard),
}

impl From<Probability> for ComponentReliability {
    fn from(p: Probability) -> Self {
        ComponentReliability::Fixed(p)
    }
}

impl From<Hazard> for ComponentReliability {
    fn from(h: Hazard) -> Self {
        ComponentReliability::Hazard(h)
    }
}

#[derive(Debug, Clone)]
pub enum TopologyNode {
    Component {
        label: String,
        reliability: ComponentReliability,
    },
    Series(Vec<NodeId>),
    Parallel(Vec<NodeId>),
}

/// Series/parallel composition tree stored as an arena.
///
/// Composites may only reference nodes that already exist and that have
/// no parent yet, so the arena is acyclic and every node feeds at most one
/// composite.
///
/// # Examples
/// ```
/// use u_probkit::reliability::{Probability, Topology};
/// // Three redundant paths, each two nodes in series.
/// let p = Probability::new(0.9).unwrap();
/// let mut net = Topology::new();
/// let mut paths = Vec::new();
/// for i in 0..3 {
///     let a = net.add_component(format!("a{i}"), p);
///     let b = net.add_component(format!("b{i}"), p);
///     paths.push(net.add_series(&[a, b]).unwrap());
/// }
/// let root = net.add_parallel(&paths).unwrap();
/// assert!((net.reliability(root).unwrap() - 0.993141).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<TopologyNode>,
    has_parent: Vec<bool>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&TopologyNode> {
        self.nodes.get(id.0)
    }

    pub fn add_component(
        &mut self,
        label: impl Into<String>,
        reliability: impl Into<ComponentReliability>,
    ) -> NodeId {
        self.push(TopologyNode::Component {
            label: label.into(),
            reliability: reliability.into(),
        })
    }

    pub fn add_series(&mut self, children: &[NodeId]) -> Result<NodeId> {
        self.adopt(children)?;
        Ok(self.push(TopologyNode::Series(children.to_vec())))
    }

    pub fn add_parallel(&mut self, children: &[NodeId]) -> Result<NodeId> {
        self.adopt(children)?;
        Ok(self.push(TopologyNode::Parallel(children.to_vec())))
    }

    /// Reliability of the tree under `root` when every component has a
    /// fixed probability.
    ///
    /// # Errors
    /// Returns `Err` for an unknown root or a hazard-driven component
    /// (use [`Topology::reliability_at`]).
    pub fn reliability(&self, root: NodeId) -> Result<f64> {
        self.evaluate(root, |label, component| match component {
            ComponentReliability::Fixed(p) => Ok(p.value()),
            ComponentReliability::Hazard(_) => Err(AnalysisError::invalid(format!(
                "component '{label}' is time-varying; evaluate at a mission time"
            ))),
        })
    }

    /// Reliability of the tree under `root` at mission time `t`, evaluating
    /// each hazard-driven component through [`reliability_from_hazard`].
    pub fn reliability_at(&self, root: NodeId, t: f64, config: &AnalysisConfig) -> Result<f64> {
        self.evaluate(root, |_, component| match component {
            ComponentReliability::Fixed(p) => Ok(p.value()),
            ComponentReliability::Hazard(h) => reliability_from_hazard(h, t, config),
        })
    }

    fn push(&mut self, node: TopologyNode) -> NodeId {
        self.nodes.push(node);
        self.has_parent.push(false);
        NodeId(self.nodes.len() - 1)
    }

    fn adopt(&mut self, children: &[NodeId]) -> Result<()> {
        if children.is_empty() {
            return Err(AnalysisError::invalid("composite needs at least one child"));
        }
        for (i, child) in children.iter().enumerate() {
            if child.0 >= self.nodes.len() {
                return Err(AnalysisError::invalid(format!("unknown node {}", child.0)));
            }
            if self.has_parent[child.0] || children[..i].contains(child) {
                return Err(AnalysisError::invalid(format!(
                    "node {} already belongs to a composite",
                    child.0
                )));
            }
        }
        for child in children {
            self.has_parent[child.0] = true;
        }
        Ok(())
    }

    /// Bottom-up pass over the subtree of `root`. Children always have
    /// smaller indices than their parent, so one ascending sweep suffices.
    fn evaluate<F>(&self, root: NodeId, mut leaf: F) -> Result<f64>
    where
        F: FnMut(&str, &ComponentReliability) -> Result<f64>,
    {
        if root.0 >= self.nodes.len() {
            return Err(AnalysisError::invalid(format!("unknown node {}", root.0)));
        }

        let mut reachable = vec![false; root.0 + 1];
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            reachable[id.0] = true;
            if let TopologyNode::Series(children) | TopologyNode::Parallel(children) =
                &self.nodes[id.0]
            {
                pending.extend(children.iter().copied());
            }
        }

        let mut values = vec![f64::NAN; root.0 + 1];
        for index in (0..=root.0).filter(|&i| reachable[i]) {
            values[index] = match &self.nodes[index] {
                TopologyNode::Component { label, reliability } => leaf(label, reliability)?,
                TopologyNode::Series(children) => {
                    children.iter().map(|c| values[c.0]).product()
                }
                TopologyNode::Parallel(children) => {
                    1.0 - children.iter().map(|c| 1.0 - values[c.0]).product::<f64>()
                }
            };
        }
        debug!("topology reliability at node {} = {}", root.0, values[root.0]);
        Ok(values[root.0])
    }
}
