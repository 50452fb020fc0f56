//! # u-probkit
//!
//! Deterministic probabilistic analysis primitives.
//!
//! Three engines share one numeric kernel:
//!
//! - **Reliability**: series/parallel networks, hazard-driven survival and
//!   mean time to failure.
//! - **Moment propagation**: mean and variance of ratios, harmonic
//!   combinations and arbitrary functions of independent inputs.
//! - **Process statistics**: mean, autocovariance and spectrum of WSS
//!   processes through FIR filters, products and AR(1) recursions.
//!
//! ## Modules
//!
//! - [`special`]: Exponential integral E1, Gaussian PDF/CDF, Gamma
//! - [`integrate`]: Adaptive Simpson and Gauss–Legendre quadrature, tail substitutions
//! - [`stats`]: Compensated summation and streaming moments
//! - [`distributions`]: Normal and Uniform inputs
//! - [`random`]: Seeded sampling
//! - [`reliability`]: Network reliability and hazard models
//! - [`moments`]: Moment propagation
//! - [`process`]: Random-process statistics
//! - [`config`] / [`error`]: Shared tolerances and the error taxonomy
//!
//! ## Design Philosophy
//!
//! - **Fail loudly**: out-of-domain inputs, divergent integrals and
//!   unstable recursions are errors, never clamped values
//! - **Explicit approximations**: every propagated result records its
//!   Taylor order and the smallness assumption that was checked
//! - **Reproducible**: pure functions over immutable values; Monte Carlo
//!   and simulation take explicit seeds
//! - **Property-based testing**: invariants verified via proptest

pub mod config;
pub mod distributions;
pub mod error;
pub mod integrate;
pub mod moments;
pub mod process;
pub mod random;
pub mod reliability;
pub mod special;
pub mod stats;

pub use config::{AnalysisConfig, ApproximationOrder};
pub use error::{AnalysisError, Result};
