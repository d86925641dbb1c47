//! # gaussmix
//!
//! Gaussian mixture models fitted by Expectation-Maximization, with the
//! number of components chosen by BIC.
//!
//! - [`MultivariateGaussian`]: one Gaussian with a cached decomposition;
//!   density, Mahalanobis distance, CDF, sampling and the M-step update.
//! - [`GaussianMixture`]: the EM loop and posterior queries (responsibilities,
//!   density, membership tests).
//! - [`MixtureSelector`]: seeds and fits candidates for `k = 1, 2, …` and
//!   keeps the best by BIC.
//!
//! Linear algebra goes through the [`MatrixOps`] trait. The hand-rolled
//! [`NativeOps`] is the default; the `faer` feature switches to `faer`.
//! The `parallel` feature runs the E-step on rayon, and `serde` makes
//! [`MixtureParams`] serializable.
//!
//! Every randomized operation takes its RNG as an argument (or a seed in a
//! config), so results are reproducible.
//!
//! The library logs through the `log` facade and never installs a logger.

/// Error types used across `gaussmix`.
pub mod error;
pub mod gaussian;
pub mod linalg;
pub mod mixture;
pub mod numeric;
pub mod point;
pub mod special;

#[cfg(test)]
mod scenario_tests;

pub use error::{Error, Result};
pub use gaussian::{CovarianceKind, MultivariateGaussian};
pub use linalg::{DefaultOps, MatrixOps, NativeOps};
pub use mixture::{
    Clustering, Component, ComponentParams, Convergence, EmConfig, GaussianMixture,
    KmeansPlusPlus, MixtureParams, MixtureSelector, SoftClustering,
};
pub use point::Point;

#[cfg(feature = "faer")]
pub use linalg::FaerOps;
