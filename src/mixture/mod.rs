//! Gaussian mixture models.
//!
//! A mixture describes data as drawn from one of `k` Gaussians, picked with
//! probability `πᵢ`:
//!
//! ```text
//! p(x) = Σᵢ πᵢ × N(x | μᵢ, Σᵢ)
//! ```
//!
//! ## Pieces
//!
//! | Type | Role |
//! |------|------|
//! | [`Component`] | one `(πᵢ, N(μᵢ, Σᵢ))` pair |
//! | [`GaussianMixture`] | a fitted mixture: EM loop, BIC, posterior queries |
//! | [`EmConfig`] | iteration budget, early stopping, regularization |
//! | [`KmeansPlusPlus`] | deterministic relaxation seeding of starting means |
//! | [`MixtureSelector`] | picks `k` by BIC and drives seeding + EM |
//! | [`MixtureParams`] | plain-data snapshot for storage |
//!
//! ## The EM Algorithm
//!
//! **E-step**: responsibility of component `i` for sample `j`:
//! ```text
//! γᵢⱼ = πᵢ N(xⱼ | μᵢ, Σᵢ) / Σₗ πₗ N(xⱼ | μₗ, Σₗ)
//! ```
//!
//! **M-step**: each component is re-estimated from its responsibilities
//! (weighted mean, then weighted per-axis variance or full covariance), and
//! `πᵢ ∝ Σⱼ γᵢⱼ`, renormalized to sum to 1.
//!
//! By default the loop runs its whole budget of 200 iterations. Use
//! [`EmConfig::with_tolerance`] to stop once the log-likelihood stops
//! improving.
//!
//! ## Choosing k
//!
//! ```text
//! BIC = L - ½ · (k - 1 + Σᵢ free(Σᵢ, μᵢ)) · ln n
//! ```
//!
//! [`MixtureSelector::fit`] tries `k = 1, 2, …` up to `n / 20` and stops at
//! the first `k` whose BIC does not beat the previous one. The search is
//! greedy: a later, better `k` past a dip is never seen.
//!
//! ## Failure Modes
//!
//! - **Local optima**: EM converges to a local maximum; seeding matters
//! - **Collapsing components**: a component that loses every sample fails
//!   the fit with [`Error::DegenerateComponent`](crate::Error::DegenerateComponent)
//! - **Unexplained samples**: a sample no component can reach fails with
//!   [`Error::ZeroResponsibility`](crate::Error::ZeroResponsibility)
//!
//! ## Usage
//!
//! ```rust
//! use gaussmix::{EmConfig, MixtureSelector};
//! use ndarray::Array2;
//!
//! // Two groups along a line.
//! let data = Array2::from_shape_fn((40, 1), |(i, _)| {
//!     let jitter = (i % 5) as f64 * 0.1;
//!     if i < 20 { -3.0 + jitter } else { 3.0 + jitter }
//! });
//!
//! let mixture = MixtureSelector::new()
//!     .with_seed(42)
//!     .with_em(EmConfig::new().with_max_iter(50))
//!     .fit_k(2, &data.view())
//!     .unwrap();
//!
//! let sum: f64 = mixture.components().iter().map(|c| c.priori()).sum();
//! assert!((sum - 1.0).abs() < 1e-9);
//! ```

mod component;
mod em;
mod params;
mod seeding;
mod selection;
mod traits;

pub use component::Component;
pub use em::{Convergence, EmConfig, GaussianMixture};
pub use params::{ComponentParams, MixtureParams};
pub use seeding::KmeansPlusPlus;
pub use selection::MixtureSelector;
pub use traits::{Clustering, SoftClustering};
