//! Expectation-Maximization over a fixed set of components.
//!
//! Responsibilities and likelihoods are computed in log-space:
//!
//! ```text
//! ln p(xⱼ)  = logsumexp_i ( ln πᵢ + ln N(xⱼ | μᵢ, Σᵢ) )
//! γᵢⱼ       = exp( ln πᵢ + ln N(xⱼ | μᵢ, Σᵢ) - ln p(xⱼ) )
//! ```
//!
//! so a far-away sample does not underflow every component to zero. A
//! sample whose log-sum is still not finite has no component able to
//! explain it, and the fit fails with [`Error::ZeroResponsibility`].
//!
//! Each iteration produces a new component list; nothing is updated in
//! place across the E and M steps.

use super::component::Component;
use crate::error::{Error, Result};
use crate::numeric;
use crate::special::chi_square_quantile;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// When the EM loop stops before `max_iter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    /// Always run `max_iter` iterations.
    FullBudget,
    /// Stop once an iteration improves the log-likelihood by `≤ tol`.
    Tolerance(f64),
}

/// EM loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmConfig {
    /// Maximum number of E/M iterations.
    pub max_iter: usize,
    /// Early-stopping rule.
    pub convergence: Convergence,
    /// Responsibility regularization strength; `0` disables it.
    pub gamma: f64,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            max_iter: 200,
            convergence: Convergence::FullBudget,
            gamma: 0.0,
        }
    }
}

impl EmConfig {
    /// Default settings: 200 iterations, no early stop, no regularization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Stop as soon as the log-likelihood gain drops to `tol` or below.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.convergence = Convergence::Tolerance(tol);
        self
    }

    /// Always run the full iteration budget.
    pub fn with_full_budget(mut self) -> Self {
        self.convergence = Convergence::FullBudget;
        self
    }

    /// Set the responsibility regularization strength.
    ///
    /// With `gamma > 0` each responsibility is replaced by
    /// `p · (1 + gamma · log₂ p)`, clamped at 0.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.gamma >= 0.0) || !self.gamma.is_finite() {
            return Err(Error::InvalidParameter {
                name: "gamma",
                message: "must be finite and >= 0",
            });
        }
        if let Convergence::Tolerance(tol) = self.convergence {
            if tol.is_nan() {
                return Err(Error::InvalidParameter {
                    name: "tol",
                    message: "must not be NaN",
                });
            }
        }
        Ok(())
    }
}

/// A fitted Gaussian mixture.
///
/// Holds the components together with the log-likelihood of the data they
/// were fitted on and the sample count, from which [`bic`](Self::bic) is
/// derived.
#[derive(Debug, Clone)]
pub struct GaussianMixture {
    components: Vec<Component>,
    log_likelihood: f64,
    n: usize,
    bic: f64,
}

impl GaussianMixture {
    /// Run EM from `components` on the rows of `data`.
    ///
    /// # Errors
    ///
    /// - Empty component list or data, or mismatched dimensions.
    /// - [`Error::ZeroResponsibility`] when no component can explain a sample.
    /// - [`Error::DegenerateComponent`] when a component loses all weight.
    /// - Covariance failures from re-estimating a component.
    pub fn fit(
        components: Vec<Component>,
        data: &ArrayView2<'_, f64>,
        config: &EmConfig,
    ) -> Result<Self> {
        config.validate()?;
        let d = check_components(&components)?;
        check_data(data, d)?;

        let mut current = components;
        let mut log_likelihood = total_log_likelihood(&current, data)?;

        for iter in 1..=config.max_iter {
            let responsibilities = expectation(&current, data, config.gamma)?;
            let next = maximization(&current, data, &responsibilities)?;
            let next_log_likelihood = total_log_likelihood(&next, data)?;
            let diff = next_log_likelihood - log_likelihood;

            current = next;
            log_likelihood = next_log_likelihood;

            if iter % 10 == 0 {
                log::debug!("EM iteration {iter}: log-likelihood {log_likelihood:.6}");
            }
            if let Convergence::Tolerance(tol) = config.convergence {
                if diff <= tol {
                    log::debug!("EM converged after {iter} iterations (gain {diff:.3e})");
                    break;
                }
            }
        }

        Self::with_stats(current, log_likelihood, data.nrows())
    }

    /// Score `components` on `data` without running EM.
    pub fn evaluate(components: Vec<Component>, data: &ArrayView2<'_, f64>) -> Result<Self> {
        let d = check_components(&components)?;
        check_data(data, d)?;
        let log_likelihood = total_log_likelihood(&components, data)?;
        Self::with_stats(components, log_likelihood, data.nrows())
    }

    /// Assemble a mixture from components and the statistics of a previous
    /// fit. The BIC is recomputed.
    pub fn with_stats(components: Vec<Component>, log_likelihood: f64, n: usize) -> Result<Self> {
        check_components(&components)?;
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let free = free_parameters(&components);
        let bic = log_likelihood - 0.5 * free as f64 * (n as f64).ln();
        Ok(Self {
            components,
            log_likelihood,
            n,
            bic,
        })
    }

    /// The components, in fitting order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Log-likelihood of the data the mixture was fitted on.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// `L - ½ · free_parameters · ln n`. Larger is better.
    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Number of samples the mixture was fitted on.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Dimensionality of the components.
    pub fn dim(&self) -> usize {
        self.components[0].distribution().dim()
    }

    /// Number of components `k`.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// `(k - 1)` mixing weights plus every component's own parameters.
    pub fn free_parameters(&self) -> usize {
        free_parameters(&self.components)
    }

    /// Responsibility of each component for `x`; sums to 1.
    pub fn posteriori(&self, x: &ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        let w = log_weights(&self.components, x)?;
        let norm = logsumexp(&w);
        if !norm.is_finite() {
            return Err(Error::ZeroDensity);
        }
        Ok(w.iter().map(|v| (v - norm).exp()).collect())
    }

    /// Mixture log-density `ln Σᵢ πᵢ N(x | μᵢ, Σᵢ)`.
    pub fn log_p(&self, x: &ArrayView1<'_, f64>) -> Result<f64> {
        Ok(logsumexp(&log_weights(&self.components, x)?))
    }

    /// Mixture density.
    pub fn p(&self, x: &ArrayView1<'_, f64>) -> Result<f64> {
        self.log_p(x).map(f64::exp)
    }

    /// Log-likelihood of `data` under this mixture, skipping samples with a
    /// non-finite log-density.
    pub fn log_likelihood_of(&self, data: &ArrayView2<'_, f64>) -> Result<f64> {
        check_data(data, self.dim())?;
        total_log_likelihood(&self.components, data)
    }

    /// Mixture mean `Σᵢ πᵢ μᵢ`.
    pub fn mean(&self) -> Array1<f64> {
        let mut m = Array1::zeros(self.dim());
        for c in &self.components {
            m.scaled_add(c.priori(), c.distribution().mean());
        }
        m
    }

    /// Mixture covariance: within-component plus between-component spread,
    /// `Σᵢ πᵢ (Σᵢ + (μᵢ - m)(μᵢ - m)ᵀ)`.
    pub fn cov(&self) -> Array2<f64> {
        let m = self.mean();
        let d = self.dim();
        let mut sigma = Array2::zeros((d, d));
        for c in &self.components {
            let dist = c.distribution();
            let diff = dist.mean() - &m;
            sigma.scaled_add(c.priori(), dist.cov());
            for i in 0..d {
                for j in 0..d {
                    sigma[[i, j]] += c.priori() * diff[i] * diff[j];
                }
            }
        }
        sigma
    }

    /// Index of the most responsible component and its unnormalized
    /// weighted density `πᵢ N(x | μᵢ, Σᵢ)`.
    pub fn max_post_prob(&self, x: &ArrayView1<'_, f64>) -> Result<(usize, f64)> {
        let w = Array1::from(log_weights(&self.components, x)?);
        let best = numeric::which_max(&w.view()).ok_or(Error::ZeroDensity)?;
        Ok((best, w[best].exp()))
    }

    /// Hard label: the most responsible component.
    pub fn predict(&self, x: &ArrayView1<'_, f64>) -> Result<usize> {
        self.max_post_prob(x).map(|(i, _)| i)
    }

    /// Whether `x` lies inside the `q` confidence ellipsoid of its most
    /// responsible component.
    ///
    /// Compares the squared Mahalanobis distance with the `q` quantile of a
    /// chi-square distribution with `dim` degrees of freedom.
    pub fn in_distribution(&self, x: &ArrayView1<'_, f64>, q: f64) -> Result<bool> {
        let threshold = chi_square_quantile(q, self.dim())?;
        let (best, _) = self.max_post_prob(x)?;
        let d2 = self.components[best].distribution().mahalanobis2(x)?;
        Ok(d2 <= threshold)
    }

    /// Whether `ln p(x) ≥ tau`.
    pub fn in_distribution_by_log_p(&self, x: &ArrayView1<'_, f64>, tau: f64) -> Result<bool> {
        Ok(self.log_p(x)? >= tau)
    }

    /// Draw one sample: pick a component by its weight, then sample it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let mut u: f64 = rng.random();
        let last = self.components.len() - 1;
        let chosen = self
            .components
            .iter()
            .enumerate()
            .find(|(i, c)| {
                let hit = *i == last || u < c.priori();
                u -= c.priori();
                hit
            })
            .map_or(&self.components[last], |(_, c)| c);
        chosen.distribution().random_sample(rng)
    }

    /// `n` samples as the rows of an `n x d` matrix.
    pub fn sample_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let mut out = Array2::zeros((n, self.dim()));
        for mut row in out.outer_iter_mut() {
            row.assign(&self.sample(rng));
        }
        out
    }
}

fn check_components(components: &[Component]) -> Result<usize> {
    let first = components.first().ok_or(Error::InvalidParameter {
        name: "components",
        message: "must not be empty",
    })?;
    let d = first.distribution().dim();
    for c in components {
        if c.distribution().dim() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: c.distribution().dim(),
            });
        }
    }
    Ok(d)
}

fn check_data(data: &ArrayView2<'_, f64>, d: usize) -> Result<()> {
    if data.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    if data.ncols() != d {
        return Err(Error::DimensionMismatch {
            expected: d,
            found: data.ncols(),
        });
    }
    Ok(())
}

fn free_parameters(components: &[Component]) -> usize {
    let own: usize = components.iter().map(|c| c.distribution().length()).sum();
    components.len() - 1 + own
}

fn log_weights(components: &[Component], x: &ArrayView1<'_, f64>) -> Result<Vec<f64>> {
    components
        .iter()
        .map(|c| c.weighted_log_density(x))
        .collect()
}

/// Log-sum-exp for numerical stability.
fn logsumexp(values: &[f64]) -> f64 {
    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() || max_val.is_nan() {
        return max_val;
    }
    max_val
        + values
            .iter()
            .map(|&v| (v - max_val).exp())
            .sum::<f64>()
            .ln()
}

/// E-step: an `n x k` matrix of responsibilities, row `j` for sample `j`.
fn expectation(
    components: &[Component],
    data: &ArrayView2<'_, f64>,
    gamma: f64,
) -> Result<Array2<f64>> {
    let n = data.nrows();
    let k = components.len();

    let responsibilities = |j: usize| -> Result<Vec<f64>> {
        let mut w = log_weights(components, &data.row(j))?;
        let norm = logsumexp(&w);
        if !norm.is_finite() {
            return Err(Error::ZeroResponsibility { sample: j });
        }
        for v in w.iter_mut() {
            let mut p = (*v - norm).exp();
            if gamma > 0.0 {
                p *= 1.0 + gamma * p.log2();
                if p.is_nan() || p < 0.0 {
                    p = 0.0;
                }
            }
            *v = p;
        }
        Ok(w)
    };

    #[cfg(feature = "parallel")]
    let rows = (0..n)
        .into_par_iter()
        .map(responsibilities)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let rows = (0..n).map(responsibilities).collect::<Result<Vec<_>>>()?;

    let mut out = Array2::zeros((n, k));
    for (mut dst, src) in out.outer_iter_mut().zip(rows) {
        dst.assign(&Array1::from(src));
    }
    Ok(out)
}

/// M-step: re-estimate every component and renormalize the weights.
fn maximization(
    components: &[Component],
    data: &ArrayView2<'_, f64>,
    responsibilities: &Array2<f64>,
) -> Result<Vec<Component>> {
    let mut weighted = Vec::with_capacity(components.len());
    for (i, c) in components.iter().enumerate() {
        let (alpha, dist) = c
            .distribution()
            .maximization(data, &responsibilities.column(i))
            .map_err(|e| match e {
                Error::DegenerateComponent { .. } => Error::DegenerateComponent { component: i },
                other => other,
            })?;
        weighted.push((alpha, dist));
    }

    let z: f64 = weighted.iter().map(|(alpha, _)| alpha).sum();
    weighted
        .into_iter()
        .map(|(alpha, dist)| Component::new(alpha / z, dist))
        .collect()
}

/// `Σⱼ ln p(xⱼ)`, skipping non-finite terms.
fn total_log_likelihood(components: &[Component], data: &ArrayView2<'_, f64>) -> Result<f64> {
    let term = |j: usize| -> Result<f64> { Ok(logsumexp(&log_weights(components, &data.row(j))?)) };

    #[cfg(feature = "parallel")]
    let terms = (0..data.nrows())
        .into_par_iter()
        .map(term)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let terms = (0..data.nrows()).map(term).collect::<Result<Vec<_>>>()?;

    Ok(terms.into_iter().filter(|v| v.is_finite()).sum())
}
