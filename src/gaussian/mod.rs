//! Multivariate Gaussian distribution.
//!
//! ```text
//! N(x | μ, Σ) = (2π)^{-d/2} |Σ|^{-1/2} exp(-½ (x-μ)ᵀ Σ⁻¹ (x-μ))
//! ```
//!
//! A [`MultivariateGaussian`] validates its covariance once, at
//! construction, and caches everything density evaluation needs: `Σ⁻¹`,
//! `det(Σ)`, the lower Cholesky factor `L` and the normalizing constant
//! `(d·ln(2π) + ln det(Σ)) / 2`. A value that exists is therefore always
//! usable: there is no way to hold a Gaussian with a covariance that is
//! not positive-definite.
//!
//! # Covariance forms
//!
//! | Form | Constructor | Free parameters ([`MultivariateGaussian::length`]) |
//! |------|-------------|------------------|
//! | one variance for all axes | [`MultivariateGaussian::spherical`] | `d` |
//! | per-axis variances | [`MultivariateGaussian::diagonal`] | `2d` |
//! | full matrix | [`MultivariateGaussian::full`] | `d + d(d+1)/2` |
//!
//! # Randomized operations
//!
//! [`MultivariateGaussian::cdf`] (Genz's separation-of-variables estimator)
//! and the samplers take the RNG as an argument so callers control seeding.

mod cdf;
mod sampling;

use crate::error::{Error, Result};
use crate::linalg::{DefaultOps, MatrixOps};
use crate::numeric;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::f64::consts::PI;

/// Multiplier applied to the diagonal of every full covariance re-estimated
/// by [`MultivariateGaussian::maximization`], so it stays invertible.
pub const COVARIANCE_NUDGE: f64 = 1.00001;

/// Relative tolerance for the symmetry check on full covariances.
const SYMMETRY_TOL: f64 = 1e-9;

/// Shape of a Gaussian's covariance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CovarianceKind {
    /// `σ² I`.
    Spherical,
    /// `diag(σ₁², …, σ_d²)`.
    Diagonal,
    /// Arbitrary symmetric positive-definite matrix.
    Full,
}

/// A multivariate Gaussian with cached decomposition.
#[derive(Debug, Clone)]
pub struct MultivariateGaussian {
    mu: Array1<f64>,
    sigma: Array2<f64>,
    kind: CovarianceKind,
    sigma_inv: Array2<f64>,
    sigma_det: f64,
    sigma_l: Array2<f64>,
    pdf_constant: f64,
}

impl MultivariateGaussian {
    /// Gaussian with covariance `variance · I`.
    pub fn spherical(mean: Array1<f64>, variance: f64) -> Result<Self> {
        check_mean(&mean)?;
        if !(variance > 0.0) || !variance.is_finite() {
            return Err(Error::InvalidParameter {
                name: "variance",
                message: "must be finite and > 0",
            });
        }

        let d = mean.len();
        let sigma = Array2::<f64>::eye(d) * variance;
        Self::build(&DefaultOps::default(), mean, sigma, CovarianceKind::Spherical)
    }

    /// Gaussian with per-axis variances.
    pub fn diagonal(mean: Array1<f64>, variances: Array1<f64>) -> Result<Self> {
        check_mean(&mean)?;
        if variances.len() != mean.len() {
            return Err(Error::DimensionMismatch {
                expected: mean.len(),
                found: variances.len(),
            });
        }
        if variances.iter().any(|v| !(*v > 0.0) || !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "variances",
                message: "every variance must be finite and > 0",
            });
        }

        let sigma = Array2::from_diag(&variances);
        Self::build(&DefaultOps::default(), mean, sigma, CovarianceKind::Diagonal)
    }

    /// Gaussian with a full covariance matrix.
    pub fn full(mean: Array1<f64>, covariance: Array2<f64>) -> Result<Self> {
        Self::full_with(&DefaultOps::default(), mean, covariance)
    }

    /// Like [`full`](Self::full), with an explicit linear-algebra backend.
    pub fn full_with<O: MatrixOps + ?Sized>(
        ops: &O,
        mean: Array1<f64>,
        covariance: Array2<f64>,
    ) -> Result<Self> {
        check_mean(&mean)?;
        let (r, c) = covariance.dim();
        if r != c {
            return Err(Error::ShapeMismatch {
                expected: "square covariance".to_string(),
                actual: format!("{r}x{c}"),
            });
        }
        if r != mean.len() {
            return Err(Error::DimensionMismatch {
                expected: mean.len(),
                found: r,
            });
        }

        for i in 0..r {
            for j in 0..i {
                let (a, b) = (covariance[[i, j]], covariance[[j, i]]);
                if (a - b).abs() > SYMMETRY_TOL * a.abs().max(b.abs()) {
                    return Err(Error::InvalidParameter {
                        name: "covariance",
                        message: "must be symmetric",
                    });
                }
            }
        }

        Self::build(ops, mean, covariance, CovarianceKind::Full)
    }

    fn build<O: MatrixOps + ?Sized>(
        ops: &O,
        mu: Array1<f64>,
        sigma: Array2<f64>,
        kind: CovarianceKind,
    ) -> Result<Self> {
        let sigma_l = ops.cholesky(sigma.view())?;
        let sigma_inv = ops.inverse(sigma.view())?;
        let sigma_det = ops.determinant(sigma.view())?;

        // ln det(Σ) = 2 Σ ln L_ii
        let log_det: f64 = 2.0 * sigma_l.diag().iter().map(|v| v.ln()).sum::<f64>();
        let d = mu.len() as f64;
        let pdf_constant = (d * (2.0 * PI).ln() + log_det) / 2.0;

        Ok(Self {
            mu,
            sigma,
            kind,
            sigma_inv,
            sigma_det,
            sigma_l,
            pdf_constant,
        })
    }

    /// Maximum-likelihood-style estimate from an `n x d` sample matrix.
    ///
    /// The mean is the column mean; variances/covariances use the unbiased
    /// `n - 1` denominator.
    pub fn fit(data: &ArrayView2<'_, f64>, diagonal: bool) -> Result<Self> {
        let mu = numeric::col_means(data)?;
        if diagonal {
            let variances = data
                .columns()
                .into_iter()
                .map(|c| numeric::var(&c))
                .collect::<Result<Vec<f64>>>()?;
            Self::diagonal(mu, Array1::from(variances))
        } else {
            let sigma = numeric::cov_with_mean(data, &mu.view())?;
            Self::full(mu, sigma)
        }
    }

    /// Dimensionality `d`.
    pub fn dim(&self) -> usize {
        self.mu.len()
    }

    /// Mean vector `μ`.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mu
    }

    /// Covariance matrix `Σ`.
    pub fn cov(&self) -> &Array2<f64> {
        &self.sigma
    }

    /// Covariance form.
    pub fn kind(&self) -> CovarianceKind {
        self.kind
    }

    /// Whether `Σ` is diagonal (spherical or per-axis).
    pub fn is_diagonal(&self) -> bool {
        self.kind != CovarianceKind::Full
    }

    /// `det(Σ)`.
    pub fn det(&self) -> f64 {
        self.sigma_det
    }

    /// `Σ⁻¹`.
    pub fn inverse(&self) -> &Array2<f64> {
        &self.sigma_inv
    }

    /// Lower Cholesky factor `L` with `Σ = L Lᵀ`.
    pub fn cholesky(&self) -> &Array2<f64> {
        &self.sigma_l
    }

    /// Number of free parameters, as counted by BIC.
    pub fn length(&self) -> usize {
        let d = self.dim();
        match self.kind {
            CovarianceKind::Spherical => d,
            CovarianceKind::Diagonal => 2 * d,
            CovarianceKind::Full => d + d * (d + 1) / 2,
        }
    }

    /// Differential entropy in nats.
    pub fn entropy(&self) -> f64 {
        self.pdf_constant + 0.5 * self.dim() as f64
    }

    /// Squared Mahalanobis distance `(x-μ)ᵀ Σ⁻¹ (x-μ)`.
    pub fn mahalanobis2(&self, x: &ArrayView1<'_, f64>) -> Result<f64> {
        self.check_dim(x)?;
        let diff = x - &self.mu;
        Ok(diff.dot(&self.sigma_inv.dot(&diff)))
    }

    /// `ln N(x | μ, Σ)`.
    pub fn log_density(&self, x: &ArrayView1<'_, f64>) -> Result<f64> {
        Ok(-0.5 * self.mahalanobis2(x)? - self.pdf_constant)
    }

    /// `N(x | μ, Σ)`.
    pub fn density(&self, x: &ArrayView1<'_, f64>) -> Result<f64> {
        self.log_density(x).map(f64::exp)
    }

    /// One M-step: re-estimate this component from responsibility weights.
    ///
    /// `posteriori[j]` is the responsibility of this component for row `j`
    /// of `data`. Returns the total weight `α = Σ posteriori` (unnormalized
    /// prior) and the re-estimated distribution, keeping this one's
    /// diagonal/full form. Full covariances get their diagonal multiplied by
    /// [`COVARIANCE_NUDGE`].
    pub fn maximization(
        &self,
        data: &ArrayView2<'_, f64>,
        posteriori: &ArrayView1<'_, f64>,
    ) -> Result<(f64, Self)> {
        let (n, d) = data.dim();
        if d != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: d,
            });
        }
        if posteriori.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: posteriori.len(),
            });
        }

        let alpha = numeric::sum(posteriori);
        if !(alpha > 0.0) || !alpha.is_finite() {
            return Err(Error::DegenerateComponent { component: 0 });
        }

        let mut mean = Array1::<f64>::zeros(d);
        for (row, &w) in data.outer_iter().zip(posteriori.iter()) {
            mean.scaled_add(w, &row);
        }
        mean /= alpha;

        if self.is_diagonal() {
            let mut variances = Array1::<f64>::zeros(d);
            for (row, &w) in data.outer_iter().zip(posteriori.iter()) {
                for k in 0..d {
                    let diff = row[k] - mean[k];
                    variances[k] += w * diff * diff;
                }
            }
            variances /= alpha;
            // A component sitting on identical samples has collapsed.
            if variances.iter().any(|v| !(*v > 0.0)) {
                return Err(Error::NotPositiveDefinite);
            }
            Ok((alpha, Self::diagonal(mean, variances)?))
        } else {
            let mut sigma = Array2::<f64>::zeros((d, d));
            for (row, &w) in data.outer_iter().zip(posteriori.iter()) {
                for j in 0..d {
                    let dj = row[j] - mean[j];
                    for l in 0..=j {
                        sigma[[j, l]] += w * dj * (row[l] - mean[l]);
                    }
                }
            }
            for j in 0..d {
                for l in 0..=j {
                    sigma[[j, l]] /= alpha;
                    sigma[[l, j]] = sigma[[j, l]];
                }
                sigma[[j, j]] *= COVARIANCE_NUDGE;
            }
            Ok((alpha, Self::full(mean, sigma)?))
        }
    }

    pub(crate) fn check_dim(&self, x: &ArrayView1<'_, f64>) -> Result<()> {
        if x.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: x.len(),
            });
        }
        Ok(())
    }
}

fn check_mean(mean: &Array1<f64>) -> Result<()> {
    if mean.is_empty() {
        return Err(Error::EmptyInput);
    }
    if mean.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "mean",
            message: "must be finite",
        });
    }
    Ok(())
}
