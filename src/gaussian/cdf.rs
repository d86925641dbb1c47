//! Multivariate normal CDF by Genz's separation-of-variables method.
//!
//! Transforms `P(X ≤ x)` into an integral over the unit cube using the
//! Cholesky factor, then estimates it by Monte Carlo with a running
//! variance estimate. Sampling stops once `ALPHA · σ̂ ≤ ERR_MAX` or after
//! `N_MAX` draws.
//!
//! Reference: Genz (1992), "Numerical Computation of Multivariate Normal
//! Probabilities".

use super::MultivariateGaussian;
use crate::error::Result;
use crate::special::{normal_cdf, normal_quantile_unchecked};
use ndarray::{Array1, ArrayView1};
use rand::Rng;

/// Monte Carlo confidence factor.
const ALPHA: f64 = 2.5;
/// Target absolute error.
const ERR_MAX: f64 = 0.001;
/// Draw budget.
const N_MAX: usize = 10_000;

impl MultivariateGaussian {
    /// `P(X₁ ≤ x₁, …, X_d ≤ x_d)`.
    ///
    /// Randomized: results for `d ≥ 2` with correlated axes vary with `rng`
    /// within the error target. Diagonal covariances and `d = 1` are exact
    /// up to the accuracy of [`normal_cdf`].
    pub fn cdf<R: Rng + ?Sized>(&self, x: &ArrayView1<'_, f64>, rng: &mut R) -> Result<f64> {
        self.check_dim(x)?;

        let d = self.dim();
        let l = &self.sigma_l;
        let v: Array1<f64> = x - &self.mu;

        let mut f = vec![0.0; d];
        let mut y = vec![0.0; d];
        f[0] = normal_cdf(v[0] / l[[0, 0]]);

        let mut p = 0.0;
        let mut varsum = 0.0;
        let mut err = 2.0 * ERR_MAX;
        let mut n = 1usize;

        while err > ERR_MAX && n <= N_MAX {
            for i in 1..d {
                let w: f64 = rng.random();
                // Keep the quantile finite when the running product hits zero.
                let u = (w * f[i - 1]).max(f64::MIN_POSITIVE);
                y[i - 1] = normal_quantile_unchecked(u);

                let q: f64 = (0..i).map(|j| l[[i, j]] * y[j]).sum();
                f[i] = normal_cdf((v[i] - q) / l[[i, i]]) * f[i - 1];
            }

            let nf = n as f64;
            let del = (f[d - 1] - p) / nf;
            p += del;
            varsum = (nf - 2.0) * varsum / nf + del * del;
            err = ALPHA * varsum.sqrt();
            n += 1;
        }

        Ok(p)
    }
}
