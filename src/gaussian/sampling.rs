//! Random variates.

use super::MultivariateGaussian;
use crate::error::Result;
use crate::linalg::{DefaultOps, MatrixOps};
use ndarray::{Array1, Array2};
use rand::Rng;

/// Standard normal deviate by the ratio-of-uniforms method with Leva's
/// quadratic bounds.
///
/// Most draws are accepted by the inner bound `q ≤ 0.27597`; the outer
/// bound `q > 0.27846` rejects without evaluating the log.
pub(crate) fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        // u in (0, 1] so ln(u) and v / u stay finite.
        let u: f64 = 1.0 - rng.random::<f64>();
        let v: f64 = 1.7156 * (rng.random::<f64>() - 0.5);
        let x = u - 0.449_871;
        let y = v.abs() + 0.386_595;
        let q = x * x + y * (0.196_00 * y - 0.254_72 * x);

        if q <= 0.275_97 {
            return v / u;
        }
        if q <= 0.278_46 && v * v <= -4.0 * u.ln() * u * u {
            return v / u;
        }
    }
}

impl MultivariateGaussian {
    /// One draw `μ + L z` with `z ~ N(0, I)`.
    pub fn random_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let z = Array1::from_iter((0..self.dim()).map(|_| standard_normal(rng)));
        self.sigma_l.dot(&z) + &self.mu
    }

    /// `n` draws as the rows of an `n x d` matrix.
    pub fn random_samples<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Array2<f64>> {
        let d = self.dim();
        let z = Array2::from_shape_simple_fn((n, d), || standard_normal(rng));
        // Rows of Z Lᵀ are L z.
        let mut out = DefaultOps::default().multiply(z.view(), self.sigma_l.t())?;
        for mut row in out.outer_iter_mut() {
            row += &self.mu;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric;
    use ndarray::array;
    use rand::prelude::*;

    #[test]
    fn standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws: Vec<f64> = (0..50_000).map(|_| standard_normal(&mut rng)).collect();
        let x = Array1::from(draws);
        assert!(numeric::mean(&x.view()).unwrap().abs() < 0.02);
        assert!((numeric::var(&x.view()).unwrap() - 1.0).abs() < 0.03);
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn sample_moments_match_parameters() {
        let g = MultivariateGaussian::full(array![3.0, -1.0], array![[2.0, 0.8], [0.8, 1.0]])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1234);
        let samples = g.random_samples(20_000, &mut rng).unwrap();
        assert_eq!(samples.dim(), (20_000, 2));

        let mu = numeric::col_means(&samples.view()).unwrap();
        let sigma = numeric::cov(&samples.view()).unwrap();
        assert!((mu[0] - 3.0).abs() < 0.05);
        assert!((mu[1] + 1.0).abs() < 0.05);
        assert!((sigma[[0, 0]] - 2.0).abs() < 0.1);
        assert!((sigma[[0, 1]] - 0.8).abs() < 0.1);
        assert!((sigma[[1, 1]] - 1.0).abs() < 0.1);
    }

    #[test]
    fn single_draws_are_reproducible() {
        let g = MultivariateGaussian::spherical(array![0.0, 0.0, 0.0], 2.0).unwrap();
        let a = g.random_sample(&mut StdRng::seed_from_u64(9));
        let b = g.random_sample(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }
}
