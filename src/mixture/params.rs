//! Plain-data snapshot of a fitted mixture.
//!
//! [`MixtureParams`] holds only numbers and the covariance form, so it can
//! be stored or sent anywhere (with the `serde` feature it derives
//! `Serialize`/`Deserialize`). Rebuilding goes through the same
//! constructor the form was created with, so the restored mixture gives
//! bit-identical densities.

use super::component::Component;
use super::em::GaussianMixture;
use crate::error::{Error, Result};
use crate::gaussian::{CovarianceKind, MultivariateGaussian};
use ndarray::{Array1, Array2};

/// One component of a [`MixtureParams`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentParams {
    /// Mixing weight.
    pub priori: f64,
    /// Covariance form.
    pub kind: CovarianceKind,
    /// Mean vector.
    pub mean: Vec<f64>,
    /// Covariance matrix, row by row.
    pub covariance: Vec<Vec<f64>>,
}

/// Snapshot of a [`GaussianMixture`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MixtureParams {
    /// Components in fitting order.
    pub components: Vec<ComponentParams>,
    /// Log-likelihood of the fitting data.
    pub log_likelihood: f64,
    /// Number of fitting samples.
    pub n: usize,
}

impl GaussianMixture {
    /// Snapshot this mixture.
    pub fn to_params(&self) -> MixtureParams {
        MixtureParams {
            components: self
                .components()
                .iter()
                .map(|c| {
                    let dist = c.distribution();
                    ComponentParams {
                        priori: c.priori(),
                        kind: dist.kind(),
                        mean: dist.mean().to_vec(),
                        covariance: dist.cov().outer_iter().map(|row| row.to_vec()).collect(),
                    }
                })
                .collect(),
            log_likelihood: self.log_likelihood(),
            n: self.n(),
        }
    }

    /// Rebuild a mixture from a snapshot.
    ///
    /// Fails like the distribution constructors do when the snapshot holds
    /// an invalid covariance, and with [`Error::ShapeMismatch`] when a
    /// covariance is not `d x d`.
    pub fn from_params(params: &MixtureParams) -> Result<Self> {
        let components = params
            .components
            .iter()
            .map(|p| Component::new(p.priori, p.to_distribution()?))
            .collect::<Result<Vec<_>>>()?;
        Self::with_stats(components, params.log_likelihood, params.n)
    }
}

impl ComponentParams {
    fn to_distribution(&self) -> Result<MultivariateGaussian> {
        let d = self.mean.len();
        if self.covariance.len() != d || self.covariance.iter().any(|row| row.len() != d) {
            return Err(Error::ShapeMismatch {
                expected: format!("{d}x{d} covariance"),
                actual: format!("{} rows", self.covariance.len()),
            });
        }

        let mean = Array1::from(self.mean.clone());
        let cov = Array2::from_shape_fn((d, d), |(i, j)| self.covariance[i][j]);
        match self.kind {
            CovarianceKind::Spherical => {
                let variance = cov.get((0, 0)).copied().ok_or(Error::EmptyInput)?;
                MultivariateGaussian::spherical(mean, variance)
            }
            CovarianceKind::Diagonal => MultivariateGaussian::diagonal(mean, cov.diag().to_owned()),
            CovarianceKind::Full => MultivariateGaussian::full(mean, cov),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn mixture() -> GaussianMixture {
        let comps = vec![
            Component::new(
                0.2,
                MultivariateGaussian::spherical(array![0.0, 1.0], 0.5).unwrap(),
            )
            .unwrap(),
            Component::new(
                0.3,
                MultivariateGaussian::diagonal(array![3.0, -1.0], array![1.5, 0.25]).unwrap(),
            )
            .unwrap(),
            Component::new(
                0.5,
                MultivariateGaussian::full(array![-2.0, 2.0], array![[2.0, 0.7], [0.7, 1.0]])
                    .unwrap(),
            )
            .unwrap(),
        ];
        GaussianMixture::with_stats(comps, -123.4, 250).unwrap()
    }

    #[test]
    fn round_trip_preserves_densities_exactly() {
        let original = mixture();
        let restored = GaussianMixture::from_params(&original.to_params()).unwrap();

        assert_eq!(restored.bic(), original.bic());
        assert_eq!(restored.free_parameters(), original.free_parameters());
        for probe in [array![0.0, 0.0], array![3.0, -1.0], array![-2.5, 1.1], array![10.0, 10.0]] {
            assert_eq!(
                restored.p(&probe.view()).unwrap(),
                original.p(&probe.view()).unwrap()
            );
            for (a, b) in restored.components().iter().zip(original.components()) {
                assert_eq!(
                    a.distribution().density(&probe.view()).unwrap(),
                    b.distribution().density(&probe.view()).unwrap()
                );
            }
        }
    }

    #[test]
    fn snapshot_keeps_kinds() {
        let params = mixture().to_params();
        let kinds: Vec<_> = params.components.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CovarianceKind::Spherical,
                CovarianceKind::Diagonal,
                CovarianceKind::Full
            ]
        );
        assert_eq!(params.components[2].covariance[0][1], 0.7);
        assert_eq!(params.n, 250);
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        let mut params = mixture().to_params();
        params.components[2].covariance.pop();
        assert!(matches!(
            GaussianMixture::from_params(&params),
            Err(Error::ShapeMismatch { .. })
        ));

        let mut params = mixture().to_params();
        params.components[2].covariance = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        assert_eq!(
            GaussianMixture::from_params(&params).err(),
            Some(Error::NotPositiveDefinite)
        );
    }
}
