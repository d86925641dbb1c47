//! Choosing the number of components by BIC.

use super::component::Component;
use super::em::{EmConfig, GaussianMixture};
use super::seeding::KmeansPlusPlus;
use super::traits::{Clustering, SoftClustering};
use crate::error::{Error, Result};
use crate::gaussian::MultivariateGaussian;
use ndarray::{Array2, ArrayView2};
use rand::prelude::*;

/// Samples per component the BIC search may go up to: `k ≤ n / 20`.
const SAMPLES_PER_COMPONENT: usize = 20;

/// Seeds, fits and compares Gaussian mixtures.
///
/// [`fit_k`](Self::fit_k) fits a fixed number of components.
/// [`fit`](Self::fit) searches `k = 1, 2, …, n / 20` and keeps the last
/// mixture whose BIC improved on its predecessor; the search stops at the
/// first candidate that does not improve.
///
/// Every candidate starts from the same place: centroids from
/// [`KmeansPlusPlus`], equal weights, and the covariance of the whole data
/// set (per-axis variances when `diagonal`).
#[derive(Debug, Clone)]
pub struct MixtureSelector {
    /// Fit per-axis variances instead of full covariances.
    pub diagonal: bool,
    /// EM loop settings for every candidate.
    pub em: EmConfig,
    /// Centroid seeding settings.
    pub seeding: KmeansPlusPlus,
    /// Random seed; `None` draws from the thread RNG.
    pub seed: Option<u64>,
    /// Fixed component count for the [`Clustering`] impls; `None` searches.
    pub n_components: Option<usize>,
    /// Minimum number of samples for the BIC search.
    pub min_samples: usize,
}

impl Default for MixtureSelector {
    fn default() -> Self {
        Self {
            diagonal: true,
            em: EmConfig::default(),
            seeding: KmeansPlusPlus::default(),
            seed: None,
            n_components: None,
            min_samples: 20,
        }
    }
}

impl MixtureSelector {
    /// Diagonal covariances, default EM and seeding, BIC search over at
    /// least 20 samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose between diagonal and full covariances.
    pub fn with_diagonal(mut self, diagonal: bool) -> Self {
        self.diagonal = diagonal;
        self
    }

    /// Set the EM settings.
    pub fn with_em(mut self, em: EmConfig) -> Self {
        self.em = em;
        self
    }

    /// Set the seeding settings.
    pub fn with_seeding(mut self, seeding: KmeansPlusPlus) -> Self {
        self.seeding = seeding;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the component count used by the [`Clustering`] impls.
    pub fn with_n_components(mut self, k: usize) -> Self {
        self.n_components = Some(k);
        self
    }

    /// Set the minimum sample count for the BIC search.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Fit exactly `k` components.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientData`] when there are fewer samples than half of
    /// `k`, [`Error::InvalidClusterCount`] when `k` is zero or exceeds the
    /// sample count; otherwise any failure of seeding or EM.
    pub fn fit_k(&self, k: usize, data: &ArrayView2<'_, f64>) -> Result<GaussianMixture> {
        self.validate()?;
        check_count(k, data.nrows())?;
        let mut rng = self.rng();
        self.fit_candidate(k, data, &mut rng)
    }

    /// Fit with the component count that maximizes BIC, by greedy search.
    ///
    /// A candidate that breaks down numerically ends the search and the best
    /// mixture so far is returned. Failures at `k = 1` propagate.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientData`] when there are fewer than `min_samples`
    /// samples.
    pub fn fit(&self, data: &ArrayView2<'_, f64>) -> Result<GaussianMixture> {
        self.validate()?;
        let n = data.nrows();
        if n < self.min_samples.max(1) {
            return Err(Error::InsufficientData {
                required: self.min_samples.max(1),
                found: n,
            });
        }

        let mut rng = self.rng();
        let mut best = self.fit_candidate(1, data, &mut rng)?;
        log::info!("k = 1: BIC {:.4}", best.bic());

        for k in 2..=n / SAMPLES_PER_COMPONENT {
            let candidate = match self.fit_candidate(k, data, &mut rng) {
                Ok(candidate) => candidate,
                Err(e) if e.is_numerical() => {
                    log::warn!("abandoning component search at k = {k}: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };
            log::info!("k = {k}: BIC {:.4}", candidate.bic());

            if candidate.bic() <= best.bic() {
                break;
            }
            best = candidate;
        }

        log::debug!("selected {} components", best.n_components());
        Ok(best)
    }

    fn validate(&self) -> Result<()> {
        self.em.validate()?;
        self.seeding.validate()
    }

    fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        }
    }

    pub(crate) fn fit_candidate<R: Rng + ?Sized>(
        &self,
        k: usize,
        data: &ArrayView2<'_, f64>,
        rng: &mut R,
    ) -> Result<GaussianMixture> {
        check_count(k, data.nrows())?;

        let global = MultivariateGaussian::fit(data, self.diagonal)?;
        let centroids = self.seeding.seed(data, k, rng)?;
        let priori = 1.0 / k as f64;

        let components = centroids
            .outer_iter()
            .map(|c| {
                let dist = if self.diagonal {
                    MultivariateGaussian::diagonal(c.to_owned(), global.cov().diag().to_owned())?
                } else {
                    MultivariateGaussian::full(c.to_owned(), global.cov().clone())?
                };
                Component::new(priori, dist)
            })
            .collect::<Result<Vec<_>>>()?;

        GaussianMixture::fit(components, data, &self.em)
    }

    fn fit_configured(&self, data: &ArrayView2<'_, f64>) -> Result<GaussianMixture> {
        match self.n_components {
            Some(k) => self.fit_k(k, data),
            None => self.fit(data),
        }
    }
}

fn check_count(k: usize, n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if k == 0 {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }
    let required = k.div_ceil(2);
    if n < required {
        return Err(Error::InsufficientData { required, found: n });
    }
    Ok(())
}

fn to_matrix(data: &[Vec<f64>]) -> Result<Array2<f64>> {
    let first = data.first().ok_or(Error::EmptyInput)?;
    let (n, d) = (data.len(), first.len());

    let mut flat: Vec<f64> = Vec::with_capacity(n * d);
    for point in data {
        if point.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }
        flat.extend(point);
    }
    Array2::from_shape_vec((n, d), flat).map_err(|e| Error::Other(e.to_string()))
}

impl Clustering for MixtureSelector {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        let x = to_matrix(data)?;
        let gm = self.fit_configured(&x.view())?;
        x.outer_iter().map(|row| gm.predict(&row)).collect()
    }

    fn n_clusters(&self) -> Option<usize> {
        self.n_components
    }
}

impl SoftClustering for MixtureSelector {
    fn fit_predict_proba(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let x = to_matrix(data)?;
        let gm = self.fit_configured(&x.view())?;
        x.outer_iter()
            .map(|row| gm.posteriori(&row).map(|p| p.to_vec()))
            .collect()
    }
}
