//! Deterministic distance-relaxation seeding.
//!
//! Not the textbook k-means++ roulette wheel. Centroids are chosen one at
//! a time:
//!
//! 1. The first starts at a uniformly drawn sample. With no other centres
//!    every sample is in its cell and weighs 1, so relaxation moves it onto
//!    the global mean.
//! 2. Every further centroid starts at the sample farthest (largest `D²`)
//!    from the centres chosen so far.
//! 3. Relaxation: replace the candidate by the `D²`-weighted mean of the
//!    samples it captures (those closer to it than to any chosen centre),
//!    as long as the potential `Σⱼ min_c ‖xⱼ - c‖²` keeps improving by
//!    more than `tol`, for at most `max_iter` moves.
//!
//! Only the first choice is random.

use crate::error::{Error, Result};
use crate::numeric;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;

/// Relaxation seeder for EM starting centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansPlusPlus {
    /// Maximum relaxation moves per centroid.
    pub max_iter: usize,
    /// Minimum potential improvement for another move.
    pub tol: f64,
}

impl Default for KmeansPlusPlus {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tol: 1e-8,
        }
    }
}

impl KmeansPlusPlus {
    /// Create a seeder with 500 moves per centroid and `tol = 1e-8`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum relaxation moves per centroid.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the improvement threshold.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.tol >= 0.0) || !self.tol.is_finite() {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and >= 0",
            });
        }
        Ok(())
    }

    /// Choose `k` centroids from the rows of `data`; returns a `k x d` matrix.
    pub fn seed<R: Rng + ?Sized>(
        &self,
        data: &ArrayView2<'_, f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>> {
        self.validate()?;
        let (n, d) = data.dim();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if k == 0 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }

        let mut centroids = Array2::zeros((k, d));
        // D² to the nearest chosen centre; infinite until one exists.
        let mut d2 = vec![f64::INFINITY; n];

        let first = rng.random_range(0..n);

        for c in 0..k {
            let start = if c == 0 {
                data.row(first).to_owned()
            } else {
                farthest_sample(data, &d2)?
            };
            let centroid = self.relax(data, &d2, start);
            for (slot, x) in d2.iter_mut().zip(data.outer_iter()) {
                *slot = slot.min(numeric::squared_distance(&x, &centroid.view()));
            }
            centroids.row_mut(c).assign(&centroid);
        }

        Ok(centroids)
    }

    fn relax(&self, data: &ArrayView2<'_, f64>, d2: &[f64], start: Array1<f64>) -> Array1<f64> {
        let mut centroid = start;
        let mut cost = potential(data, d2, &centroid.view());

        for _ in 0..self.max_iter {
            let Some(candidate) = cell_mean(data, d2, &centroid.view()) else {
                break;
            };
            let next_cost = potential(data, d2, &candidate.view());
            let gain = cost - next_cost;
            if !(gain > 0.0) {
                break;
            }
            centroid = candidate;
            cost = next_cost;
            if gain <= self.tol {
                break;
            }
        }

        centroid
    }
}

/// The sample with the largest `D²`.
fn farthest_sample(data: &ArrayView2<'_, f64>, d2: &[f64]) -> Result<Array1<f64>> {
    let mut dist = d2.to_vec();
    let mut order: Vec<usize> = (0..d2.len()).collect();
    numeric::sort_with(&mut dist, &mut order)?;
    let far = order.last().copied().ok_or(Error::EmptyInput)?;
    Ok(data.row(far).to_owned())
}

/// `Σⱼ min(D²ⱼ, ‖xⱼ - c‖²)`.
fn potential(data: &ArrayView2<'_, f64>, d2: &[f64], c: &ArrayView1<'_, f64>) -> f64 {
    data.outer_iter()
        .zip(d2)
        .map(|(x, &dj)| dj.min(numeric::squared_distance(&x, c)))
        .sum()
}

/// `D²`-weighted mean of the samples strictly closer to `c` than to any
/// chosen centre; unit weights before the first centre exists. `None` when
/// the cell carries no weight.
fn cell_mean(
    data: &ArrayView2<'_, f64>,
    d2: &[f64],
    c: &ArrayView1<'_, f64>,
) -> Option<Array1<f64>> {
    let mut sum = Array1::zeros(data.ncols());
    let mut weight = 0.0;
    for (x, &dj) in data.outer_iter().zip(d2) {
        if numeric::squared_distance(&x, c) < dj {
            let w = if dj.is_finite() { dj } else { 1.0 };
            sum.scaled_add(w, &x);
            weight += w;
        }
    }
    (weight > 0.0).then(|| sum / weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::prelude::*;

    fn three_blobs() -> Array2<f64> {
        let mut rows = Vec::new();
        for (cx, cy) in [(-10.0, 0.0), (0.0, 10.0), (10.0, 0.0)] {
            for i in 0..10 {
                let t = i as f64 * 0.6;
                rows.push([cx + 0.3 * t.cos(), cy + 0.3 * t.sin()]);
            }
        }
        Array2::from_shape_vec((rows.len(), 2), rows.concat()).unwrap()
    }

    #[test]
    fn first_centroid_is_global_mean() {
        let data = array![[0.0, 0.0], [2.0, 0.0], [4.0, 6.0]];
        let mut rng = StdRng::seed_from_u64(1);
        let c = KmeansPlusPlus::new().seed(&data.view(), 1, &mut rng).unwrap();
        assert!((c[[0, 0]] - 2.0).abs() < 1e-12);
        assert!((c[[0, 1]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn deterministic_for_a_seed() {
        let data = three_blobs();
        let a = KmeansPlusPlus::new()
            .seed(&data.view(), 3, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = KmeansPlusPlus::new()
            .seed(&data.view(), 3, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn centroids_are_distinct_on_separated_data() {
        let data = three_blobs();
        let c = KmeansPlusPlus::new()
            .seed(&data.view(), 3, &mut StdRng::seed_from_u64(7))
            .unwrap();
        for i in 0..3 {
            for j in 0..i {
                let d = numeric::squared_distance(&c.row(i), &c.row(j)).sqrt();
                assert!(d > 5.0, "centroids {i} and {j} are {d} apart");
            }
        }
    }

    #[test]
    fn later_centroids_land_in_blobs() {
        let data = three_blobs();
        let c = KmeansPlusPlus::new()
            .seed(&data.view(), 3, &mut StdRng::seed_from_u64(3))
            .unwrap();
        // After the global mean, the two outer blobs are the farthest.
        for row in c.outer_iter().skip(1) {
            assert!((row[0].abs() - 10.0).abs() < 1.0, "{row}");
            assert!(row[1].abs() < 1.0, "{row}");
        }
    }

    #[test]
    fn rejects_bad_counts() {
        let data = array![[0.0], [1.0]];
        let mut rng = StdRng::seed_from_u64(0);
        let seeder = KmeansPlusPlus::new();
        assert!(matches!(
            seeder.seed(&data.view(), 0, &mut rng),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(matches!(
            seeder.seed(&data.view(), 3, &mut rng),
            Err(Error::InvalidClusterCount { requested: 3, n_items: 2 })
        ));
        let empty = Array2::<f64>::zeros((0, 1));
        assert_eq!(seeder.seed(&empty.view(), 1, &mut rng), Err(Error::EmptyInput));
        assert!(KmeansPlusPlus::new()
            .with_tol(-1.0)
            .seed(&data.view(), 1, &mut rng)
            .is_err());
    }
}
