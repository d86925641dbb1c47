//! Slice-in, labels-out clustering interface.

use crate::error::Result;

/// Hard clustering over rows given as `Vec<f64>`.
pub trait Clustering {
    /// Fit on `data` and label every row with its cluster index.
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>>;

    /// The fixed number of clusters, or `None` when it is chosen from the data.
    fn n_clusters(&self) -> Option<usize>;
}

/// Clustering that can also report membership probabilities.
pub trait SoftClustering: Clustering {
    /// Fit on `data` and return, per row, the probability of each cluster.
    ///
    /// Entry \[i\]\[k\] is the responsibility of cluster k for row i; every
    /// row sums to 1.
    fn fit_predict_proba(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}
