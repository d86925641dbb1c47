//! Dense linear algebra behind a small trait.
//!
//! The Gaussian code only needs four operations on small symmetric
//! positive-definite matrices: Cholesky factorization, inversion,
//! determinant and multiplication. [`MatrixOps`] names exactly those, so
//! the backend can be swapped without touching the distribution or mixture
//! logic.
//!
//! - [`NativeOps`]: hand-rolled kernels over `ndarray`, always available.
//! - `FaerOps`: delegates to `faer` (feature `faer`).
//!
//! [`DefaultOps`] is what the rest of the crate uses: `FaerOps` when the
//! feature is enabled, `NativeOps` otherwise.
//!
//! ## Contract
//!
//! - Non-square input to `cholesky`/`inverse`/`determinant` is a
//!   [`Error::ShapeMismatch`](crate::Error::ShapeMismatch).
//! - `cholesky` fails with [`Error::NotPositiveDefinite`](crate::Error::NotPositiveDefinite)
//!   and `inverse` with [`Error::SingularMatrix`](crate::Error::SingularMatrix);
//!   neither returns garbage.

mod native;

#[cfg(feature = "faer")]
mod faer_ops;

pub use native::NativeOps;

#[cfg(feature = "faer")]
pub use faer_ops::FaerOps;

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Backend used by [`crate::MultivariateGaussian`] unless another one is
/// injected.
#[cfg(feature = "faer")]
pub type DefaultOps = FaerOps;

/// Backend used by [`crate::MultivariateGaussian`] unless another one is
/// injected.
#[cfg(not(feature = "faer"))]
pub type DefaultOps = NativeOps;

/// Matrix operations required by the Gaussian distribution.
pub trait MatrixOps {
    /// Lower-triangular `L` with `A = L Lᵀ`.
    fn cholesky(&self, a: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// `A⁻¹`.
    fn inverse(&self, a: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// `det(A)`.
    fn determinant(&self, a: ArrayView2<'_, f64>) -> Result<f64>;

    /// `A · B`.
    fn multiply(&self, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>>;
}

pub(crate) fn check_square(a: &ArrayView2<'_, f64>) -> Result<usize> {
    let (r, c) = a.dim();
    if r != c {
        return Err(Error::ShapeMismatch {
            expected: "square matrix".to_string(),
            actual: format!("{r}x{c}"),
        });
    }
    Ok(r)
}

pub(crate) fn check_product(a: &ArrayView2<'_, f64>, b: &ArrayView2<'_, f64>) -> Result<()> {
    if a.ncols() != b.nrows() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} rows on the right operand", a.ncols()),
            actual: format!("{} rows", b.nrows()),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use ndarray::{array, Array2};

    /// A well-conditioned SPD matrix with off-diagonal structure.
    pub fn spd3() -> Array2<f64> {
        array![[4.0, 1.2, -0.6], [1.2, 3.0, 0.4], [-0.6, 0.4, 2.0]]
    }

    pub fn assert_close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{x} vs {y}\n{a}\n{b}");
        }
    }
}
