//! `faer`-backed kernels.

use super::{check_product, check_square, MatrixOps};
use crate::error::{Error, Result};
use faer::prelude::*;
use faer::{Mat, MatRef, Side};
use ndarray::{Array2, ArrayView2};

/// [`MatrixOps`] implemented with `faer`'s LLᵀ and full-pivoting LU.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerOps;

fn to_faer(a: &ArrayView2<'_, f64>) -> Mat<f64> {
    Mat::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

fn to_ndarray(m: MatRef<'_, f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

impl MatrixOps for FaerOps {
    fn cholesky(&self, a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_square(&a)?;
        let m = to_faer(&a);
        let llt = m.llt(Side::Lower).map_err(|_| Error::NotPositiveDefinite)?;
        let l = llt.L();

        // Only the lower triangle of the factor is meaningful.
        let n = l.nrows();
        Ok(Array2::from_shape_fn((n, n), |(i, j)| {
            if j <= i {
                l[(i, j)]
            } else {
                0.0
            }
        }))
    }

    fn inverse(&self, a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let n = check_square(&a)?;
        let m = to_faer(&a);
        if m.determinant() == 0.0 {
            return Err(Error::SingularMatrix);
        }

        let inv = m.full_piv_lu().solve(&Mat::<f64>::identity(n, n));
        let out = to_ndarray(inv.as_ref());
        if out.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularMatrix);
        }
        Ok(out)
    }

    fn determinant(&self, a: ArrayView2<'_, f64>) -> Result<f64> {
        check_square(&a)?;
        Ok(to_faer(&a).determinant())
    }

    fn multiply(&self, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_product(&a, &b)?;
        let product = &to_faer(&a) * &to_faer(&b);
        Ok(to_ndarray(product.as_ref()))
    }
}
