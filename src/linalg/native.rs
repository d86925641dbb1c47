//! Hand-rolled dense kernels over `ndarray`.

use super::{check_product, check_square, MatrixOps};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Pivots with magnitude at or below this are treated as zero.
const PIVOT_EPS: f64 = 1e-300;

/// Native `ndarray` implementation of [`MatrixOps`].
///
/// Cholesky-Banachiewicz for the factorization, Gauss-Jordan with partial
/// pivoting for the inverse and LU with partial pivoting for the
/// determinant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOps;

impl MatrixOps for NativeOps {
    fn cholesky(&self, a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let n = check_square(&a)?;
        let mut l = Array2::<f64>::zeros((n, n));

        for i in 0..n {
            for j in 0..=i {
                let mut s = a[[i, j]];
                for k in 0..j {
                    s -= l[[i, k]] * l[[j, k]];
                }

                if i == j {
                    if !(s > 0.0) || !s.is_finite() {
                        return Err(Error::NotPositiveDefinite);
                    }
                    l[[i, i]] = s.sqrt();
                } else {
                    l[[i, j]] = s / l[[j, j]];
                }
            }
        }

        Ok(l)
    }

    fn inverse(&self, a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let n = check_square(&a)?;
        let mut m = a.to_owned();
        let mut inv = Array2::<f64>::eye(n);

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&x, &y| m[[x, col]].abs().total_cmp(&m[[y, col]].abs()))
                .unwrap_or(col);
            let pivot = m[[pivot_row, col]];
            if !(pivot.abs() > PIVOT_EPS) || !pivot.is_finite() {
                return Err(Error::SingularMatrix);
            }

            if pivot_row != col {
                for j in 0..n {
                    m.swap([pivot_row, j], [col, j]);
                    inv.swap([pivot_row, j], [col, j]);
                }
            }

            for j in 0..n {
                m[[col, j]] /= pivot;
                inv[[col, j]] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = m[[row, col]];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    m[[row, j]] -= factor * m[[col, j]];
                    inv[[row, j]] -= factor * inv[[col, j]];
                }
            }
        }

        Ok(inv)
    }

    fn determinant(&self, a: ArrayView2<'_, f64>) -> Result<f64> {
        let n = check_square(&a)?;
        let mut m = a.to_owned();
        let mut det = 1.0;

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&x, &y| m[[x, col]].abs().total_cmp(&m[[y, col]].abs()))
                .unwrap_or(col);
            let pivot = m[[pivot_row, col]];
            if pivot == 0.0 {
                return Ok(0.0);
            }

            if pivot_row != col {
                for j in 0..n {
                    m.swap([pivot_row, j], [col, j]);
                }
                det = -det;
            }
            det *= pivot;

            for row in (col + 1)..n {
                let factor = m[[row, col]] / pivot;
                for j in col..n {
                    m[[row, j]] -= factor * m[[col, j]];
                }
            }
        }

        Ok(det)
    }

    fn multiply(&self, a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        check_product(&a, &b)?;
        Ok(a.dot(&b))
    }
}
