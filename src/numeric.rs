//! Numeric primitives shared by the distribution, seeding and mixture code.
//!
//! Everything here is a pure function over `ndarray` views. The only
//! mutating functions are [`scale`], [`add`], [`sub`], [`sort_with`] and
//! [`standardize`], and they say so in their signatures (`&mut`).
//!
//! Sample statistics use the unbiased `n - 1` denominator throughout.

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

/// Sum of the elements.
pub fn sum(x: &ArrayView1<'_, f64>) -> f64 {
    x.iter().sum()
}

/// Arithmetic mean. Fails on empty input.
pub fn mean(x: &ArrayView1<'_, f64>) -> Result<f64> {
    if x.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(sum(x) / x.len() as f64)
}

/// Unbiased sample variance. Requires at least two elements.
pub fn var(x: &ArrayView1<'_, f64>) -> Result<f64> {
    let n = x.len();
    if n < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            found: n,
        });
    }

    let mu = mean(x)?;
    let ss: f64 = x.iter().map(|v| (v - mu) * (v - mu)).sum();
    Ok(ss / (n - 1) as f64)
}

/// Unbiased sample standard deviation.
pub fn sd(x: &ArrayView1<'_, f64>) -> Result<f64> {
    var(x).map(f64::sqrt)
}

/// Dot product. Fails on length mismatch.
pub fn dot(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> Result<f64> {
    check_len(a.len(), b.len())?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// `x *= a`, in place.
pub fn scale(x: &mut ArrayViewMut1<'_, f64>, a: f64) {
    x.mapv_inplace(|v| v * a);
}

/// `y += x`, in place.
pub fn add(y: &mut ArrayViewMut1<'_, f64>, x: &ArrayView1<'_, f64>) -> Result<()> {
    check_len(x.len(), y.len())?;
    y.zip_mut_with(x, |a, b| *a += b);
    Ok(())
}

/// `y -= x`, in place.
pub fn sub(y: &mut ArrayViewMut1<'_, f64>, x: &ArrayView1<'_, f64>) -> Result<()> {
    check_len(x.len(), y.len())?;
    y.zip_mut_with(x, |a, b| *a -= b);
    Ok(())
}

/// Column means of an `n x d` sample matrix.
pub fn col_means(data: &ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    if data.nrows() == 0 {
        return Err(Error::EmptyInput);
    }
    let n = data.nrows() as f64;
    Ok(data.sum_axis(Axis(0)) / n)
}

/// Unbiased sample covariance of an `n x d` sample matrix.
pub fn cov(data: &ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let mu = col_means(data)?;
    cov_with_mean(data, &mu.view())
}

/// Unbiased sample covariance around a known mean.
///
/// Fills the lower triangle and mirrors it, so the result is exactly
/// symmetric.
pub fn cov_with_mean(data: &ArrayView2<'_, f64>, mu: &ArrayView1<'_, f64>) -> Result<Array2<f64>> {
    let (n, d) = data.dim();
    if n < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            found: n,
        });
    }
    check_len(d, mu.len())?;

    let mut sigma = Array2::<f64>::zeros((d, d));
    for row in data.outer_iter() {
        for j in 0..d {
            let dj = row[j] - mu[j];
            for l in 0..=j {
                sigma[[j, l]] += dj * (row[l] - mu[l]);
            }
        }
    }

    let denom = (n - 1) as f64;
    for j in 0..d {
        for l in 0..=j {
            sigma[[j, l]] /= denom;
            sigma[[l, j]] = sigma[[j, l]];
        }
    }

    Ok(sigma)
}

/// Squared Euclidean distance.
///
/// Low dimensions (2-4) take an unrolled path; lengths must agree.
pub fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    match a.len() {
        2 => {
            let d0 = a[0] - b[0];
            let d1 = a[1] - b[1];
            d0 * d0 + d1 * d1
        }
        3 => {
            let d0 = a[0] - b[0];
            let d1 = a[1] - b[1];
            let d2 = a[2] - b[2];
            d0 * d0 + d1 * d1 + d2 * d2
        }
        4 => {
            let d0 = a[0] - b[0];
            let d1 = a[1] - b[1];
            let d2 = a[2] - b[2];
            let d3 = a[3] - b[3];
            d0 * d0 + d1 * d1 + d2 * d2 + d3 * d3
        }
        _ => a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum(),
    }
}

/// Squared Euclidean distance treating `NaN` coordinates as missing.
///
/// Pairs where either side is `NaN` are skipped and the partial sum is
/// rescaled by `n / m`, where `m` is the number of usable pairs. Returns
/// `f64::MAX` when no pair is usable.
pub fn squared_distance_missing(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    let mut m = 0usize;
    let mut dist = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        if !x.is_nan() && !y.is_nan() {
            m += 1;
            let d = x - y;
            dist += d * d;
        }
    }

    if m == 0 {
        f64::MAX
    } else {
        n as f64 * dist / m as f64
    }
}

/// Index of the largest element (first one on ties). `None` when empty.
pub fn which_max(x: &ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in x.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Partitions below this size finish with insertion sort.
const INSERTION_CUTOFF: usize = 7;

/// Sorts `x` ascending and applies the same permutation to `companion`.
///
/// Iterative quicksort with median-of-three pivots; typically used to sort
/// distances alongside the indices of the samples they belong to. `NaN`
/// sorts after every number.
pub fn sort_with<T>(x: &mut [f64], companion: &mut [T]) -> Result<()> {
    check_len(x.len(), companion.len())?;

    let mut stack = vec![(0usize, x.len())];
    while let Some((lo, hi)) = stack.pop() {
        if hi - lo <= INSERTION_CUTOFF {
            insertion_sort(&mut x[lo..hi], &mut companion[lo..hi]);
            continue;
        }

        let p = lo + partition(&mut x[lo..hi], &mut companion[lo..hi]);
        // Push the larger half first so the smaller one is handled next.
        if p - lo > hi - p - 1 {
            stack.push((lo, p));
            stack.push((p + 1, hi));
        } else {
            stack.push((p + 1, hi));
            stack.push((lo, p));
        }
    }

    Ok(())
}

fn insertion_sort<T>(x: &mut [f64], c: &mut [T]) {
    for i in 1..x.len() {
        let mut j = i;
        while j > 0 && x[j].total_cmp(&x[j - 1]).is_lt() {
            x.swap(j, j - 1);
            c.swap(j, j - 1);
            j -= 1;
        }
    }
}

fn partition<T>(x: &mut [f64], c: &mut [T]) -> usize {
    let last = x.len() - 1;
    let mid = x.len() / 2;

    // Median of first/middle/last ends up at `last`.
    if x[mid].total_cmp(&x[0]).is_lt() {
        x.swap(0, mid);
        c.swap(0, mid);
    }
    if x[last].total_cmp(&x[0]).is_lt() {
        x.swap(0, last);
        c.swap(0, last);
    }
    if x[mid].total_cmp(&x[last]).is_lt() {
        x.swap(mid, last);
        c.swap(mid, last);
    }

    let pivot = x[last];
    let mut store = 0;
    for i in 0..last {
        if x[i].total_cmp(&pivot).is_lt() {
            x.swap(i, store);
            c.swap(i, store);
            store += 1;
        }
    }
    x.swap(store, last);
    c.swap(store, last);
    store
}

/// Column centring/scaling applied by [`standardize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Standardization {
    /// Per-column means that were subtracted.
    pub means: Array1<f64>,
    /// Per-column standard deviations that were divided out.
    /// Zero for columns that were left unscaled.
    pub sds: Array1<f64>,
}

/// Z-scores every column of `data` in place.
///
/// Columns with zero variance are centred but not scaled; each one is
/// reported with a `warn` log line instead of dividing by zero.
pub fn standardize(data: &mut Array2<f64>) -> Result<Standardization> {
    let (n, d) = data.dim();
    if n < 2 {
        return Err(Error::InsufficientData {
            required: 2,
            found: n,
        });
    }

    let means = col_means(&data.view())?;
    let mut sds = Array1::<f64>::zeros(d);

    for (j, mut column) in data.axis_iter_mut(Axis(1)).enumerate() {
        column.mapv_inplace(|v| v - means[j]);
        let s = sd(&column.view())?;
        if s == 0.0 || !s.is_finite() {
            log::warn!("standardize: column {j} has zero variance, leaving it unscaled");
            continue;
        }
        scale(&mut column, 1.0 / s);
        sds[j] = s;
    }

    Ok(Standardization { means, sds })
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::DimensionMismatch { expected, found });
    }
    Ok(())
}
