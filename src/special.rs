//! Scalar special functions: error function, standard normal CDF/quantile,
//! log-gamma, the regularized incomplete gamma function and the chi-square
//! distribution built on it.
//!
//! These back the single-axis helpers of [`crate::gaussian`] (used by the
//! multivariate CDF) and the chi-square threshold of
//! [`crate::GaussianMixture::in_distribution`].

use crate::error::{Error, Result};
use std::f64::consts::{PI, SQRT_2};

/// Complementary error function.
///
/// Chebyshev-fitted rational approximation with fractional error below
/// 1.2e-7 everywhere.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let ans = t
        * (-z * z - 1.265_512_23
            + t * (1.000_023_68
                + t * (0.374_091_96
                    + t * (0.096_784_18
                        + t * (-0.186_288_06
                            + t * (0.278_868_07
                                + t * (-1.135_203_98
                                    + t * (1.488_515_87
                                        + t * (-0.822_152_23 + t * 0.170_872_77)))))))))
            .exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Standard normal CDF, `Φ(x) = erfc(-x / √2) / 2`.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal quantile `Φ⁻¹(p)`. Fails unless `0 < p < 1`.
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::InvalidParameter {
            name: "p",
            message: "must be in (0, 1)",
        });
    }
    Ok(normal_quantile_unchecked(p))
}

/// Acklam's rational approximation (relative error ~1.15e-9).
/// Returns `±inf` at the ends of `[0, 1]`.
pub(crate) fn normal_quantile_unchecked(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Natural log of the gamma function (Lanczos, g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula.
        return (PI / (PI * x).sin().abs()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut a = COEF[0];
    let t = x + G + 0.5;
    for (i, c) in COEF.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

const MAX_GAMMA_ITER: usize = 1000;

/// Regularized lower incomplete gamma function `P(a, x)`.
pub fn regularized_gamma_p(a: f64, x: f64) -> Result<f64> {
    if !(a > 0.0) {
        return Err(Error::InvalidParameter {
            name: "a",
            message: "must be > 0",
        });
    }
    if x.is_nan() || x < 0.0 {
        return Err(Error::InvalidParameter {
            name: "x",
            message: "must be >= 0",
        });
    }
    if x == 0.0 {
        return Ok(0.0);
    }
    if x.is_infinite() {
        return Ok(1.0);
    }

    let log_prefix = -x + a * x.ln() - ln_gamma(a);

    if x < a + 1.0 {
        // Series representation.
        let mut ap = a;
        let mut del = 1.0 / a;
        let mut total = del;
        for _ in 0..MAX_GAMMA_ITER {
            ap += 1.0;
            del *= x / ap;
            total += del;
            if del.abs() < total.abs() * f64::EPSILON {
                break;
            }
        }
        Ok((total * log_prefix.exp()).clamp(0.0, 1.0))
    } else {
        // Continued fraction for Q(a, x), modified Lentz.
        let tiny = f64::MIN_POSITIVE / f64::EPSILON;
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / tiny;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=MAX_GAMMA_ITER {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < tiny {
                d = tiny;
            }
            c = b + an / c;
            if c.abs() < tiny {
                c = tiny;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < f64::EPSILON {
                break;
            }
        }
        Ok((1.0 - log_prefix.exp() * h).clamp(0.0, 1.0))
    }
}

/// Chi-square CDF with `df` degrees of freedom.
pub fn chi_square_cdf(x: f64, df: usize) -> Result<f64> {
    if df == 0 {
        return Err(Error::InvalidParameter {
            name: "df",
            message: "must be > 0",
        });
    }
    if x <= 0.0 {
        return Ok(0.0);
    }
    regularized_gamma_p(df as f64 / 2.0, x / 2.0)
}

/// Chi-square quantile (inverse CDF) with `df` degrees of freedom.
///
/// Brackets the root by doubling, then bisects the CDF.
pub fn chi_square_quantile(p: f64, df: usize) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::InvalidParameter {
            name: "p",
            message: "must be in (0, 1)",
        });
    }
    if df == 0 {
        return Err(Error::InvalidParameter {
            name: "df",
            message: "must be > 0",
        });
    }

    let mut lo = 0.0;
    let mut hi = (df as f64).max(1.0);
    while chi_square_cdf(hi, df)? < p {
        lo = hi;
        hi *= 2.0;
        if !hi.is_finite() {
            return Err(Error::Other(format!(
                "chi-square quantile did not bracket p={p} for df={df}"
            )));
        }
    }

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if chi_square_cdf(mid, df)? < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-12 * hi.max(1.0) {
            break;
        }
    }

    Ok(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn erfc_known_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-7);
        assert!((erfc(1.0) - 0.157_299_207_050_285_1).abs() < 1e-7);
        assert!((erfc(-1.0) - 1.842_700_792_949_715).abs() < 1e-7);
        assert!(erfc(10.0) < 1e-40);
    }

    #[test]
    fn normal_cdf_known_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.959_963_984_540_054) - 0.975).abs() < 1e-6);
        assert!((normal_cdf(-1.0) - 0.158_655_253_931_457).abs() < 1e-6);
    }

    #[test]
    fn normal_quantile_known_values() {
        assert!((normal_quantile(0.975).unwrap() - 1.959_963_984_540_054).abs() < 1e-6);
        assert!((normal_quantile(0.5).unwrap()).abs() < 1e-9);
        assert!((normal_quantile(0.001).unwrap() + 3.090_232_306_167_813).abs() < 1e-6);
        assert!(normal_quantile(0.0).is_err());
        assert!(normal_quantile(1.0).is_err());
        assert!(normal_quantile(f64::NAN).is_err());
    }

    #[test]
    fn ln_gamma_matches_factorials() {
        assert!(ln_gamma(1.0).abs() < 1e-12);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-12);
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-12);
        assert!((ln_gamma(10.5) - 1_133_278.388_948_785_4f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn chi_square_two_dof_is_exponential() {
        // df = 2: F(x) = 1 - exp(-x / 2).
        for &x in &[0.1, 1.0, 3.0, 10.0, 25.0] {
            let expected = 1.0 - (-x / 2.0f64).exp();
            assert!((chi_square_cdf(x, 2).unwrap() - expected).abs() < 1e-12);
        }
        assert!((chi_square_quantile(0.95, 2).unwrap() - 5.991_464_547_107_979).abs() < 1e-8);
    }

    #[test]
    fn chi_square_quantile_known_values() {
        assert!((chi_square_quantile(0.95, 1).unwrap() - 3.841_458_820_694_124).abs() < 1e-7);
        assert!((chi_square_quantile(0.99, 3).unwrap() - 11.344_866_730_144_37).abs() < 1e-7);
        assert!((chi_square_quantile(0.5, 10).unwrap() - 9.341_817_765_591_966).abs() < 1e-7);
    }

    #[test]
    fn chi_square_rejects_bad_arguments() {
        assert!(chi_square_quantile(1.0, 2).is_err());
        assert!(chi_square_quantile(0.5, 0).is_err());
        assert!(chi_square_cdf(1.0, 0).is_err());
        assert!(regularized_gamma_p(0.0, 1.0).is_err());
    }

    proptest! {
        #[test]
        fn chi_square_quantile_inverts_cdf(p in 0.001f64..0.999, df in 1usize..30) {
            let x = chi_square_quantile(p, df).unwrap();
            prop_assert!((chi_square_cdf(x, df).unwrap() - p).abs() < 1e-8);
        }

        #[test]
        fn normal_quantile_inverts_cdf(p in 0.001f64..0.999) {
            let x = normal_quantile(p).unwrap();
            prop_assert!((normal_cdf(x) - p).abs() < 1e-6);
        }
    }
}
