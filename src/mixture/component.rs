use crate::error::{Error, Result};
use crate::gaussian::MultivariateGaussian;

/// Slack allowed above 1 for a prior that came out of renormalization.
const PRIORI_SLACK: f64 = 1e-9;

/// One weighted Gaussian of a mixture.
///
/// Components are values: the EM loop builds a fresh set every iteration
/// rather than updating these in place.
#[derive(Debug, Clone)]
pub struct Component {
    priori: f64,
    distribution: MultivariateGaussian,
}

impl Component {
    /// Pair a mixing weight in `(0, 1]` with its distribution.
    pub fn new(priori: f64, distribution: MultivariateGaussian) -> Result<Self> {
        if !(priori > 0.0) || priori > 1.0 + PRIORI_SLACK {
            return Err(Error::InvalidParameter {
                name: "priori",
                message: "must be in (0, 1]",
            });
        }
        Ok(Self {
            priori,
            distribution,
        })
    }

    /// Mixing weight.
    pub fn priori(&self) -> f64 {
        self.priori
    }

    /// The component's Gaussian.
    pub fn distribution(&self) -> &MultivariateGaussian {
        &self.distribution
    }

    /// `ln(priori) + ln N(x)`, the log of this component's share of `p(x)`.
    pub(crate) fn weighted_log_density(&self, x: &ndarray::ArrayView1<'_, f64>) -> Result<f64> {
        Ok(self.priori.ln() + self.distribution.log_density(x)?)
    }
}
