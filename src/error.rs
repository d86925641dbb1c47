use core::fmt;

/// Result alias for `gaussmix`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by distribution construction, EM fitting and model selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Vector dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Matrix shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Cholesky factorization failed: the matrix is not positive-definite.
    NotPositiveDefinite,

    /// Matrix is singular and cannot be inverted.
    SingularMatrix,

    /// Invalid number of mixture components requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of samples.
        n_items: usize,
    },

    /// Too few samples for the requested operation.
    InsufficientData {
        /// Minimum number of samples required.
        required: usize,
        /// Number of samples provided.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Every component assigns zero (or non-finite) likelihood to a sample.
    ZeroResponsibility {
        /// Index of the offending sample.
        sample: usize,
    },

    /// A query point has zero (or non-finite) density under every component.
    ZeroDensity,

    /// A component received zero total responsibility in the M-step.
    DegenerateComponent {
        /// Index of the offending component.
        component: usize,
    },

    /// Generic error with message.
    Other(String),
}

impl Error {
    /// Whether this error comes from a numerical breakdown during fitting
    /// rather than from malformed input.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Error::NotPositiveDefinite
                | Error::SingularMatrix
                | Error::ZeroResponsibility { .. }
                | Error::ZeroDensity
                | Error::DegenerateComponent { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::NotPositiveDefinite => write!(f, "matrix is not positive-definite"),
            Error::SingularMatrix => write!(f, "matrix is singular"),
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot fit {requested} components to {n_items} samples")
            }
            Error::InsufficientData { required, found } => {
                write!(f, "insufficient data: need at least {required} samples, got {found}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::ZeroResponsibility { sample } => {
                write!(f, "sample {sample} has zero likelihood under every component")
            }
            Error::ZeroDensity => {
                write!(f, "query point has zero density under every component")
            }
            Error::DegenerateComponent { component } => {
                write!(f, "component {component} received zero total responsibility")
            }
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
