use thiserror::Error;

/// Top-level error type for the scopetrace engine.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by the bracketed root finder.
///
/// These are per-ray failures: the pipeline turns them into a lost ray
/// instead of aborting the ensemble pass.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SolverError {
    #[error("root not bracketed: f({lower}) = {f_lower}, f({upper}) = {f_upper}")]
    RootNotBracketed {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("root search did not converge after {iterations} iterations (bracket width {width:e})")]
    MaxIterationsExceeded { iterations: usize, width: f64 },

    #[error("residual is not finite at t = {t}")]
    NonFiniteResidual { t: f64 },
}

/// Errors raised while redirecting a ray at a surface.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum TransferError {
    #[error("diffraction order is evanescent (radicand {radicand:e})")]
    UnphysicalDiffractionOrder { radicand: f64 },

    #[error("surface normal is degenerate")]
    DegenerateNormal,

    #[error("groove vector is parallel to the z axis")]
    DegenerateGrooveFrame,
}

/// Errors in the instrument description. These abort the whole run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pipeline has no elements")]
    EmptyPipeline,

    #[error("invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("element {0} diffracts but its surface is not a grating")]
    NotAGrating(String),

    #[error("missing parameter {0}")]
    MissingParameter(&'static str),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            parameter,
            value,
            reason,
        }
    }
}

/// Convenience type alias for results using [`ScopeError`].
pub type Result<T> = std::result::Result<T, ScopeError>;
