use roots::{find_root_brent, Convergency, SearchError};

use crate::error::SolverError;

/// A search interval `[lower, upper]` for a one-dimensional root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Lower end of the interval.
    pub lower: f64,
    /// Upper end of the interval.
    pub upper: f64,
}

impl Bracket {
    /// Default search range along a ray, in metres.
    pub const DEFAULT: Bracket = Bracket::new(0.0, 5.0);

    /// Range used inside the Rowland circle, short enough to exclude the
    /// far side of the detector cylinder.
    pub const ROWLAND: Bracket = Bracket::new(0.0, 2.1);

    /// Creates a new bracket.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Width of the interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        (self.upper - self.lower).abs()
    }
}

impl Default for Bracket {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Derivative-free bracketed root finder (Brent's method).
///
/// Thin configuration layer over [`roots::find_root_brent`]. The search
/// stops once the bracket is narrower than `tolerance` or the residual is
/// exactly zero.
#[derive(Debug, Clone, Copy)]
pub struct BrentSolver {
    bracket: Bracket,
    tolerance: f64,
    max_iterations: usize,
}

impl BrentSolver {
    /// Absolute bracket-width tolerance used by default.
    pub const DEFAULT_TOLERANCE: f64 = 1e-14;

    /// Iteration budget used by default.
    pub const DEFAULT_MAX_ITERATIONS: usize = 100;

    /// Creates a solver over `bracket` with the default tolerance and budget.
    #[must_use]
    pub fn new(bracket: Bracket) -> Self {
        Self {
            bracket,
            tolerance: Self::DEFAULT_TOLERANCE,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Overrides the search interval.
    #[must_use]
    pub fn with_bracket(mut self, bracket: Bracket) -> Self {
        self.bracket = bracket;
        self
    }

    /// Overrides the absolute tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Overrides the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Finds a root of `f` inside the bracket.
    ///
    /// # Errors
    ///
    /// - [`SolverError::RootNotBracketed`] if `f` has the same sign at both ends.
    /// - [`SolverError::NonFiniteResidual`] if `f` returns NaN or infinity.
    /// - [`SolverError::MaxIterationsExceeded`] if the iteration budget runs out.
    pub fn solve<F>(&self, mut f: F) -> Result<f64, SolverError>
    where
        F: FnMut(f64) -> f64,
    {
        let Bracket { lower, upper } = self.bracket;
        let f_lower = f(lower);
        if !f_lower.is_finite() {
            return Err(SolverError::NonFiniteResidual { t: lower });
        }
        let f_upper = f(upper);
        if !f_upper.is_finite() {
            return Err(SolverError::NonFiniteResidual { t: upper });
        }

        let mut non_finite: Option<f64> = None;
        let mut width = IntervalWidth {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            last_width: (upper - lower).abs(),
        };
        let result = find_root_brent(
            lower,
            upper,
            |t| {
                let value = f(t);
                if !value.is_finite() && non_finite.is_none() {
                    non_finite = Some(t);
                }
                value
            },
            &mut width,
        );

        if let Some(t) = non_finite {
            return Err(SolverError::NonFiniteResidual { t });
        }
        result.map_err(|e| match e {
            SearchError::NoBracketing => SolverError::RootNotBracketed {
                lower,
                upper,
                f_lower,
                f_upper,
            },
            SearchError::NoConvergency | SearchError::ZeroDerivative => {
                SolverError::MaxIterationsExceeded {
                    iterations: self.max_iterations,
                    width: width.last_width,
                }
            }
        })
    }
}

/// Absolute interval-width stopping rule.
struct IntervalWidth {
    tolerance: f64,
    max_iterations: usize,
    last_width: f64,
}

impl Convergency<f64> for IntervalWidth {
    #[allow(clippy::float_cmp)]
    fn is_root_found(&mut self, y: f64) -> bool {
        y == 0.0
    }

    fn is_converged(&mut self, x1: f64, x2: f64) -> bool {
        self.last_width = (x1 - x2).abs();
        self.last_width < self.tolerance
    }

    fn is_iteration_limit_reached(&mut self, iter: usize) -> bool {
        iter >= self.max_iterations
    }
}
