//! Damped Newton-Raphson root finder
//!
//! # Mathematical Background
//!
//! Every nonlinear solve in this crate (normal depth, critical depth, the
//! per-step energy balance of the profile integrator, the characteristic
//! boundary of the dynamic-wave schemes) reduces to a scalar root problem
//! `f(y) = 0` with an analytically known derivative. The iteration is:
//!
//! ```text
//! y_{k+1} = y_k - f(y_k) / f'(y_k)
//! ```
//!
//! # Damping
//!
//! Hydraulic unknowns are depths, which must stay positive. A raw Newton step
//! can overshoot into `y <= 0`; when that happens the step is halved until the
//! iterate is physically valid again. This is an algorithmic safeguard, not
//! error suppression: a step that cannot be damped back into the domain is a
//! convergence failure.
//!
//! # Characteristics
//!
//! - Quadratic convergence near a simple root
//! - Deterministic: identical inputs give bit-identical iterates
//! - Stateless: one instance can serve any number of concurrent solves

use crate::error::ChannelError;

/// Maximum number of step halvings before a damped step is declared failed.
const MAX_DAMPING_HALVINGS: usize = 32;

// =================================================================================================
// Newton-Raphson Solver
// =================================================================================================

/// Generic damped Newton-Raphson iterator over a function/derivative pair.
///
/// # Examples
///
/// ```rust
/// use chan_rs::solver::NewtonRaphson;
///
/// // Solve y² = 2 starting from 1.0
/// let newton = NewtonRaphson::new(1e-12, 50).unwrap();
/// let solution = newton.solve(|y| y * y - 2.0, |y| 2.0 * y, 1.0).unwrap();
///
/// assert!((solution.root - 2.0f64.sqrt()).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NewtonRaphson {
    /// Absolute tolerance on both the residual and the iterate update.
    pub tolerance: f64,
    /// Iteration budget.
    pub max_iterations: usize,
}

/// Converged root together with the work it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolution {
    /// The converged iterate.
    pub root: f64,
    /// Iterations consumed, counting the final accepted one.
    pub iterations: usize,
}

impl NewtonRaphson {
    /// Create a solver with the given tolerance and iteration budget.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Configuration`] when `tolerance <= 0` or
    /// `max_iterations == 0`.
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self, ChannelError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "Newton-Raphson tolerance must be positive, got {tolerance}"
            )));
        }
        if max_iterations == 0 {
            return Err(ChannelError::configuration(
                "Newton-Raphson iteration budget must be at least 1",
            ));
        }
        Ok(Self { tolerance, max_iterations })
    }

    /// Default solver used by the depth and profile solvers: `1e-9` absolute
    /// tolerance, 100 iterations.
    pub fn standard() -> Self {
        Self { tolerance: 1e-9, max_iterations: 100 }
    }

    /// Find a positive root of `f` starting from `guess > 0`.
    ///
    /// Succeeds when `|f(y)| < tolerance` or `|Δy| < tolerance`.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Domain`] when the initial guess is not positive
    /// - [`ChannelError::Convergence`] when the iteration budget is exceeded,
    ///   the derivative degenerates, or a step cannot be damped back into
    ///   `y > 0`
    pub fn solve<F, D>(&self, f: F, df: D, guess: f64) -> Result<NewtonSolution, ChannelError>
    where
        F: Fn(f64) -> f64,
        D: Fn(f64) -> f64,
    {
        if !guess.is_finite() || guess <= 0.0 {
            return Err(ChannelError::domain("initial guess must be positive", guess));
        }

        let mut y = guess;

        for iteration in 1..=self.max_iterations {
            let residual = f(y);

            if !residual.is_finite() {
                return Err(ChannelError::Convergence {
                    iterations: iteration,
                    message: "residual became non-finite".to_string(),
                    last_iterate: y,
                });
            }

            if residual.abs() < self.tolerance {
                return Ok(NewtonSolution { root: y, iterations: iteration });
            }

            let slope = df(y);
            if !slope.is_finite() || slope.abs() < f64::EPSILON {
                return Err(ChannelError::Convergence {
                    iterations: iteration,
                    message: format!("derivative degenerated to {slope}"),
                    last_iterate: y,
                });
            }

            // Full Newton step, halved until the iterate is physically valid
            let mut step = residual / slope;
            let mut next = y - step;
            let mut halvings = 0;
            while next <= 0.0 {
                if halvings == MAX_DAMPING_HALVINGS {
                    return Err(ChannelError::Convergence {
                        iterations: iteration,
                        message: "damped step could not stay in y > 0".to_string(),
                        last_iterate: y,
                    });
                }
                step *= 0.5;
                next = y - step;
                halvings += 1;
            }

            if (next - y).abs() < self.tolerance {
                return Ok(NewtonSolution { root: next, iterations: iteration });
            }

            y = next;
        }

        Err(ChannelError::Convergence {
            iterations: self.max_iterations,
            message: "iteration budget exceeded".to_string(),
            last_iterate: y,
        })
    }
}

// =================================================================================================
// Tests
// =================================================================================================
