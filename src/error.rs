//! Error taxonomy for the solver stack
//!
//! # Design Philosophy
//!
//! Every failure mode a caller can hit maps to exactly one variant, and every
//! variant carries enough context (last valid value, iteration or step count,
//! grid position) to diagnose the run without re-executing it:
//!
//! - [`ChannelError::Domain`] — non-physical geometric input (depth ≤ 0,
//!   negative width). The computation never started.
//! - [`ChannelError::Configuration`] — the setup is inapplicable (zero or
//!   adverse slope for a normal-depth solve, a Courant-violating grid).
//! - [`ChannelError::Convergence`] — the root finder ran out of iterations or
//!   hit a degenerate slope.
//! - [`ChannelError::Divergence`] — the standard-step profile crossed critical
//!   flow or lost depth; the method does not apply past that station.
//! - [`ChannelError::Stability`] — an explicit routing scheme produced a
//!   non-physical state mid-run. The run aborts rather than propagate NaNs.
//!
//! No variant is ever downgraded to a default value; partial results are never
//! returned as if complete.

use thiserror::Error;

/// Failure modes of the hydraulic solver stack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// Non-physical geometric input.
    #[error("domain error: {message} (got {value})")]
    Domain {
        /// What was violated.
        message: String,
        /// The offending input value.
        value: f64,
    },

    /// Physically inapplicable setup.
    #[error("configuration error: {message}")]
    Configuration {
        /// Why the configuration cannot be solved.
        message: String,
    },

    /// Newton-Raphson failed to converge.
    #[error(
        "convergence error after {iterations} iterations: {message} \
         (last iterate {last_iterate})"
    )]
    Convergence {
        /// Iterations consumed before giving up.
        iterations: usize,
        /// Degeneracy or budget description.
        message: String,
        /// Last physically valid iterate, for restarting with a better guess.
        last_iterate: f64,
    },

    /// Standard-step profile cannot continue.
    #[error(
        "divergence error at station {station} (step {step}): {message}. \
         The standard-step method does not apply across a hydraulic jump"
    )]
    Divergence {
        /// Station of the last accepted profile point.
        station: f64,
        /// Number of accepted steps before the failure.
        step: usize,
        /// What was detected (regime crossing, vanishing depth).
        message: String,
    },

    /// Explicit routing scheme produced a non-physical state.
    #[error(
        "stability error at node {node}, timestep {step}: {message}. \
         This indicates a Courant-violating time/space resolution; \
         reduce the time step or coarsen the spatial grid"
    )]
    Stability {
        /// Grid node where the first non-physical value appeared.
        node: usize,
        /// Timestep being computed when the run aborted.
        step: usize,
        /// Offending quantity description.
        message: String,
    },
}

impl ChannelError {
    /// Shorthand for a [`ChannelError::Domain`] value.
    pub fn domain(message: impl Into<String>, value: f64) -> Self {
        ChannelError::Domain { message: message.into(), value }
    }

    /// Shorthand for a [`ChannelError::Configuration`] value.
    pub fn configuration(message: impl Into<String>) -> Self {
        ChannelError::Configuration { message: message.into() }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
