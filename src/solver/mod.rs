//! Numerical solvers
//!
//! This module provides the numerical machinery of the crate: a damped
//! Newton-Raphson root finder and the three solver families built on it.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! The solver architecture separates concerns into three layers:
//!
//! 1. **Channel** (`ChannelGeometry`) - WHAT is being solved
//!    - Cross-section relations (area, wetted perimeter, conveyance)
//!    - Their analytic depth derivatives
//!    - Physical validation
//!
//! 2. **Configuration** (`ProfileConfig`, `RouteConfig`) - HOW to solve
//!    - Step sizes, march direction, scheme selection
//!    - Validated before any computation starts
//!
//! 3. **Solver** - The numerical method
//!    - Scalar root finding ([`roots`])
//!    - Steady-state depth solutions ([`depth`])
//!    - Spatial integration ([`profile`]) and time marching ([`routing`])
//!
//! The channel never knows which solver is interrogating it, and a solver
//! never hard-codes a cross-section shape. The same router runs rectangular,
//! trapezoidal, and triangular channels unchanged.
//!
//! # Module Organization
//!
//! - **`roots`**: Damped Newton-Raphson iteration for scalar equations
//! - **`depth`**: Normal and critical depth from the Manning and critical
//!   flow conditions
//! - **`profile`**: Standard-step integration of gradually varied flow
//! - **`routing`**: Unsteady flood-wave routing with three explicit schemes
//!
//! # Quick Start Example
//!
//! ```rust
//! use chan_rs::channel::ChannelGeometry;
//! use chan_rs::solver::{critical_depth, normal_depth};
//!
//! let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap();
//!
//! let yn = normal_depth(&channel, 250.0, None).unwrap();
//! let yc = critical_depth(&channel, 250.0, 32.2, None).unwrap();
//!
//! // Mild slope: uniform flow is subcritical
//! assert!(yn > yc);
//! ```
//!
//! # Error Handling
//!
//! All solver entry points return `Result<T, ChannelError>`:
//!
//! - Invalid configuration (non-positive steps, too few nodes) is reported
//!   before any computation starts
//! - Newton failures carry the iteration count and last iterate
//! - Marching failures (`Divergence`, `Stability`) carry the station or
//!   node and timestep where the solution broke down

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod depth;
pub mod profile;
pub mod roots;
pub mod routing;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Deciding *when* to hand work off to Rayon is a numerical-execution concern,
// not a hydraulics concern, so it lives here rather than in channel/.
//
// The threshold is stored in an AtomicUsize so that it can be changed at
// runtime (useful in benchmarks and tests) without requiring a mutex on every
// interior-node sweep.  Relaxed ordering is sufficient: the value is a
// performance hint, not a synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of interior nodes above which a routing sweep switches to
/// parallel iteration.
///
/// The crossover is set at 1 000 nodes.  Below that point the overhead of
/// Rayon's thread-pool dispatch outweighs the per-node work of the explicit
/// update formulas.
const DEFAULT_PARALLEL_THRESHOLD: usize = 999;

/// Runtime-configurable parallel-execution threshold.
///
/// Read via [`parallel_threshold()`], written via [`set_parallel_threshold()`].
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// Routing sweeps use sequential iteration when a row contains fewer
/// interior nodes than this value, and switch to Rayon when it contains
/// more, provided the crate is compiled with the `parallel` feature.
///
/// # Example
///
/// ```rust
/// use chan_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`.  A zero-node threshold would force
/// parallel dispatch on every single-node sweep, which is never the
/// intended behaviour.
///
/// # Example
///
/// ```rust
/// use chan_rs::solver::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(2048);
/// assert_eq!(parallel_threshold(), 2048);
///
/// // Restore so other tests are not affected.
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that saves the current threshold on construction and restores
/// it on drop.
///
/// Only compiled in test builds.  Prevents one test from leaking a modified
/// threshold value into the next.
///
/// ```rust,ignore
/// let _guard = crate::solver::ThresholdGuard::save(50);
/// // threshold is now 50 …
/// // … and is automatically restored when _guard is dropped.
/// ```
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    /// Set the threshold to `new_value` and return a guard that will
    /// restore the previous value on drop.
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        // Bypass the public setter so that restoring to any value (including
        // the original default) never panics.
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use roots::{NewtonRaphson, NewtonSolution};

pub use depth::{critical_depth, critical_depth_guess, normal_depth, normal_depth_guess};

pub use profile::{
    compute_profile,
    MarchDirection,
    ProfileConfig,
    ProfilePoint,
    WaterSurfaceProfile,
};

pub use routing::{
    BoundaryConditions,
    DownstreamBoundary,
    RouteConfig,
    RoutedWave,
    Router,
    RoutingScheme,
    SpaceTimeGrid,
};

// =================================================================================================
// Tests
// =================================================================================================
