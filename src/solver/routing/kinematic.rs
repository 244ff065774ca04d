//! Kinematic wave update rule
//!
//! # Mathematical Background
//!
//! The kinematic wave drops the inertia and pressure terms of the momentum
//! equation, leaving the closure `S0 = Sf`: depth is a function of discharge
//! through Manning's equation at every node and step. Continuity then
//! reduces to an advection equation for the discharge,
//!
//! ```text
//! ∂Q/∂t + c ∂Q/∂x = 0,    c = dQ/dA
//! ```
//!
//! discretized with explicit upwind differences (the kinematic wave only
//! travels downstream, so the upwind side is always `i - 1`):
//!
//! ```text
//! Q[k+1][i] = Q[k][i] - (c_i Δt/Δx) (Q[k][i] - Q[k][i-1])
//! ```
//!
//! The new depth at each node is recovered by a normal-depth solve seeded
//! with the node's previous depth, which converges in a couple of
//! iterations.
//!
//! # Stability
//!
//! The scheme is stable for Courant numbers `c Δt/Δx ≤ 1`. The Courant
//! number is checked against the local celerity at every node and step;
//! a violation is rejected as a configuration error rather than allowed to
//! corrupt the run.
//!
//! # Boundaries
//!
//! Node 0 takes the prescribed inflow discharge exactly. There is no
//! downstream control: the last node is updated by the same upwind rule,
//! and the router rejects prescribed downstream conditions for this scheme.

use nalgebra::DVector;

use crate::error::ChannelError;
use crate::solver::depth::normal_depth;
use crate::solver::routing::{compute_nodes, StepContext};

/// Advance one timestep with the kinematic wave scheme.
pub(crate) fn advance(
    ctx: &StepContext,
    prev_q: &DVector<f64>,
    prev_y: &DVector<f64>,
    upstream_q: f64,
) -> Result<(DVector<f64>, DVector<f64>), ChannelError> {
    let channel = ctx.channel;
    let n = prev_q.len();

    // ====== Upstream boundary ======

    let q0 = upstream_q;
    let y0 = normal_depth(channel, q0, Some(prev_y[0]))?;

    // ====== Upwind interior update ======
    //
    // Each node reads only the previous row, so the updates are independent
    // and run in parallel on wide grids.

    let updated = compute_nodes(1..n, |i| {
        let celerity = channel.kinematic_celerity(prev_y[i])?;
        let courant = celerity * ctx.dt / ctx.dx;
        if courant > 1.0 {
            return Err(ChannelError::configuration(format!(
                "kinematic Courant number {courant:.3} exceeds 1 at node {i}, step {}; \
                 reduce the time step or coarsen the grid",
                ctx.step
            )));
        }

        let q = prev_q[i] - courant * (prev_q[i] - prev_q[i - 1]);
        let y = normal_depth(channel, q, Some(prev_y[i]))?;
        Ok((q, y))
    })?;

    let mut new_q = DVector::zeros(n);
    let mut new_y = DVector::zeros(n);
    new_q[0] = q0;
    new_y[0] = y0;
    for (offset, (q, y)) in updated.into_iter().enumerate() {
        new_q[offset + 1] = q;
        new_y[offset + 1] = y;
    }

    Ok((new_q, new_y))
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelGeometry;
    use approx::assert_relative_eq;

    fn context(channel: &ChannelGeometry, dt: f64, dx: f64) -> StepContext<'_> {
        StepContext { channel, gravity: 32.2, dt, dx, step: 1 }
    }

    fn us_rectangular() -> ChannelGeometry {
        ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap()
    }

    #[test]
    fn test_uniform_row_is_fixed_point() {
        let channel = us_rectangular();
        let yn = normal_depth(&channel, 250.0, None).unwrap();
        let prev_q = DVector::from_element(9, 250.0);
        let prev_y = DVector::from_element(9, yn);

        let ctx = context(&channel, 25.0, 1000.0);
        let (q, y) = advance(&ctx, &prev_q, &prev_y, 250.0).unwrap();

        for i in 0..9 {
            assert_relative_eq!(q[i], 250.0, epsilon = 1e-9);
            assert_relative_eq!(y[i], yn, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_inflow_forced_exactly() {
        let channel = us_rectangular();
        let yn = normal_depth(&channel, 250.0, None).unwrap();
        let prev_q = DVector::from_element(9, 250.0);
        let prev_y = DVector::from_element(9, yn);

        let ctx = context(&channel, 25.0, 1000.0);
        let (q, _) = advance(&ctx, &prev_q, &prev_y, 400.0).unwrap();

        assert_eq!(q[0], 400.0);
        // The pulse has not reached the interior after a single step
        assert_relative_eq!(q[1], 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_courant_violation_is_configuration_error() {
        let channel = us_rectangular();
        let yn = normal_depth(&channel, 250.0, None).unwrap();
        let prev_q = DVector::from_element(9, 250.0);
        let prev_y = DVector::from_element(9, yn);

        // dt huge relative to dx: celerity * dt / dx >> 1
        let ctx = context(&channel, 5000.0, 100.0);
        assert!(matches!(
            advance(&ctx, &prev_q, &prev_y, 250.0),
            Err(ChannelError::Configuration { .. })
        ));
    }

    #[test]
    fn test_depth_tracks_discharge_through_manning() {
        let channel = us_rectangular();
        let yn = normal_depth(&channel, 250.0, None).unwrap();
        // A rising limb already inside the reach
        let prev_q = DVector::from_vec(vec![500.0, 400.0, 300.0, 250.0, 250.0]);
        let prev_y = DVector::from_fn(5, |i, _| {
            normal_depth(&channel, prev_q[i], Some(yn)).unwrap()
        });

        let ctx = context(&channel, 25.0, 1000.0);
        let (q, y) = advance(&ctx, &prev_q, &prev_y, 550.0).unwrap();

        // Every depth satisfies Manning's equation for its own discharge
        for i in 0..5 {
            assert_relative_eq!(
                channel.manning_discharge(y[i]).unwrap(),
                q[i],
                max_relative = 1e-7
            );
        }
        // The wave advects downstream: node 1 discharge rises
        assert!(q[1] > prev_q[1]);
    }
}
