//! Unsteady flow routing over a space-time grid
//!
//! # Architecture
//!
//! Routing separates three concerns, mirroring the steady solvers:
//!
//! 1. **Boundary conditions** ([`BoundaryConditions`]) — WHAT drives the run:
//!    the upstream inflow hydrograph and the downstream condition.
//! 2. **Configuration** ([`RouteConfig`]) — HOW the run is discretized:
//!    grid resolution, baseflow, gravity, and the update scheme.
//! 3. **The scheme** ([`RoutingScheme`]) — the finite-difference update rule.
//!    Schemes are a closed enum dispatched by branch, not a trait-object
//!    hierarchy: the set of update rules is fixed and each one is a plain
//!    function from one grid row to the next.
//!
//! # Time marching
//!
//! The march is a fold over timesteps: row `k = 0` is the uniform steady
//! state at `baseflow` (via the normal-depth solver), and each row `k + 1` is
//! computed entirely from row `k`. The time axis is inherently sequential;
//! within one step the per-node updates of the dynamic schemes are
//! independent and are parallelized across nodes when the `parallel` feature
//! is enabled and the grid is wide enough (see
//! [`parallel_threshold`](crate::solver::parallel_threshold)).
//!
//! A routing run owns its grid exclusively until it returns; completed rows
//! are the only observable state, so caller-initiated early termination
//! (see [`Router::route_with`]) can never expose a half-written row.
//!
//! # Stability
//!
//! All three schemes are explicit and conditionally stable (Courant
//! condition). The kinematic scheme checks its Courant number every step and
//! rejects violations as configuration errors; the dynamic schemes surface
//! mid-run blowups as [`ChannelError::Stability`] with the offending node and
//! step, aborting before NaNs can propagate.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::channel::ChannelGeometry;
use crate::error::ChannelError;
use crate::sampler::{sample_nodes, sample_steps, MonitorSpec, NodeSeries, ProfileSnapshot};
use crate::solver::depth::normal_depth;
use crate::solver::roots::NewtonRaphson;

mod kinematic;
mod lax;
mod maccormack;

// =================================================================================================
// Scheme selection
// =================================================================================================

/// Finite-difference update rule used to advance the grid one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingScheme {
    /// Kinematic wave: upwind continuity with the `S0 = Sf` closure; depth is
    /// a function of discharge through Manning's equation at every node.
    KinematicWave,
    /// Dynamic wave, Lax diffusive scheme: full continuity + momentum with
    /// spatial averaging for stability.
    LaxDiffusive,
    /// Dynamic wave, MacCormack predictor-corrector. Recommended default for
    /// the accuracy/stability trade-off.
    MacCormack,
}

impl RoutingScheme {
    /// Human-readable scheme name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            RoutingScheme::KinematicWave => "kinematic wave",
            RoutingScheme::LaxDiffusive => "dynamic wave (Lax diffusive)",
            RoutingScheme::MacCormack => "dynamic wave (MacCormack)",
        }
    }
}

// =================================================================================================
// Configuration
// =================================================================================================

/// Grid and physics configuration of one routing run.
#[derive(Debug, Clone, Copy)]
pub struct RouteConfig {
    /// Gravitational acceleration, consistent with the channel's unit system.
    pub gravity: f64,
    /// Steady discharge filling the channel at `k = 0`.
    pub baseflow: f64,
    /// Time step `Δt`.
    pub time_step: f64,
    /// Space step `Δx`.
    pub space_step: f64,
    /// Number of spatial nodes; node 0 is the upstream boundary.
    pub num_nodes: usize,
    /// Update rule.
    pub scheme: RoutingScheme,
}

impl RouteConfig {
    /// Create a routing configuration.
    pub fn new(
        gravity: f64,
        baseflow: f64,
        time_step: f64,
        space_step: f64,
        num_nodes: usize,
        scheme: RoutingScheme,
    ) -> Self {
        Self { gravity, baseflow, time_step, space_step, num_nodes, scheme }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if !self.gravity.is_finite() || self.gravity <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "gravitational acceleration must be positive, got {}",
                self.gravity
            )));
        }
        if !self.baseflow.is_finite() || self.baseflow <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "baseflow must be positive, got {}",
                self.baseflow
            )));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        if !self.space_step.is_finite() || self.space_step <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "space step must be positive, got {}",
                self.space_step
            )));
        }
        if self.num_nodes < 3 {
            return Err(ChannelError::configuration(format!(
                "routing needs at least 3 nodes, got {}",
                self.num_nodes
            )));
        }
        Ok(())
    }
}

// =================================================================================================
// Boundary conditions
// =================================================================================================

/// Condition applied at the last grid node.
#[derive(Debug, Clone, PartialEq)]
pub enum DownstreamBoundary {
    /// Free outflow: depth and discharge extrapolated with zero gradient
    /// from the adjacent interior node.
    ZeroGradient,
    /// Prescribed depth series, one value per timestep (same length as the
    /// inflow hydrograph). Discharge is extrapolated with zero gradient.
    Depth(Vec<f64>),
}

/// Driving data of one routing run.
#[derive(Debug, Clone)]
pub struct BoundaryConditions {
    /// Upstream inflow hydrograph `wave[k]`, one discharge per timestep
    /// including `k = 0`. Its length fixes the time horizon:
    /// `num_steps = wave.len() - 1`.
    pub inflow: Vec<f64>,
    /// Downstream condition.
    pub downstream: DownstreamBoundary,
}

impl BoundaryConditions {
    /// Hydrograph inflow with free outflow downstream.
    pub fn free_outflow(inflow: Vec<f64>) -> Self {
        Self { inflow, downstream: DownstreamBoundary::ZeroGradient }
    }

    /// Hydrograph inflow with a prescribed downstream depth series.
    pub fn with_downstream_depth(inflow: Vec<f64>, depths: Vec<f64>) -> Self {
        Self { inflow, downstream: DownstreamBoundary::Depth(depths) }
    }

    /// Number of timesteps the run will march.
    pub fn num_steps(&self) -> usize {
        self.inflow.len().saturating_sub(1)
    }

    /// Validate the boundary data.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.inflow.len() < 2 {
            return Err(ChannelError::configuration(
                "inflow hydrograph needs at least two entries (initial value plus one step)",
            ));
        }
        if let Some(bad) = self.inflow.iter().find(|q| !q.is_finite() || **q <= 0.0) {
            return Err(ChannelError::configuration(format!(
                "inflow hydrograph values must be positive and finite, got {bad}"
            )));
        }
        if let DownstreamBoundary::Depth(depths) = &self.downstream {
            if depths.len() != self.inflow.len() {
                return Err(ChannelError::configuration(format!(
                    "downstream depth series length {} must match hydrograph length {}",
                    depths.len(),
                    self.inflow.len()
                )));
            }
            if let Some(bad) = depths.iter().find(|y| !y.is_finite() || **y <= 0.0) {
                return Err(ChannelError::configuration(format!(
                    "downstream depths must be positive and finite, got {bad}"
                )));
            }
        }
        Ok(())
    }
}

// =================================================================================================
// Space-time grid
// =================================================================================================

/// Completed `(Q, y)` grid of one routing run.
///
/// Rows are timesteps (`k = 0` is the steady initial condition), columns are
/// nodes (`i = 0` is the upstream boundary). The grid is immutable once the
/// run returns; any number of samplers may read it concurrently.
#[derive(Debug, Clone)]
pub struct SpaceTimeGrid {
    discharge: DMatrix<f64>,
    depth: DMatrix<f64>,
    time_step: f64,
    space_step: f64,
}

impl SpaceTimeGrid {
    /// Number of spatial nodes.
    pub fn num_nodes(&self) -> usize {
        self.discharge.ncols()
    }

    /// Number of completed timesteps (the grid holds `num_steps() + 1` rows).
    pub fn num_steps(&self) -> usize {
        self.discharge.nrows() - 1
    }

    /// Discharge at `(step, node)`.
    pub fn discharge_at(&self, step: usize, node: usize) -> f64 {
        self.discharge[(step, node)]
    }

    /// Depth at `(step, node)`.
    pub fn depth_at(&self, step: usize, node: usize) -> f64 {
        self.depth[(step, node)]
    }

    /// Simulation time of a row.
    pub fn step_time(&self, step: usize) -> f64 {
        step as f64 * self.time_step
    }

    /// Downstream distance of a column.
    pub fn node_distance(&self, node: usize) -> f64 {
        node as f64 * self.space_step
    }

    /// Channel storage volume at one timestep, by trapezoidal integration of
    /// the flow area over the reach.
    pub fn storage(&self, channel: &ChannelGeometry, step: usize) -> Result<f64, ChannelError> {
        let n = self.num_nodes();
        let mut volume = 0.0;
        for node in 0..n {
            let area = channel.area(self.depth_at(step, node))?;
            let weight = if node == 0 || node == n - 1 { 0.5 } else { 1.0 };
            volume += weight * area * self.space_step;
        }
        Ok(volume)
    }
}

// =================================================================================================
// Routed result
// =================================================================================================

/// Result of one routing run: the full grid, the requested monitor
/// extractions, and diagnostic metadata.
#[derive(Debug, Clone)]
pub struct RoutedWave {
    /// The completed space-time grid.
    pub grid: SpaceTimeGrid,
    /// Time series at each monitored node.
    pub node_series: Vec<NodeSeries>,
    /// Spatial profile at each monitored timestep.
    pub snapshots: Vec<ProfileSnapshot>,
    /// Diagnostic key/value pairs (scheme, steps completed, max Courant).
    pub metadata: HashMap<String, String>,
}

impl RoutedWave {
    /// Attach a diagnostic key/value pair.
    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }
}

// =================================================================================================
// Per-step context shared by the schemes
// =================================================================================================

/// Everything an update rule needs besides the previous row.
pub(crate) struct StepContext<'a> {
    pub channel: &'a ChannelGeometry,
    pub gravity: f64,
    pub dt: f64,
    pub dx: f64,
    /// Index of the row being computed (for error context).
    pub step: usize,
}

impl StepContext<'_> {
    /// Momentum flux `Q²/A` at a node of the previous row.
    fn momentum_flux(&self, q: f64, area: f64) -> f64 {
        q * q / area
    }
}

/// Upstream depth for the dynamic schemes: the negative characteristic
/// invariant `J = V - 2 sqrt(gA/B)` is carried from the first interior node
/// of the previous row (with the friction/slope source applied over `Δt`)
/// and the new boundary depth solves
///
/// ```text
/// Q_up / A(y) - 2 sqrt(g A(y) / B(y)) = J
/// ```
///
/// with the grid's root finder. A failure here is a mid-run numerical
/// breakdown, surfaced as [`ChannelError::Stability`] at node 0.
pub(crate) fn upstream_dynamic_depth(
    ctx: &StepContext,
    prev_q: &DVector<f64>,
    prev_y: &DVector<f64>,
    upstream_q: f64,
) -> Result<f64, ChannelError> {
    let channel = ctx.channel;
    let g = ctx.gravity;

    let y1 = prev_y[1];
    let a1 = channel.area(y1)?;
    let b1 = channel.top_width(y1)?;
    let v1 = prev_q[1] / a1;
    let c1 = (g * a1 / b1).sqrt();
    let sf1 = channel.friction_slope(prev_q[1], y1)?;

    let invariant = v1 - 2.0 * c1 + g * ctx.dt * (channel.bed_slope - sf1);

    let newton = NewtonRaphson::standard();
    let solution = newton
        .solve(
            |y| match (channel.area(y), channel.top_width(y)) {
                (Ok(area), Ok(top)) => {
                    upstream_q / area - 2.0 * (g * area / top).sqrt() - invariant
                }
                _ => f64::NAN,
            },
            |y| match (channel.area(y), channel.top_width(y)) {
                (Ok(area), Ok(top)) => {
                    let celerity = (g * area / top).sqrt();
                    let d_top = 2.0 * channel.side_slope;
                    -upstream_q * top / (area * area)
                        - g * (top * top - d_top * area) / (top * top * celerity)
                }
                _ => f64::NAN,
            },
            prev_y[0],
        )
        .map_err(|err| ChannelError::Stability {
            node: 0,
            step: ctx.step,
            message: format!("upstream characteristic depth failed: {err}"),
        })?;

    Ok(solution.root)
}

/// Map a row-update over a node range, in parallel when the `parallel`
/// feature is enabled and the range is wider than the configured threshold.
///
/// Every update reads only the previous (immutable) row, so parallel and
/// serial execution produce identical results.
pub(crate) fn compute_nodes<F>(
    range: std::ops::Range<usize>,
    f: F,
) -> Result<Vec<(f64, f64)>, ChannelError>
where
    F: Fn(usize) -> Result<(f64, f64), ChannelError> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if range.len() > crate::solver::parallel_threshold() {
            return range.into_par_iter().map(&f).collect();
        }
    }
    range.map(f).collect()
}

/// Reject a freshly computed row containing non-physical values.
pub(crate) fn validate_row(
    ctx: &StepContext,
    q: &DVector<f64>,
    y: &DVector<f64>,
) -> Result<(), ChannelError> {
    for node in 0..q.len() {
        if !q[node].is_finite() {
            return Err(ChannelError::Stability {
                node,
                step: ctx.step,
                message: format!("non-finite discharge {}", q[node]),
            });
        }
        if !y[node].is_finite() || y[node] <= 0.0 {
            return Err(ChannelError::Stability {
                node,
                step: ctx.step,
                message: format!("non-physical depth {}", y[node]),
            });
        }
    }
    Ok(())
}

// =================================================================================================
// Router
// =================================================================================================

/// Time-marching driver owning one routing run.
///
/// # Examples
///
/// ```rust
/// use chan_rs::channel::ChannelGeometry;
/// use chan_rs::sampler::MonitorSpec;
/// use chan_rs::solver::routing::{
///     BoundaryConditions, RouteConfig, Router, RoutingScheme,
/// };
///
/// let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap();
/// let config = RouteConfig::new(32.2, 250.0, 25.0, 1000.0, 21, RoutingScheme::MacCormack);
///
/// // Two hours of steady inflow
/// let inflow = vec![250.0; 289];
/// let boundary = BoundaryConditions::free_outflow(inflow);
///
/// let router = Router::new(channel, config).unwrap();
/// let routed = router.route(&boundary, &MonitorSpec::none()).unwrap();
///
/// assert_eq!(routed.grid.num_steps(), 288);
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    channel: ChannelGeometry,
    config: RouteConfig,
}

impl Router {
    /// Create a router after validating the configuration.
    pub fn new(channel: ChannelGeometry, config: RouteConfig) -> Result<Self, ChannelError> {
        config.validate()?;
        if channel.bed_slope <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "routing requires a positive bed slope to establish baseflow, got {}",
                channel.bed_slope
            )));
        }
        Ok(Self { channel, config })
    }

    /// Route the full hydrograph.
    pub fn route(
        &self,
        boundary: &BoundaryConditions,
        monitors: &MonitorSpec,
    ) -> Result<RoutedWave, ChannelError> {
        self.route_with(boundary, monitors, |_| true)
    }

    /// Route with caller-controlled early termination.
    ///
    /// `control` is called with the index of the row about to be computed;
    /// returning `false` stops the march after the rows already completed.
    /// The returned grid is truncated to completed rows, so monitors
    /// referring to later timesteps are dropped (recorded in the metadata).
    pub fn route_with(
        &self,
        boundary: &BoundaryConditions,
        monitors: &MonitorSpec,
        mut control: impl FnMut(usize) -> bool,
    ) -> Result<RoutedWave, ChannelError> {
        // ====== Step 1: Validation ======

        boundary.validate()?;
        if self.config.scheme == RoutingScheme::KinematicWave
            && !matches!(boundary.downstream, DownstreamBoundary::ZeroGradient)
        {
            return Err(ChannelError::configuration(
                "the kinematic wave admits no downstream control; \
                 use a free-outflow downstream boundary",
            ));
        }

        let num_steps = boundary.num_steps();
        let num_nodes = self.config.num_nodes;

        // ====== Step 2: Steady initial condition ======

        let base_depth = normal_depth(&self.channel, self.config.baseflow, None)?;

        let mut discharge = DMatrix::zeros(num_steps + 1, num_nodes);
        let mut depth = DMatrix::zeros(num_steps + 1, num_nodes);
        for node in 0..num_nodes {
            discharge[(0, node)] = self.config.baseflow;
            depth[(0, node)] = base_depth;
        }

        let mut prev_q = DVector::from_element(num_nodes, self.config.baseflow);
        let mut prev_y = DVector::from_element(num_nodes, base_depth);

        // ====== Step 3: Time marching ======

        let mut completed = 0usize;
        let mut max_courant: f64 = 0.0;

        for step in 1..=num_steps {
            if !control(step) {
                break;
            }

            let ctx = StepContext {
                channel: &self.channel,
                gravity: self.config.gravity,
                dt: self.config.time_step,
                dx: self.config.space_step,
                step,
            };

            let upstream_q = boundary.inflow[step];
            let downstream_depth = match &boundary.downstream {
                DownstreamBoundary::ZeroGradient => None,
                DownstreamBoundary::Depth(series) => Some(series[step]),
            };

            let (new_q, new_y) = match self.config.scheme {
                RoutingScheme::KinematicWave => {
                    kinematic::advance(&ctx, &prev_q, &prev_y, upstream_q)?
                }
                RoutingScheme::LaxDiffusive => {
                    lax::advance(&ctx, &prev_q, &prev_y, upstream_q, downstream_depth)?
                }
                RoutingScheme::MacCormack => {
                    maccormack::advance(&ctx, &prev_q, &prev_y, upstream_q, downstream_depth)?
                }
            };

            validate_row(&ctx, &new_q, &new_y)?;
            max_courant = max_courant.max(self.row_courant(&new_q, &new_y)?);

            for node in 0..num_nodes {
                discharge[(step, node)] = new_q[node];
                depth[(step, node)] = new_y[node];
            }

            prev_q = new_q;
            prev_y = new_y;
            completed = step;
        }

        // ====== Step 4: Build result ======

        let rows = completed + 1;
        let grid = SpaceTimeGrid {
            discharge: discharge.rows(0, rows).into_owned(),
            depth: depth.rows(0, rows).into_owned(),
            time_step: self.config.time_step,
            space_step: self.config.space_step,
        };

        // Drop monitor timesteps the (possibly truncated) run never reached
        let reachable = MonitorSpec {
            nodes: monitors.nodes.clone(),
            steps: monitors.steps.iter().copied().filter(|s| *s <= completed).collect(),
        };

        let node_series = sample_nodes(&grid, &self.channel, self.config.gravity, &reachable)?;
        let snapshots = sample_steps(&grid, &self.channel, self.config.gravity, &reachable)?;

        let mut routed = RoutedWave {
            grid,
            node_series,
            snapshots,
            metadata: HashMap::new(),
        };
        routed.add_metadata("scheme", self.config.scheme.name());
        routed.add_metadata("steps completed", &completed.to_string());
        routed.add_metadata("steps requested", &num_steps.to_string());
        routed.add_metadata("time step", &self.config.time_step.to_string());
        routed.add_metadata("space step", &self.config.space_step.to_string());
        routed.add_metadata("max courant", &format!("{max_courant:.4}"));

        Ok(routed)
    }

    /// Dynamic Courant number `(|V| + sqrt(gA/B)) Δt / Δx` maximized over a
    /// row. Recorded as diagnostic metadata for every scheme.
    fn row_courant(&self, q: &DVector<f64>, y: &DVector<f64>) -> Result<f64, ChannelError> {
        let mut worst: f64 = 0.0;
        for node in 0..q.len() {
            let area = self.channel.area(y[node])?;
            let top = self.channel.top_width(y[node])?;
            let speed = (q[node] / area).abs() + (self.config.gravity * area / top).sqrt();
            worst = worst.max(speed * self.config.time_step / self.config.space_step);
        }
        Ok(worst)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
