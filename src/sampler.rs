//! Extraction of hydrograph and profile views from a routed space-time grid
//!
//! A routing run produces a dense grid of discharge and depth over every
//! node and timestep. Most callers only want two reduced views of it:
//!
//! - **Node series**: the full time history at a few stations, i.e. the
//!   routed hydrograph observed at those cross-sections.
//! - **Profile snapshots**: the full spatial water surface at a few
//!   instants, i.e. what the river looks like at those moments.
//!
//! Both views are enriched with the derived hydraulic quantities (flow
//! area, mean velocity, Froude number) so downstream analysis does not
//! have to repeat the geometry evaluation.

use nalgebra::DVector;

use crate::channel::{ChannelGeometry, FlowState};
use crate::error::ChannelError;
use crate::solver::routing::SpaceTimeGrid;

// =================================================================================================
// Monitor specification
// =================================================================================================

/// Which nodes and timesteps to extract from a routing run.
///
/// Indices refer to grid coordinates: node `0` is the upstream boundary,
/// step `0` is the initial condition. Requesting nothing is valid and
/// skips the extraction entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSpec {
    /// Node indices whose full time history should be extracted.
    pub nodes: Vec<usize>,
    /// Timestep indices whose full spatial profile should be extracted.
    pub steps: Vec<usize>,
}

impl MonitorSpec {
    /// Create a specification for the given nodes and timesteps.
    pub fn new(nodes: Vec<usize>, steps: Vec<usize>) -> Self {
        Self { nodes, steps }
    }

    /// Extract nothing; the caller only wants the grid itself.
    pub fn none() -> Self {
        Self::default()
    }
}

// =================================================================================================
// Extracted views
// =================================================================================================

/// Time history of the flow at a single node.
#[derive(Debug, Clone)]
pub struct NodeSeries {
    /// Grid node index.
    pub node: usize,
    /// Downstream distance of the node.
    pub distance: f64,
    /// Simulation time of each row.
    pub times: DVector<f64>,
    /// Discharge at each row.
    pub discharge: DVector<f64>,
    /// Flow depth at each row.
    pub depth: DVector<f64>,
    /// Mean velocity at each row.
    pub velocity: DVector<f64>,
    /// Froude number at each row.
    pub froude: DVector<f64>,
}

impl NodeSeries {
    /// Largest discharge in the series and the time at which it occurs.
    pub fn peak(&self) -> (f64, f64) {
        let mut peak_q = f64::NEG_INFINITY;
        let mut peak_t = 0.0;
        for i in 0..self.discharge.len() {
            if self.discharge[i] > peak_q {
                peak_q = self.discharge[i];
                peak_t = self.times[i];
            }
        }
        (peak_q, peak_t)
    }
}

/// Spatial water-surface profile at a single instant.
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    /// Grid timestep index.
    pub step: usize,
    /// Simulation time of the snapshot.
    pub time: f64,
    /// Downstream distance of each node.
    pub distances: DVector<f64>,
    /// Discharge at each node.
    pub discharge: DVector<f64>,
    /// Flow depth at each node.
    pub depth: DVector<f64>,
    /// Flow area at each node.
    pub area: DVector<f64>,
    /// Mean velocity at each node.
    pub velocity: DVector<f64>,
    /// Froude number at each node.
    pub froude: DVector<f64>,
}

// =================================================================================================
// Extraction
// =================================================================================================

/// Extract the time history at each monitored node.
///
/// Returns a `Configuration` error when a requested node index lies
/// outside the grid.
pub fn sample_nodes(
    grid: &SpaceTimeGrid,
    channel: &ChannelGeometry,
    gravity: f64,
    monitors: &MonitorSpec,
) -> Result<Vec<NodeSeries>, ChannelError> {
    let rows = grid.num_steps() + 1;
    let mut series = Vec::with_capacity(monitors.nodes.len());

    for &node in &monitors.nodes {
        if node >= grid.num_nodes() {
            return Err(ChannelError::configuration(format!(
                "monitored node {node} outside grid of {} nodes",
                grid.num_nodes()
            )));
        }

        let mut times = DVector::zeros(rows);
        let mut discharge = DVector::zeros(rows);
        let mut depth = DVector::zeros(rows);
        let mut velocity = DVector::zeros(rows);
        let mut froude = DVector::zeros(rows);

        for step in 0..rows {
            let q = grid.discharge_at(step, node);
            let y = grid.depth_at(step, node);
            let state = FlowState::derive(channel, q, y, gravity)?;
            times[step] = grid.step_time(step);
            discharge[step] = q;
            depth[step] = y;
            velocity[step] = state.velocity;
            froude[step] = state.froude;
        }

        series.push(NodeSeries {
            node,
            distance: grid.node_distance(node),
            times,
            discharge,
            depth,
            velocity,
            froude,
        });
    }

    Ok(series)
}

/// Extract the spatial profile at each monitored timestep.
///
/// Returns a `Configuration` error when a requested step index lies
/// outside the grid.
pub fn sample_steps(
    grid: &SpaceTimeGrid,
    channel: &ChannelGeometry,
    gravity: f64,
    monitors: &MonitorSpec,
) -> Result<Vec<ProfileSnapshot>, ChannelError> {
    let n = grid.num_nodes();
    let mut snapshots = Vec::with_capacity(monitors.steps.len());

    for &step in &monitors.steps {
        if step > grid.num_steps() {
            return Err(ChannelError::configuration(format!(
                "monitored step {step} outside grid of {} steps",
                grid.num_steps()
            )));
        }

        let mut distances = DVector::zeros(n);
        let mut discharge = DVector::zeros(n);
        let mut depth = DVector::zeros(n);
        let mut area = DVector::zeros(n);
        let mut velocity = DVector::zeros(n);
        let mut froude = DVector::zeros(n);

        for node in 0..n {
            let q = grid.discharge_at(step, node);
            let y = grid.depth_at(step, node);
            let state = FlowState::derive(channel, q, y, gravity)?;
            distances[node] = grid.node_distance(node);
            discharge[node] = q;
            depth[node] = y;
            area[node] = channel.area(y)?;
            velocity[node] = state.velocity;
            froude[node] = state.froude;
        }

        snapshots.push(ProfileSnapshot {
            step,
            time: grid.step_time(step),
            distances,
            discharge,
            depth,
            area,
            velocity,
            froude,
        });
    }

    Ok(snapshots)
}

// =================================================================================================
// Tests
// =================================================================================================
