//! Standard-step gradually-varied-flow profile integrator
//!
//! # Mathematical Background
//!
//! The steady water-surface profile is computed by marching along the reach in
//! fixed steps of length `Δx` and solving an energy balance between the last
//! accepted section (the *control*) and the next one (the *target*):
//!
//! ```text
//! z_t + y_t + V_t²/2g  =  z_c + y_c + V_c²/2g + Sf_avg Δx
//! ```
//!
//! with the bed offset `z_t = z_c ± S0 Δx` and the friction loss charged
//! through the averaged slope `Sf_avg = (Sf_control + Sf(y_iterate)) / 2`.
//! Each step is one scalar Newton solve; the accepted target becomes the new
//! control, so the whole profile is a fold over the step sequence. The
//! sign convention (head loss added when marching upstream, subtracted when
//! marching downstream) is fixed here and recorded in DESIGN.md.
//!
//! # Applicability
//!
//! The standard-step method cannot march across a hydraulic jump. The
//! integrator watches the Froude number of accepted sections and aborts with
//! [`ChannelError::Divergence`] when the regime crosses critical or the depth
//! collapses, reporting the last good station instead of silently continuing.

use std::collections::HashMap;

use crate::channel::{ChannelGeometry, FlowState};
use crate::error::ChannelError;
use crate::solver::roots::NewtonRaphson;

/// Depth below which a profile is considered to have run dry.
const MIN_PROFILE_DEPTH: f64 = 1e-8;

// =================================================================================================
// Configuration
// =================================================================================================

/// Direction the profile is marched in, relative to the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchDirection {
    /// March against the flow; bed elevation rises, head loss is added.
    /// This is the usual direction for subcritical (backwater) profiles,
    /// which are controlled from downstream.
    Upstream,
    /// March with the flow; bed elevation drops, head loss is subtracted.
    /// The usual direction for supercritical profiles.
    Downstream,
}

/// Step geometry of one profile computation.
#[derive(Debug, Clone, Copy)]
pub struct ProfileConfig {
    /// Length of one marching step `Δx`.
    pub step_distance: f64,
    /// Total reach length to cover.
    pub total_distance: f64,
    /// March direction.
    pub direction: MarchDirection,
}

impl ProfileConfig {
    /// Create a profile configuration.
    pub fn new(step_distance: f64, total_distance: f64, direction: MarchDirection) -> Self {
        Self { step_distance, total_distance, direction }
    }

    /// Number of marching steps, `floor(totaldist / stepdist)`.
    pub fn num_steps(&self) -> usize {
        (self.total_distance / self.step_distance) as usize
    }

    /// Validate step sizes.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if !self.step_distance.is_finite() || self.step_distance <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "step distance must be positive, got {}",
                self.step_distance
            )));
        }
        if !self.total_distance.is_finite() || self.total_distance < self.step_distance {
            return Err(ChannelError::configuration(format!(
                "total distance {} must cover at least one step of {}",
                self.total_distance, self.step_distance
            )));
        }
        Ok(())
    }
}

// =================================================================================================
// Results
// =================================================================================================

/// One accepted profile section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    /// Station: distance marched from the starting section.
    pub x: f64,
    /// Bed elevation relative to the starting section.
    pub z: f64,
    /// Flow depth.
    pub y: f64,
    /// Friction slope at this section.
    pub sf: f64,
}

/// Complete water-surface profile plus run metadata.
#[derive(Debug, Clone)]
pub struct WaterSurfaceProfile {
    /// Accepted sections in march order; the first entry is the seed section.
    pub points: Vec<ProfilePoint>,
    /// Diagnostic key/value pairs (solver name, step counts, direction).
    pub metadata: HashMap<String, String>,
}

impl WaterSurfaceProfile {
    /// Number of sections, including the seed.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the profile holds no sections.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Depth sequence in march order.
    pub fn depths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Attach a diagnostic key/value pair.
    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }
}

// =================================================================================================
// Integrator
// =================================================================================================

/// Compute a gradually-varied-flow profile by the standard-step method.
///
/// The profile is seeded with depth `y0` at station `x = 0` — typically the
/// normal or critical depth, or a user override when seeding a backwater or
/// drawdown curve — and marched `config.num_steps()` steps.
///
/// # Errors
///
/// - [`ChannelError::Configuration`] for invalid step sizes or discharge
/// - [`ChannelError::Domain`] for a non-positive seed depth
/// - [`ChannelError::Convergence`] when a step's energy balance fails to solve
/// - [`ChannelError::Divergence`] when the depth collapses or the flow regime
///   crosses critical (hydraulic jump); the error names the last good station
///
/// A failed run returns no partial profile.
///
/// # Examples
///
/// ```rust
/// use chan_rs::channel::ChannelGeometry;
/// use chan_rs::solver::{compute_profile, normal_depth, MarchDirection, ProfileConfig};
///
/// let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap();
/// let yn = normal_depth(&channel, 250.0, None).unwrap();
///
/// // Backwater curve: seed 20% above normal depth, march upstream
/// let config = ProfileConfig::new(50.0, 3000.0, MarchDirection::Upstream);
/// let profile = compute_profile(&channel, 250.0, 1.2 * yn, 32.2, &config).unwrap();
///
/// assert_eq!(profile.len(), 61);
/// ```
pub fn compute_profile(
    channel: &ChannelGeometry,
    discharge: f64,
    y0: f64,
    gravity: f64,
    config: &ProfileConfig,
) -> Result<WaterSurfaceProfile, ChannelError> {
    // ====== Step 1: Validation ======

    config.validate()?;
    if !discharge.is_finite() || discharge <= 0.0 {
        return Err(ChannelError::configuration(format!(
            "profile integration requires a positive discharge, got {discharge}"
        )));
    }
    if !gravity.is_finite() || gravity <= 0.0 {
        return Err(ChannelError::configuration(format!(
            "gravitational acceleration must be positive, got {gravity}"
        )));
    }

    // ====== Step 2: Seed section ======

    let seed_state = FlowState::derive(channel, discharge, y0, gravity)?;
    let seed_sf = channel.friction_slope(discharge, y0)?;

    let num_steps = config.num_steps();
    let dx = config.step_distance;
    // Head-loss / bed-offset sign: + when marching upstream, - downstream
    let sign = match config.direction {
        MarchDirection::Upstream => 1.0,
        MarchDirection::Downstream => -1.0,
    };

    let mut points = Vec::with_capacity(num_steps + 1);
    points.push(ProfilePoint { x: 0.0, z: 0.0, y: y0, sf: seed_sf });

    let mut control = seed_state;
    let mut control_z = 0.0;
    let newton = NewtonRaphson::standard();

    // ====== Step 3: Marching loop ======
    //
    // Each step solves the energy balance for the target depth, then promotes
    // the target to control. The recurrence is inherently sequential: no step
    // can start before the previous one is accepted.

    for step in 1..=num_steps {
        let control_energy = control.specific_energy(gravity);
        let control_sf = channel.friction_slope(discharge, control.depth)?;

        // Residual of the energy balance as a function of the target depth:
        //   F(y) = E(y) - E_c + sign * dx * (S0 - (Sf_c + Sf(y)) / 2)
        // and its derivative
        //   F'(y) = (1 - Fr²) - sign * dx/2 * dSf/dy
        let residual = |y: f64| -> f64 {
            let energy = match FlowState::derive(channel, discharge, y, gravity) {
                Ok(state) => state.specific_energy(gravity),
                Err(_) => return f64::NAN,
            };
            let sf = match channel.friction_slope(discharge, y) {
                Ok(sf) => sf,
                Err(_) => return f64::NAN,
            };
            energy - control_energy
                + sign * dx * (channel.bed_slope - 0.5 * (control_sf + sf))
        };
        let slope = |y: f64| -> f64 {
            let froude = match FlowState::derive(channel, discharge, y, gravity) {
                Ok(state) => state.froude,
                Err(_) => return f64::NAN,
            };
            let d_sf = match channel.d_friction_slope(discharge, y) {
                Ok(d) => d,
                Err(_) => return f64::NAN,
            };
            1.0 - froude * froude - sign * 0.5 * dx * d_sf
        };

        let solution = newton.solve(residual, slope, control.depth)?;
        let target_depth = solution.root;

        // ====== Divergence checks ======

        if target_depth < MIN_PROFILE_DEPTH {
            return Err(ChannelError::Divergence {
                station: control_x(&points),
                step,
                message: format!("depth collapsed to {target_depth}"),
            });
        }

        let target = FlowState::derive(channel, discharge, target_depth, gravity)?;

        // A sign change of (1 - Fr) between accepted sections means the
        // profile crossed critical flow, which the energy balance cannot
        // represent continuously.
        if (1.0 - control.froude) * (1.0 - target.froude) < 0.0 {
            return Err(ChannelError::Divergence {
                station: control_x(&points),
                step,
                message: format!(
                    "flow regime crossed critical (Froude {} -> {})",
                    control.froude, target.froude
                ),
            });
        }

        // ====== Accept ======

        let target_z = control_z + sign * channel.bed_slope * dx;
        let target_sf = channel.friction_slope(discharge, target_depth)?;
        points.push(ProfilePoint {
            x: step as f64 * dx,
            z: target_z,
            y: target_depth,
            sf: target_sf,
        });

        control = target;
        control_z = target_z;
    }

    // ====== Step 4: Build result ======

    let mut profile = WaterSurfaceProfile { points, metadata: HashMap::new() };
    profile.add_metadata("solver", "standard step");
    profile.add_metadata("steps", &num_steps.to_string());
    profile.add_metadata("step distance", &dx.to_string());
    profile.add_metadata(
        "direction",
        match config.direction {
            MarchDirection::Upstream => "upstream",
            MarchDirection::Downstream => "downstream",
        },
    );

    Ok(profile)
}

/// Station of the most recently accepted point.
fn control_x(points: &[ProfilePoint]) -> f64 {
    points.last().map(|p| p.x).unwrap_or(0.0)
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::depth::normal_depth;
    use approx::assert_relative_eq;

    fn us_rectangular() -> ChannelGeometry {
        ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(ProfileConfig::new(0.0, 100.0, MarchDirection::Upstream).validate().is_err());
        assert!(ProfileConfig::new(-5.0, 100.0, MarchDirection::Upstream).validate().is_err());
        assert!(ProfileConfig::new(200.0, 100.0, MarchDirection::Upstream).validate().is_err());
        assert!(ProfileConfig::new(50.0, 100.0, MarchDirection::Upstream).validate().is_ok());
    }

    #[test]
    fn test_uniform_flow_stays_at_normal_depth() {
        // Seeding exactly at normal depth must reproduce uniform flow:
        // every accepted section keeps the same depth
        let channel = us_rectangular();
        let q = 250.0;
        let yn = normal_depth(&channel, q, None).unwrap();

        let config = ProfileConfig::new(100.0, 5000.0, MarchDirection::Upstream);
        let profile = compute_profile(&channel, q, yn, 32.2, &config).unwrap();

        assert_eq!(profile.len(), 51);
        for point in &profile.points {
            assert_relative_eq!(point.y, yn, max_relative = 1e-7);
        }
    }

    #[test]
    fn test_backwater_profile_decreases_toward_normal_depth() {
        // M1 curve: seed above normal depth downstream, march upstream;
        // the depth must decrease monotonically and approach normal depth
        let channel = us_rectangular();
        let q = 250.0;
        let yn = normal_depth(&channel, q, None).unwrap();
        let y0 = 1.5 * yn;

        let config = ProfileConfig::new(100.0, 30_000.0, MarchDirection::Upstream);
        let profile = compute_profile(&channel, q, y0, 32.2, &config).unwrap();

        let depths = profile.depths();
        for pair in depths.windows(2) {
            assert!(pair[1] < pair[0] + 1e-8, "profile must flatten monotonically");
            assert!(pair[1] > yn - 1e-7, "profile must not undershoot normal depth");
        }

        // Far upstream the profile has essentially flattened onto yn
        let final_depth = *depths.last().unwrap();
        assert_relative_eq!(final_depth, yn, max_relative = 1e-3);
    }

    #[test]
    fn test_bed_elevation_follows_slope() {
        let channel = us_rectangular();
        let q = 250.0;
        let yn = normal_depth(&channel, q, None).unwrap();

        let config = ProfileConfig::new(50.0, 500.0, MarchDirection::Upstream);
        let profile = compute_profile(&channel, q, 1.1 * yn, 32.2, &config).unwrap();

        // Marching upstream on S0 = 0.001: z rises 0.05 per 50 ft step
        assert_relative_eq!(profile.points[1].z, 0.05, epsilon = 1e-12);
        assert_relative_eq!(profile.points.last().unwrap().z, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_metadata_recorded() {
        let channel = us_rectangular();
        let yn = normal_depth(&channel, 250.0, None).unwrap();
        let config = ProfileConfig::new(100.0, 1000.0, MarchDirection::Upstream);
        let profile = compute_profile(&channel, 250.0, yn, 32.2, &config).unwrap();

        assert_eq!(profile.metadata.get("solver"), Some(&"standard step".to_string()));
        assert_eq!(profile.metadata.get("steps"), Some(&"10".to_string()));
        assert_eq!(profile.metadata.get("direction"), Some(&"upstream".to_string()));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let channel = us_rectangular();
        let config = ProfileConfig::new(100.0, 1000.0, MarchDirection::Upstream);

        assert!(compute_profile(&channel, -1.0, 2.0, 32.2, &config).is_err());
        assert!(compute_profile(&channel, 250.0, 0.0, 32.2, &config).is_err());
        assert!(compute_profile(&channel, 250.0, 2.0, 0.0, &config).is_err());
    }

    #[test]
    fn test_idempotent() {
        let channel = us_rectangular();
        let yn = normal_depth(&channel, 250.0, None).unwrap();
        let config = ProfileConfig::new(100.0, 2000.0, MarchDirection::Upstream);

        let a = compute_profile(&channel, 250.0, 1.3 * yn, 32.2, &config).unwrap();
        let b = compute_profile(&channel, 250.0, 1.3 * yn, 32.2, &config).unwrap();

        for (pa, pb) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(pa.y.to_bits(), pb.y.to_bits());
        }
    }
}
