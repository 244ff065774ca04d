//! End-to-end tour of the crate: steady reference depths, a backwater
//! profile, and a routed flood wave on the same channel.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example quickstart
//! ```

use chan_rs::channel::ChannelGeometry;
use chan_rs::error::ChannelError;
use chan_rs::sampler::MonitorSpec;
use chan_rs::solver::routing::{BoundaryConditions, RouteConfig, Router, RoutingScheme};
use chan_rs::solver::{compute_profile, critical_depth, normal_depth, MarchDirection, ProfileConfig};

const GRAVITY: f64 = 32.2;

fn main() -> Result<(), ChannelError> {
    // 100 ft wide rectangular channel, mild slope, US customary units
    let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486)?;
    let discharge = 250.0;

    // ====== Steady reference depths ======

    let yn = normal_depth(&channel, discharge, None)?;
    let yc = critical_depth(&channel, discharge, GRAVITY, None)?;
    println!("Steady state at {discharge} cfs:");
    println!("  normal depth   {yn:.3} ft");
    println!("  critical depth {yc:.3} ft  (mild slope: yn > yc)");

    // ====== Backwater profile ======

    // A downstream control 3 ft above normal depth, marched upstream
    let config = ProfileConfig::new(100.0, 20_000.0, MarchDirection::Upstream);
    let profile = compute_profile(&channel, discharge, yn + 3.0, GRAVITY, &config)?;
    let last = profile.points.last().unwrap();
    println!("\nM1 backwater over {} stations:", profile.len());
    println!("  control depth  {:.3} ft", profile.points[0].y);
    println!("  depth at {:.0} ft upstream: {:.3} ft (normal {yn:.3})", last.x, last.y);

    // ====== Flood-wave routing ======

    // Cosine wave from baseflow to 1000 cfs and back over five hours
    let dt = 25.0;
    let num_steps = 1200;
    let inflow: Vec<f64> = (0..=num_steps)
        .map(|k| {
            let t = k as f64 * dt;
            if t <= 18_000.0 {
                250.0 + 375.0 * (1.0 - (std::f64::consts::PI * t / 9000.0).cos())
            } else {
                250.0
            }
        })
        .collect();

    let route = RouteConfig::new(GRAVITY, discharge, dt, 1000.0, 21, RoutingScheme::MacCormack);
    let boundary = BoundaryConditions::free_outflow(inflow);
    let router = Router::new(channel, route)?;

    // Monitor the inlet and the outlet, snapshot the profile near the peak
    let monitors = MonitorSpec::new(vec![0, 20], vec![360]);
    let routed = router.route(&boundary, &monitors)?;

    println!("\nRouted {} steps with {}:", routed.grid.num_steps(), route.scheme.name());
    for series in &routed.node_series {
        let (peak_q, peak_t) = series.peak();
        println!(
            "  node {:2} ({:6.0} ft): peak {peak_q:7.1} cfs at t = {peak_t:6.0} s",
            series.node, series.distance
        );
    }

    let snapshot = &routed.snapshots[0];
    println!("\nWater surface at t = {:.0} s:", snapshot.time);
    for node in (0..21).step_by(5) {
        println!(
            "  x = {:6.0} ft   Q = {:7.1} cfs   y = {:.3} ft",
            snapshot.distances[node], snapshot.discharge[node], snapshot.depth[node]
        );
    }

    println!("\nmax Courant number: {}", routed.metadata["max courant"]);
    Ok(())
}
