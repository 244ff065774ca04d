//! Shared helpers for integration tests
//!
//! Channels and hydrographs used across the integration suites. All
//! quantities are in US customary units (ft, s, cfs) with `Cm = 1.486`
//! and `g = 32.2`.

#![allow(dead_code)]

use chan_rs::channel::ChannelGeometry;

/// Gravitational acceleration in US customary units.
pub const GRAVITY: f64 = 32.2;

/// Manning conveyance coefficient in US customary units.
pub const CM_US: f64 = 1.486;

/// Wide rectangular test channel: 100 ft bottom, mild slope, rough bed.
pub fn rectangular_channel() -> ChannelGeometry {
    ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, CM_US).unwrap()
}

/// Trapezoidal test channel: 20 ft bottom, 2:1 banks.
pub fn trapezoidal_channel() -> ChannelGeometry {
    ChannelGeometry::new(20.0, 2.0, 0.0005, 0.03, CM_US).unwrap()
}

/// Triangular test channel: zero bottom width, 1.5:1 banks.
pub fn triangular_channel() -> ChannelGeometry {
    ChannelGeometry::new(0.0, 1.5, 0.002, 0.025, CM_US).unwrap()
}

/// Cosine flood wave rising from 250 cfs to a 1000 cfs peak at t = 9000 s
/// and returning to baseflow at t = 18000 s.
pub fn flood_wave_discharge(t: f64) -> f64 {
    if t <= 18_000.0 {
        250.0 + 375.0 * (1.0 - (std::f64::consts::PI * t / 9000.0).cos())
    } else {
        250.0
    }
}

/// Sample the flood wave at `num_steps + 1` instants spaced `dt` apart.
pub fn flood_wave(dt: f64, num_steps: usize) -> Vec<f64> {
    (0..=num_steps)
        .map(|k| flood_wave_discharge(k as f64 * dt))
        .collect()
}

/// Trapezoidal time integral of a discharge series sampled every `dt`.
pub fn discharge_volume(series: &[f64], dt: f64) -> f64 {
    let n = series.len();
    let mut volume = 0.0;
    for (i, q) in series.iter().enumerate() {
        let weight = if i == 0 || i == n - 1 { 0.5 } else { 1.0 };
        volume += weight * q * dt;
    }
    volume
}
