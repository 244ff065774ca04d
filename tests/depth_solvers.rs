//! Integration tests for the steady-state depth solvers
//!
//! Normal and critical depth are checked against closed-form solutions
//! where those exist and against the defining flow conditions everywhere
//! else: a normal depth must reproduce its discharge through the Manning
//! relation, and a critical depth must sit at unit Froude number.

mod common;

use approx::assert_relative_eq;
use chan_rs::channel::{ChannelGeometry, FlowRegime, FlowState};
use chan_rs::solver::{critical_depth, normal_depth};
use common::{rectangular_channel, trapezoidal_channel, triangular_channel, CM_US, GRAVITY};

// ====== Normal depth ======

#[test]
fn test_normal_depth_reproduces_manning_discharge() {
    for channel in [rectangular_channel(), trapezoidal_channel(), triangular_channel()] {
        for discharge in [5.0, 50.0, 250.0, 1000.0] {
            let yn = normal_depth(&channel, discharge, None).unwrap();
            let recovered = channel.manning_discharge(yn).unwrap();
            assert_relative_eq!(recovered, discharge, max_relative = 1e-9);
        }
    }
}

#[test]
fn test_normal_depth_friction_slope_equals_bed_slope() {
    let channel = rectangular_channel();
    let yn = normal_depth(&channel, 250.0, None).unwrap();
    let sf = channel.friction_slope(250.0, yn).unwrap();
    assert_relative_eq!(sf, channel.bed_slope, max_relative = 1e-9);
}

#[test]
fn test_normal_depth_increases_with_discharge() {
    let channel = trapezoidal_channel();
    let mut previous = 0.0;
    for discharge in [10.0, 30.0, 100.0, 300.0, 1000.0] {
        let yn = normal_depth(&channel, discharge, None).unwrap();
        assert!(yn > previous);
        previous = yn;
    }
}

#[test]
fn test_normal_depth_insensitive_to_initial_guess() {
    let channel = rectangular_channel();
    let from_default = normal_depth(&channel, 250.0, None).unwrap();
    for guess in [0.01, 0.5, 5.0, 50.0] {
        let from_guess = normal_depth(&channel, 250.0, Some(guess)).unwrap();
        assert_relative_eq!(from_guess, from_default, max_relative = 1e-9);
    }
}

// ====== Critical depth ======

#[test]
fn test_critical_depth_rectangular_closed_form() {
    // Rectangular: yc = (q^2 / g)^(1/3) with q = Q / w
    let channel = rectangular_channel();
    let discharge = 250.0;
    let unit_q = discharge / 100.0;
    let expected = (unit_q * unit_q / GRAVITY).cbrt();

    let yc = critical_depth(&channel, discharge, GRAVITY, None).unwrap();
    assert_relative_eq!(yc, expected, max_relative = 1e-9);
}

#[test]
fn test_critical_depth_is_unit_froude() {
    for channel in [rectangular_channel(), trapezoidal_channel(), triangular_channel()] {
        for discharge in [10.0, 100.0, 600.0] {
            let yc = critical_depth(&channel, discharge, GRAVITY, None).unwrap();
            let state = FlowState::derive(&channel, discharge, yc, GRAVITY).unwrap();
            assert_relative_eq!(state.froude, 1.0, max_relative = 1e-9);
            assert_eq!(state.regime(1e-6), FlowRegime::Critical);
        }
    }
}

#[test]
fn test_critical_depth_independent_of_roughness_and_slope() {
    // The critical condition involves only geometry and gravity
    let a = ChannelGeometry::new(30.0, 1.0, 0.001, 0.045, CM_US).unwrap();
    let b = ChannelGeometry::new(30.0, 1.0, 0.02, 0.012, CM_US).unwrap();

    let yc_a = critical_depth(&a, 400.0, GRAVITY, None).unwrap();
    let yc_b = critical_depth(&b, 400.0, GRAVITY, None).unwrap();
    assert_relative_eq!(yc_a, yc_b, max_relative = 1e-9);
}

// ====== Regime classification ======

#[test]
fn test_mild_slope_channel_is_subcritical_at_normal_depth() {
    let channel = rectangular_channel();
    let discharge = 250.0;

    let yn = normal_depth(&channel, discharge, None).unwrap();
    let yc = critical_depth(&channel, discharge, GRAVITY, None).unwrap();
    assert!(yn > yc);

    let state = FlowState::derive(&channel, discharge, yn, GRAVITY).unwrap();
    assert_eq!(state.regime(1e-6), FlowRegime::Subcritical);
}

#[test]
fn test_steep_slope_channel_is_supercritical_at_normal_depth() {
    let channel = ChannelGeometry::new(100.0, 0.0, 0.05, 0.012, CM_US).unwrap();
    let discharge = 250.0;

    let yn = normal_depth(&channel, discharge, None).unwrap();
    let yc = critical_depth(&channel, discharge, GRAVITY, None).unwrap();
    assert!(yn < yc);

    let state = FlowState::derive(&channel, discharge, yn, GRAVITY).unwrap();
    assert_eq!(state.regime(1e-6), FlowRegime::Supercritical);
}
