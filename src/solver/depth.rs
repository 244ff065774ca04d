//! Normal and critical depth solvers
//!
//! # Mathematical Background
//!
//! **Normal depth** balances gravity against friction for a steady discharge,
//! i.e. it is the root of Manning's equation:
//!
//! ```text
//! f(y) = (Cm/n) A(y) R(y)^(2/3) sqrt(S0) - Q = 0
//! ```
//!
//! It only exists on a positive bed slope; a zero or adverse `S0` is rejected
//! as a configuration error rather than iterated on.
//!
//! **Critical depth** minimises the specific energy, equivalently `Fr = 1`:
//!
//! ```text
//! f(y) = 1 - (Q²/g) B(y) / A(y)³ = 0
//! ```
//!
//! Both residuals have analytic derivatives supplied by
//! [`ChannelGeometry`](crate::channel::ChannelGeometry), so plain Newton
//! iteration converges quadratically from the default guesses:
//!
//! - normal depth: wide-channel approximation `(Q n / (Cm w sqrt(S0)))^(3/5)`
//! - critical depth: rectangular closed form `(q²/g)^(1/3)` with `q = Q/w`
//!
//! Callers with better information (e.g. the previous timestep's depth during
//! routing) pass their own guess and typically converge in two or three
//! iterations.

use crate::channel::ChannelGeometry;
use crate::error::ChannelError;
use crate::solver::roots::NewtonRaphson;

// =================================================================================================
// Initial guesses
// =================================================================================================

/// Wide-channel starting guess for the normal depth solve.
///
/// For a wide rectangle `A R^(2/3) ≈ w y^(5/3)`, giving
/// `y ≈ (Q n / (Cm w sqrt(S0)))^(3/5)`. Triangular sections (`w = 0`) use the
/// analogous `Q ∝ y^(8/3)` inversion.
pub fn normal_depth_guess(channel: &ChannelGeometry, discharge: f64) -> f64 {
    let k = channel.conveyance_coefficient / channel.roughness * channel.bed_slope.sqrt();
    if channel.width > 0.0 {
        (discharge / (k * channel.width)).powf(3.0 / 5.0)
    } else {
        (discharge / (k * channel.side_slope)).powf(3.0 / 8.0)
    }
}

/// Rectangular closed-form starting guess for the critical depth solve,
/// `(q²/g)^(1/3)`. Exact when `m = 0`; triangular sections use the
/// `A³/B = Q²/g` inversion instead.
pub fn critical_depth_guess(channel: &ChannelGeometry, discharge: f64, gravity: f64) -> f64 {
    if channel.width > 0.0 {
        let unit_discharge = discharge / channel.width;
        (unit_discharge * unit_discharge / gravity).powf(1.0 / 3.0)
    } else {
        (2.0 * discharge * discharge / (gravity * channel.side_slope.powi(2))).powf(1.0 / 5.0)
    }
}

// =================================================================================================
// Depth solvers
// =================================================================================================

/// Solve Manning's equation for the normal depth of `discharge`.
///
/// `yopt` overrides the default wide-channel starting guess.
///
/// # Errors
///
/// - [`ChannelError::Configuration`] when the bed slope is zero or adverse
///   (no normal depth exists) or the discharge is not positive
/// - [`ChannelError::Convergence`] when Newton iteration fails
///
/// # Examples
///
/// ```rust
/// use chan_rs::channel::ChannelGeometry;
/// use chan_rs::solver::normal_depth;
///
/// let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap();
/// let yn = normal_depth(&channel, 250.0, None).unwrap();
///
/// // Substituting back reproduces the discharge
/// let q = channel.manning_discharge(yn).unwrap();
/// assert!((q - 250.0).abs() < 1e-6);
/// ```
pub fn normal_depth(
    channel: &ChannelGeometry,
    discharge: f64,
    yopt: Option<f64>,
) -> Result<f64, ChannelError> {
    if channel.bed_slope <= 0.0 {
        return Err(ChannelError::configuration(format!(
            "normal depth is undefined on a zero or adverse bed slope (S0 = {})",
            channel.bed_slope
        )));
    }
    if !discharge.is_finite() || discharge <= 0.0 {
        return Err(ChannelError::configuration(format!(
            "normal depth requires a positive discharge, got {discharge}"
        )));
    }

    let sqrt_slope = channel.bed_slope.sqrt();
    let guess = yopt.unwrap_or_else(|| normal_depth_guess(channel, discharge));

    let newton = NewtonRaphson::standard();
    let solution = newton.solve(
        |y| match channel.conveyance(y) {
            Ok(k) => k * sqrt_slope - discharge,
            Err(_) => f64::NAN,
        },
        |y| match channel.d_conveyance(y) {
            Ok(dk) => dk * sqrt_slope,
            Err(_) => f64::NAN,
        },
        guess,
    )?;

    Ok(solution.root)
}

/// Solve `Fr = 1` for the critical depth of `discharge`.
///
/// `yopt` overrides the default rectangular closed-form starting guess.
///
/// # Errors
///
/// - [`ChannelError::Configuration`] for a non-positive discharge or gravity
/// - [`ChannelError::Convergence`] when Newton iteration fails
pub fn critical_depth(
    channel: &ChannelGeometry,
    discharge: f64,
    gravity: f64,
    yopt: Option<f64>,
) -> Result<f64, ChannelError> {
    if !discharge.is_finite() || discharge <= 0.0 {
        return Err(ChannelError::configuration(format!(
            "critical depth requires a positive discharge, got {discharge}"
        )));
    }
    if !gravity.is_finite() || gravity <= 0.0 {
        return Err(ChannelError::configuration(format!(
            "gravitational acceleration must be positive, got {gravity}"
        )));
    }

    let q2_over_g = discharge * discharge / gravity;
    let guess = yopt.unwrap_or_else(|| critical_depth_guess(channel, discharge, gravity));

    // f(y)  = 1 - (Q²/g) B / A³
    // f'(y) = (Q²/g) (3 B² / A⁴ - B' / A³),  with B' = 2m and A' = B
    let newton = NewtonRaphson::standard();
    let solution = newton.solve(
        |y| {
            match (channel.area(y), channel.top_width(y)) {
                (Ok(area), Ok(top)) => 1.0 - q2_over_g * top / area.powi(3),
                _ => f64::NAN,
            }
        },
        |y| {
            match (channel.area(y), channel.top_width(y)) {
                (Ok(area), Ok(top)) => {
                    let d_top = 2.0 * channel.side_slope;
                    q2_over_g * (3.0 * top * top / area.powi(4) - d_top / area.powi(3))
                }
                _ => f64::NAN,
            }
        },
        guess,
    )?;

    Ok(solution.root)
}

// =================================================================================================
// Tests
// =================================================================================================
