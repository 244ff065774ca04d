//! Prismatic cross-section geometry
//!
//! # Mathematical Background
//!
//! All computations assume a trapezoidal prismatic section with bottom width
//! `w` and side slope `m` (horizontal run per unit rise). As functions of the
//! flow depth `y`:
//!
//! ```text
//! A(y) = y (w + m y)            cross-section area
//! B(y) = w + 2 m y              top width, == dA/dy
//! P(y) = w + 2 y sqrt(1 + m²)   wetted perimeter
//! R(y) = A / P                  hydraulic radius
//! ```
//!
//! Rectangular (`m = 0`) and triangular (`w = 0`) sections are the two
//! degenerate trapezoids and need no special casing.
//!
//! Manning's equation ties the geometry to a steady discharge:
//!
//! ```text
//! Q = (Cm / n) A R^(2/3) sqrt(S0)
//! ```
//!
//! where `n` is the roughness coefficient, `S0` the bed slope and `Cm` the
//! unit-system constant (1.0 metric, 1.486 US customary). No unit conversion
//! happens anywhere in this crate; all inputs must share one unit system.
//!
//! # Invariants
//!
//! - `y > 0` implies `A(y) > 0` (enforced at construction: `w + m > 0`)
//! - `A`, `B`, `P`, `R` are strictly increasing in `y`
//!
//! Everything here is a pure function of `y`; the struct is immutable and
//! safe to share across any number of concurrent solvers.

use crate::error::ChannelError;

// =================================================================================================
// Channel Geometry
// =================================================================================================

/// Immutable description of a prismatic channel.
///
/// Combines the trapezoidal section (`width`, `side_slope`) with the hydraulic
/// parameters every solver needs (`bed_slope`, `roughness`, `conveyance_coefficient`).
///
/// # Examples
///
/// ```rust
/// use chan_rs::channel::ChannelGeometry;
///
/// // 100 ft wide rectangular channel, US customary units
/// let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap();
///
/// let area = channel.area(2.0).unwrap();
/// assert!((area - 200.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelGeometry {
    /// Bottom width `w` (length units), `>= 0`.
    pub width: f64,

    /// Side slope `m` as horizontal:vertical run per unit rise, `>= 0`.
    pub side_slope: f64,

    /// Bed slope `S0` (dimensionless drop per unit length).
    pub bed_slope: f64,

    /// Manning roughness coefficient `n`, `> 0`.
    pub roughness: f64,

    /// Unit-system constant `Cm`: 1.0 for SI, 1.486 for US customary.
    pub conveyance_coefficient: f64,
}

impl ChannelGeometry {
    /// Create a validated channel geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Domain`] when `width < 0`, `side_slope < 0`,
    /// `roughness <= 0`, `conveyance_coefficient <= 0`, or when both `width`
    /// and `side_slope` are zero (the section would have no area at any depth).
    pub fn new(
        width: f64,
        side_slope: f64,
        bed_slope: f64,
        roughness: f64,
        conveyance_coefficient: f64,
    ) -> Result<Self, ChannelError> {
        if !width.is_finite() || width < 0.0 {
            return Err(ChannelError::domain("bottom width must be non-negative", width));
        }
        if !side_slope.is_finite() || side_slope < 0.0 {
            return Err(ChannelError::domain("side slope must be non-negative", side_slope));
        }
        if width == 0.0 && side_slope == 0.0 {
            return Err(ChannelError::domain(
                "section needs a positive width or side slope to carry flow",
                0.0,
            ));
        }
        if !roughness.is_finite() || roughness <= 0.0 {
            return Err(ChannelError::domain("Manning roughness must be positive", roughness));
        }
        if !conveyance_coefficient.is_finite() || conveyance_coefficient <= 0.0 {
            return Err(ChannelError::domain(
                "unit-system constant Cm must be positive",
                conveyance_coefficient,
            ));
        }
        if !bed_slope.is_finite() {
            return Err(ChannelError::domain("bed slope must be finite", bed_slope));
        }

        Ok(Self {
            width,
            side_slope,
            bed_slope,
            roughness,
            conveyance_coefficient,
        })
    }

    /// Reject non-positive or non-finite depths before any hydraulic formula
    /// touches them.
    fn check_depth(&self, depth: f64) -> Result<(), ChannelError> {
        if !depth.is_finite() || depth <= 0.0 {
            return Err(ChannelError::domain("flow depth must be positive", depth));
        }
        Ok(())
    }

    // ====================================== Section properties ======================================

    /// Cross-section area `A(y) = y (w + m y)`.
    pub fn area(&self, depth: f64) -> Result<f64, ChannelError> {
        self.check_depth(depth)?;
        Ok(depth * (self.width + self.side_slope * depth))
    }

    /// Top width `B(y) = w + 2 m y`, which is also `dA/dy`.
    pub fn top_width(&self, depth: f64) -> Result<f64, ChannelError> {
        self.check_depth(depth)?;
        Ok(self.width + 2.0 * self.side_slope * depth)
    }

    /// Wetted perimeter `P(y) = w + 2 y sqrt(1 + m²)`.
    pub fn wetted_perimeter(&self, depth: f64) -> Result<f64, ChannelError> {
        self.check_depth(depth)?;
        Ok(self.width + 2.0 * depth * (1.0 + self.side_slope.powi(2)).sqrt())
    }

    /// Hydraulic radius `R(y) = A / P`.
    pub fn hydraulic_radius(&self, depth: f64) -> Result<f64, ChannelError> {
        Ok(self.area(depth)? / self.wetted_perimeter(depth)?)
    }

    /// Derivative of the wetted perimeter, `dP/dy = 2 sqrt(1 + m²)`.
    ///
    /// Constant in `y` for a prismatic trapezoid.
    pub fn d_wetted_perimeter(&self) -> f64 {
        2.0 * (1.0 + self.side_slope.powi(2)).sqrt()
    }

    /// Derivative of the hydraulic radius, `dR/dy = (B P - A P') / P²`.
    pub fn d_hydraulic_radius(&self, depth: f64) -> Result<f64, ChannelError> {
        let area = self.area(depth)?;
        let top = self.top_width(depth)?;
        let perimeter = self.wetted_perimeter(depth)?;
        Ok((top * perimeter - area * self.d_wetted_perimeter()) / perimeter.powi(2))
    }

    /// Invert `A(y) = y (w + m y)` for the depth.
    ///
    /// Used by the dynamic-wave schemes, which march the conserved area and
    /// recover depth afterwards.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Domain`] when `area <= 0` or not finite.
    pub fn depth_from_area(&self, area: f64) -> Result<f64, ChannelError> {
        if !area.is_finite() || area <= 0.0 {
            return Err(ChannelError::domain("flow area must be positive", area));
        }
        if self.side_slope == 0.0 {
            // Rectangular: A = w y
            return Ok(area / self.width);
        }
        // Positive root of m y² + w y - A = 0
        let w = self.width;
        let m = self.side_slope;
        Ok((-w + (w * w + 4.0 * m * area).sqrt()) / (2.0 * m))
    }

    // ====================================== Manning relations ======================================

    /// Conveyance `K(y) = (Cm / n) A R^(2/3)`, so that `Q = K sqrt(S0)`.
    pub fn conveyance(&self, depth: f64) -> Result<f64, ChannelError> {
        let area = self.area(depth)?;
        let radius = self.hydraulic_radius(depth)?;
        Ok(self.conveyance_coefficient / self.roughness * area * radius.powf(2.0 / 3.0))
    }

    /// Derivative of the conveyance,
    /// `dK/dy = (Cm / n) (B R^(2/3) + (2/3) A R^(-1/3) R')`.
    pub fn d_conveyance(&self, depth: f64) -> Result<f64, ChannelError> {
        let area = self.area(depth)?;
        let top = self.top_width(depth)?;
        let radius = self.hydraulic_radius(depth)?;
        let d_radius = self.d_hydraulic_radius(depth)?;
        Ok(self.conveyance_coefficient / self.roughness
            * (top * radius.powf(2.0 / 3.0)
                + area * (2.0 / 3.0) * radius.powf(-1.0 / 3.0) * d_radius))
    }

    /// Steady Manning discharge `Q(y) = (Cm / n) A R^(2/3) sqrt(S0)`.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Configuration`] when the bed slope is zero or adverse;
    /// Manning's equation has no solution there.
    pub fn manning_discharge(&self, depth: f64) -> Result<f64, ChannelError> {
        if self.bed_slope <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "Manning's equation requires a positive bed slope, got {}",
                self.bed_slope
            )));
        }
        Ok(self.conveyance(depth)? * self.bed_slope.sqrt())
    }

    /// Friction slope `Sf(Q, y) = n² Q² / (Cm² A² R^(4/3))`.
    pub fn friction_slope(&self, discharge: f64, depth: f64) -> Result<f64, ChannelError> {
        let area = self.area(depth)?;
        let radius = self.hydraulic_radius(depth)?;
        let n = self.roughness;
        let cm = self.conveyance_coefficient;
        Ok(n * n * discharge * discharge / (cm * cm * area * area * radius.powf(4.0 / 3.0)))
    }

    /// Derivative of the friction slope at fixed discharge.
    ///
    /// `Sf ∝ P^(4/3) A^(-10/3)`, hence
    /// `dSf/dy = Sf ((4/3) P'/P - (10/3) B/A)`.
    pub fn d_friction_slope(&self, discharge: f64, depth: f64) -> Result<f64, ChannelError> {
        let sf = self.friction_slope(discharge, depth)?;
        let area = self.area(depth)?;
        let top = self.top_width(depth)?;
        let perimeter = self.wetted_perimeter(depth)?;
        Ok(sf * ((4.0 / 3.0) * self.d_wetted_perimeter() / perimeter - (10.0 / 3.0) * top / area))
    }

    /// Kinematic wave celerity `c = dQ/dA = (dK/dy sqrt(S0)) / B` at a given depth.
    ///
    /// This is the signal speed that bounds the Courant number of the
    /// kinematic-wave scheme.
    pub fn kinematic_celerity(&self, depth: f64) -> Result<f64, ChannelError> {
        if self.bed_slope <= 0.0 {
            return Err(ChannelError::configuration(format!(
                "kinematic celerity requires a positive bed slope, got {}",
                self.bed_slope
            )));
        }
        let top = self.top_width(depth)?;
        Ok(self.d_conveyance(depth)? * self.bed_slope.sqrt() / top)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangular() -> ChannelGeometry {
        ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap()
    }

    fn trapezoidal() -> ChannelGeometry {
        ChannelGeometry::new(6.1, 1.5, 0.002, 0.025, 1.0).unwrap()
    }

    // ====== Construction ======

    #[test]
    fn test_negative_width_rejected() {
        let result = ChannelGeometry::new(-1.0, 0.0, 0.001, 0.045, 1.486);
        assert!(matches!(result, Err(ChannelError::Domain { .. })));
    }

    #[test]
    fn test_negative_side_slope_rejected() {
        let result = ChannelGeometry::new(10.0, -0.5, 0.001, 0.045, 1.486);
        assert!(matches!(result, Err(ChannelError::Domain { .. })));
    }

    #[test]
    fn test_zero_roughness_rejected() {
        let result = ChannelGeometry::new(10.0, 0.0, 0.001, 0.0, 1.486);
        assert!(matches!(result, Err(ChannelError::Domain { .. })));
    }

    #[test]
    fn test_degenerate_section_rejected() {
        // Zero width and zero side slope cannot carry flow at any depth
        let result = ChannelGeometry::new(0.0, 0.0, 0.001, 0.045, 1.486);
        assert!(matches!(result, Err(ChannelError::Domain { .. })));
    }

    #[test]
    fn test_triangular_section_allowed() {
        let channel = ChannelGeometry::new(0.0, 2.0, 0.001, 0.03, 1.0).unwrap();
        assert_relative_eq!(channel.area(1.5).unwrap(), 4.5, epsilon = 1e-12);
    }

    // ====== Section properties ======

    #[test]
    fn test_rectangular_properties() {
        let channel = rectangular();
        let y = 2.0;

        assert_relative_eq!(channel.area(y).unwrap(), 200.0, epsilon = 1e-12);
        assert_relative_eq!(channel.top_width(y).unwrap(), 100.0, epsilon = 1e-12);
        assert_relative_eq!(channel.wetted_perimeter(y).unwrap(), 104.0, epsilon = 1e-12);
        assert_relative_eq!(channel.hydraulic_radius(y).unwrap(), 200.0 / 104.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trapezoidal_properties() {
        let channel = trapezoidal();
        let y = 1.2;

        // A = y (w + m y) = 1.2 (6.1 + 1.5 * 1.2)
        assert_relative_eq!(channel.area(y).unwrap(), 1.2 * (6.1 + 1.8), epsilon = 1e-12);
        // B = w + 2 m y
        assert_relative_eq!(channel.top_width(y).unwrap(), 6.1 + 3.6, epsilon = 1e-12);
        // P = w + 2 y sqrt(1 + m²)
        let expected_p = 6.1 + 2.4 * (1.0f64 + 2.25).sqrt();
        assert_relative_eq!(channel.wetted_perimeter(y).unwrap(), expected_p, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let channel = rectangular();
        assert!(channel.area(0.0).is_err());
        assert!(channel.hydraulic_radius(-1.0).is_err());
        assert!(channel.friction_slope(10.0, f64::NAN).is_err());
    }

    // ====== Invariants ======

    #[test]
    fn test_properties_strictly_increasing() {
        // A, B, P, R must be strictly increasing in y for any valid section
        for channel in [rectangular(), trapezoidal()] {
            let depths: Vec<f64> = (1..200).map(|i| i as f64 * 0.05).collect();
            for pair in depths.windows(2) {
                let (lo, hi) = (pair[0], pair[1]);
                assert!(channel.area(hi).unwrap() > channel.area(lo).unwrap());
                assert!(channel.top_width(hi).unwrap() >= channel.top_width(lo).unwrap());
                assert!(
                    channel.wetted_perimeter(hi).unwrap() > channel.wetted_perimeter(lo).unwrap()
                );
                assert!(
                    channel.hydraulic_radius(hi).unwrap() > channel.hydraulic_radius(lo).unwrap()
                );
            }
        }
    }

    // ====== Derivatives ======

    #[test]
    fn test_hydraulic_radius_derivative_matches_finite_difference() {
        let channel = trapezoidal();
        let y = 0.9;
        let h = 1e-6;

        let numeric = (channel.hydraulic_radius(y + h).unwrap()
            - channel.hydraulic_radius(y - h).unwrap())
            / (2.0 * h);
        let analytic = channel.d_hydraulic_radius(y).unwrap();

        assert_relative_eq!(analytic, numeric, epsilon = 1e-6);
    }

    #[test]
    fn test_conveyance_derivative_matches_finite_difference() {
        let channel = rectangular();
        let y = 2.5;
        let h = 1e-6;

        let numeric =
            (channel.conveyance(y + h).unwrap() - channel.conveyance(y - h).unwrap()) / (2.0 * h);
        let analytic = channel.d_conveyance(y).unwrap();

        assert_relative_eq!(analytic, numeric, max_relative = 1e-6);
    }

    #[test]
    fn test_friction_slope_derivative_matches_finite_difference() {
        let channel = trapezoidal();
        let q = 30.0;
        let y = 1.4;
        let h = 1e-6;

        let numeric = (channel.friction_slope(q, y + h).unwrap()
            - channel.friction_slope(q, y - h).unwrap())
            / (2.0 * h);
        let analytic = channel.d_friction_slope(q, y).unwrap();

        assert_relative_eq!(analytic, numeric, max_relative = 1e-5);
    }

    // ====== Inversion and Manning relations ======

    #[test]
    fn test_depth_from_area_round_trip() {
        for channel in [rectangular(), trapezoidal()] {
            for y in [0.1, 0.75, 2.0, 6.3] {
                let area = channel.area(y).unwrap();
                assert_relative_eq!(channel.depth_from_area(area).unwrap(), y, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_manning_discharge_zero_slope_is_configuration_error() {
        let channel = ChannelGeometry::new(10.0, 0.0, 0.0, 0.03, 1.0).unwrap();
        assert!(matches!(
            channel.manning_discharge(1.0),
            Err(ChannelError::Configuration { .. })
        ));
    }

    #[test]
    fn test_friction_slope_equals_bed_slope_at_normal_flow() {
        // At the depth satisfying Manning's equation, Sf == S0 by definition
        let channel = rectangular();
        let y = 1.71;
        let q = channel.manning_discharge(y).unwrap();
        let sf = channel.friction_slope(q, y).unwrap();
        assert_relative_eq!(sf, channel.bed_slope, max_relative = 1e-10);
    }

    #[test]
    fn test_kinematic_celerity_near_wide_channel_limit() {
        // For a very wide rectangular channel, c -> (5/3) V
        let channel = ChannelGeometry::new(1000.0, 0.0, 0.001, 0.03, 1.0).unwrap();
        let y = 1.0;
        let q = channel.manning_discharge(y).unwrap();
        let velocity = q / channel.area(y).unwrap();
        let celerity = channel.kinematic_celerity(y).unwrap();
        assert_relative_eq!(celerity, 5.0 / 3.0 * velocity, max_relative = 1e-2);
    }
}
