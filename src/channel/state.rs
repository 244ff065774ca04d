//! Derived flow state at a single section
//!
//! A [`FlowState`] is a value snapshot: it is created per solver call or per
//! grid node and never shared mutably across solves.

use crate::channel::geometry::ChannelGeometry;
use crate::error::ChannelError;

// =================================================================================================
// Flow Regime
// =================================================================================================

/// Flow regime classification by Froude number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRegime {
    /// `Fr < 1`: gravity-dominated, downstream control.
    Subcritical,
    /// `Fr ≈ 1`: minimum specific energy.
    Critical,
    /// `Fr > 1`: inertia-dominated, upstream control.
    Supercritical,
}

// =================================================================================================
// Flow State
// =================================================================================================

/// Hydraulic state of one section: discharge, depth and the quantities
/// derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowState {
    /// Discharge `Q`.
    pub discharge: f64,
    /// Flow depth `y`.
    pub depth: f64,
    /// Mean velocity `V = Q / A(y)`.
    pub velocity: f64,
    /// Froude number `Fr = V / sqrt(g A / B)`.
    pub froude: f64,
}

impl FlowState {
    /// Derive the full state from `(Q, y)` for a given section and gravity.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Domain`] for a non-positive depth.
    pub fn derive(
        channel: &ChannelGeometry,
        discharge: f64,
        depth: f64,
        gravity: f64,
    ) -> Result<Self, ChannelError> {
        let area = channel.area(depth)?;
        let top = channel.top_width(depth)?;
        let velocity = discharge / area;
        let froude = velocity / (gravity * area / top).sqrt();

        Ok(Self { discharge, depth, velocity, froude })
    }

    /// Specific energy `E = y + V² / 2g`.
    pub fn specific_energy(&self, gravity: f64) -> f64 {
        self.depth + self.velocity * self.velocity / (2.0 * gravity)
    }

    /// Classify the regime; depths within `tolerance` of `Fr = 1` count as
    /// critical.
    pub fn regime(&self, tolerance: f64) -> FlowRegime {
        if (self.froude.abs() - 1.0).abs() < tolerance {
            FlowRegime::Critical
        } else if self.froude.abs() < 1.0 {
            FlowRegime::Subcritical
        } else {
            FlowRegime::Supercritical
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
