//! Channel description and per-section hydraulic state
//!
//! This module is the physics layer of the crate: it defines WHAT is being
//! solved (the cross-section relations), while [`crate::solver`] provides the
//! numerical methods (HOW to solve).
//!
//! - [`geometry`]: prismatic cross-section properties and Manning relations
//! - [`state`]: derived per-section flow state (velocity, Froude, energy)
//!
//! All types here are immutable values; nothing in this module carries solver
//! state.

pub mod geometry;
pub mod state;

pub use geometry::ChannelGeometry;
pub use state::{FlowRegime, FlowState};
