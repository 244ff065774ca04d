//! chan-rs: Open-Channel Flow Simulation Framework
//!
//! A library for steady and unsteady one-dimensional open-channel
//! hydraulics: prismatic cross-section geometry, normal and critical depth
//! solutions, gradually-varied-flow water surface profiles, and explicit
//! flood-wave routing. Built with Rust for performance and safety.
//!
//! # Architecture
//!
//! chan-rs is built on two core principles:
//!
//! 1. **Separation of Hydraulics and Numerics**
//!    - The channel defines the cross-section relations and their analytic
//!      derivatives (what to solve)
//!    - The solvers provide root finding, spatial marching, and time
//!      marching (how to solve)
//!
//! 2. **Validated Configuration**
//!    - Every geometry and solver configuration is checked before any
//!      computation starts
//!    - Failures during computation carry the station or node and timestep
//!      where the solution broke down
//!
//! # Quick Start
//!
//! ```rust
//! use chan_rs::channel::ChannelGeometry;
//! use chan_rs::sampler::MonitorSpec;
//! use chan_rs::solver::normal_depth;
//! use chan_rs::solver::routing::{
//!     BoundaryConditions, RouteConfig, Router, RoutingScheme,
//! };
//!
//! // 1. Describe the channel (US customary units, Cm = 1.486)
//! let channel = ChannelGeometry::new(100.0, 0.0, 0.001, 0.045, 1.486).unwrap();
//!
//! // 2. Steady reference state
//! let yn = normal_depth(&channel, 250.0, None).unwrap();
//! assert!(yn > 0.0);
//!
//! // 3. Route a half-hour of steady inflow over a 10 000 ft reach
//! let config = RouteConfig::new(32.2, 250.0, 25.0, 1000.0, 11, RoutingScheme::MacCormack);
//! let boundary = BoundaryConditions::free_outflow(vec![250.0; 73]);
//!
//! let router = Router::new(channel, config).unwrap();
//! let routed = router.route(&boundary, &MonitorSpec::new(vec![10], vec![])).unwrap();
//!
//! // 4. Access results
//! let outlet = &routed.node_series[0];
//! let (peak_q, _) = outlet.peak();
//! assert!((peak_q - 250.0).abs() < 1e-6);
//! ```
//!
//! # Modules
//!
//! - [`channel`]: Cross-section geometry and flow state
//! - [`solver`]: Root finding, depth solutions, profiles, routing
//! - [`sampler`]: Hydrograph and profile extraction from routed grids
//! - [`error`]: Crate-wide error type

// Core modules
pub mod channel;
pub mod error;
pub mod sampler;
pub mod solver;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //!
    //! use chan_rs::prelude::*;
    //! ```
    pub use crate::channel::{ChannelGeometry,
                             FlowRegime,
                             FlowState};
    pub use crate::error::ChannelError;
    pub use crate::sampler::{MonitorSpec,
                             NodeSeries,
                             ProfileSnapshot};
    pub use crate::solver::{compute_profile,
                            critical_depth,
                            normal_depth,
                            MarchDirection,
                            NewtonRaphson,
                            ProfileConfig,
                            WaterSurfaceProfile};
    pub use crate::solver::routing::{BoundaryConditions,
                                     RouteConfig,
                                     RoutedWave,
                                     Router,
                                     RoutingScheme};
}
