//! Redundant ground link for remote-controlled vehicles.
//!
//! groundlink exchanges small named, typed control variables with one vehicle
//! over several unreliable links at once, keeping traffic on the best link
//! that is up.
//!
//! # Crate Structure
//!
//! - [`registry`]: Catalog of typed variables and their wire tags
//! - [`frame`]: Length-prefixed update framing and packet coalescing
//! - [`transport`]: Serial and wireless link lifecycle
//! - [`link`]: Failover routing and the application-facing [`link::GroundLink`]

/// Re-export registry types.
pub mod registry {
    pub use groundlink_registry::*;
}

/// Re-export frame types.
pub mod frame {
    pub use groundlink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use groundlink_transport::*;
}

/// Re-export link types.
pub mod link {
    pub use groundlink_link::*;
}
