//! Failover routing between redundant links.
//!
//! The [`Router`] watches every transport's connectivity and wires the
//! highest-priority connected one to the two pump workers. The pumps encode
//! outgoing batches into MTU-sized packets and decode incoming messages into
//! updates. [`GroundLink`] starts all three and exposes the application's
//! channels.

pub mod error;
pub mod link;
pub mod pump;
pub mod router;

pub use error::{LinkError, Result};
pub use link::GroundLink;
pub use router::{select_active, Route, Router};
