//! Immutable catalog of typed control variables.
//!
//! Every variable has a group, a name, a kind, and a dense numeric tag that
//! identifies it on the wire. The registry is built once at startup and is
//! read concurrently by every other layer without locking.

pub mod config;
pub mod definition;
pub mod error;
pub mod registry;
pub mod value;

pub use config::RegistryConfig;
pub use definition::{Definition, Update};
pub use error::{RegistryError, Result};
pub use registry::{Catalog, Registry};
pub use value::{Value, ValueKind};
