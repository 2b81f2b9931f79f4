//! Network discovery.
//!
//! Read-through lookups over the engine's networks. Nothing is cached: every
//! call asks the engine again.

pub mod discovery;
pub mod error;

pub use discovery::{NetworkDescriptor, NetworkDiscovery};
pub use error::{NetworkError, Result};
