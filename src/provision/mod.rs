//! Container provisioning.
//!
//! Translates a flat [`ContainerProvisionRequest`] into the nested create
//! call the engine expects and drives the rest of the container lifecycle.
//!
//! ```text
//! ContainerProvisionRequest
//!         │
//!         ▼
//!  resolve network ──(not found)──▶ NetworkNotFound, nothing created
//!         │
//!         ▼
//!  parse "H:C" port specs ──(malformed)──▶ PortSpec
//!         │
//!         ▼
//!  CreateContainerSpec { exposed "C/tcp", bindings, binds, endpoint }
//!         │
//!         ▼
//!  engine create ──▶ container ID
//! ```

pub mod builder;
pub mod error;
pub mod manager;
pub mod ports;
pub mod types;

pub use builder::build_create_spec;
pub use error::{ProvisionError, Result};
pub use manager::Provisioner;
pub use ports::PortSpec;
pub use types::{ContainerDescriptor, ContainerProvisionRequest};
