//! Whaler: a typed control surface over the Docker Engine API.
//!
//! Two independent components sit on top of a shared [`engine::EngineClient`]:
//!
//! - [`build::ImageBuilder`] packages a directory into a build context,
//!   submits image builds and pushes images to a registry.
//! - [`provision::Provisioner`] turns a flat [`provision::ContainerProvisionRequest`]
//!   into the nested create request the engine expects, and drives the
//!   container lifecycle (start, restart, remove, exec).
//!
//! Network lookups used during provisioning live in [`network`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use whaler::config::EngineConfig;
//! use whaler::engine::{DockerEngine, EngineClient};
//! use whaler::provision::{ContainerProvisionRequest, Provisioner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine: Arc<dyn EngineClient> =
//!     Arc::new(DockerEngine::connect(&EngineConfig::default()).await?);
//! let provisioner = Provisioner::new(engine);
//!
//! let request = ContainerProvisionRequest::new("web", "nginx:latest")
//!     .with_port("8080:80")
//!     .with_network("appnet");
//! let id = provisioner.create_container(&request).await?;
//! provisioner.start_container(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod provision;
pub mod testing;
