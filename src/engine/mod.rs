//! Container engine client capability.
//!
//! [`EngineClient`] is the single seam between whaler's components and the
//! container engine. Components hold an `Arc<dyn EngineClient>` that is
//! connected once and shared; nothing reconnects per call.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ ImageBuilder │   │ Provisioner  │   │ NetworkDiscovery │
//! └──────┬───────┘   └──────┬───────┘   └────────┬─────────┘
//!        │                  │                    │
//!        └──────────────────┼────────────────────┘
//!                           ▼
//!                ┌─────────────────────┐
//!                │ Arc<dyn EngineClient>│
//!                └──────────┬──────────┘
//!                           ▼
//!         DockerEngine (bollard)  /  StubEngine (tests)
//! ```
//!
//! Calls are issued one at a time and are not coordinated across callers:
//! two creates racing on the same network, or a remove racing a start, are
//! resolved by the engine alone.

pub mod docker;
pub mod error;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub use docker::{DockerEngine, connect_docker};
pub use error::{EngineError, Result};
pub use types::{
    BuildSpec, ContainerDetails, ContainerSummary, CreateContainerSpec, EndpointSettings,
    ExecOutput, ExecSpec, HostSettings, ImageSummary, NetworkSummary, NetworkingSettings,
    OutputChunk, PortBinding, PortMap, PushSpec, RemoveOptions, ResponseBody,
};

/// Operations whaler needs from a container engine.
///
/// Streaming calls ([`build_image`](Self::build_image),
/// [`push_image`](Self::push_image)) return `Err` when the engine refuses
/// the request outright; failures after the first chunk surface as items
/// of the returned body.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Check that the engine answers.
    async fn ping(&self) -> Result<()>;

    /// List containers; `all = false` restricts to running ones.
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails>;

    /// Create a container and return its engine-assigned ID.
    async fn create_container(&self, spec: CreateContainerSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// Restart a container, waiting up to `timeout` before killing it.
    /// `None` leaves the grace period to the engine.
    async fn restart_container(&self, id: &str, timeout: Option<Duration>) -> Result<()>;

    async fn remove_container(&self, id: &str, options: RemoveOptions) -> Result<()>;

    /// Create an exec session and return its ID exactly as the engine
    /// reported it (possibly empty).
    async fn create_exec(&self, container_id: &str, spec: ExecSpec) -> Result<String>;

    /// Start an exec session attached and return its output.
    async fn start_exec(&self, exec_id: &str) -> Result<ExecOutput>;

    /// Submit a build with `archive` as the context.
    async fn build_image<'a>(&'a self, spec: BuildSpec, archive: Bytes)
    -> Result<ResponseBody<'a>>;

    /// Push `repository` to its registry.
    async fn push_image<'a>(&'a self, repository: &str, spec: PushSpec)
    -> Result<ResponseBody<'a>>;

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;

    async fn list_images(&self) -> Result<Vec<ImageSummary>>;
}
