//! Request and response shapes exchanged with the engine.
//!
//! These mirror the parts of the Docker Engine API that whaler uses, without
//! tying callers to a particular client library.

use std::collections::{BTreeMap, BTreeSet};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::engine::error::Result;

/// Container entry as returned by the engine's list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    /// Names as reported by the engine, usually with a leading `/`.
    pub names: Vec<String>,
    pub image: String,
}

/// Container detail as returned by the engine's inspect call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub image: String,
    pub binds: Vec<String>,
    pub env: Vec<String>,
    pub port_bindings: PortMap,
}

/// One host-side binding for an exposed container port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortBinding {
    /// Empty means all interfaces.
    pub host_ip: String,
    pub host_port: String,
}

/// Exposed-port key (`"80/tcp"`) to its host bindings.
pub type PortMap = BTreeMap<String, Vec<PortBinding>>;

/// Host-level settings of a container create call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    /// `host:container` bind mounts. Always present, possibly empty.
    pub binds: Vec<String>,
    pub port_bindings: PortMap,
    /// Network the container joins at creation, if any.
    pub network_mode: Option<String>,
}

/// Attachment of a container to one network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSettings {
    pub network_id: String,
    pub aliases: Vec<String>,
}

/// Network attachments keyed by network name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkingSettings {
    pub endpoints: BTreeMap<String, EndpointSettings>,
}

/// Fully assembled container create call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContainerSpec {
    pub name: String,
    pub image: String,
    pub env: Vec<String>,
    pub exposed_ports: BTreeSet<String>,
    pub host: HostSettings,
    /// `None` lets the engine attach the default bridge network.
    pub networking: Option<NetworkingSettings>,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Kill the container first if it is running.
    pub force: bool,
    /// Remove anonymous volumes along with the container.
    pub remove_volumes: bool,
}

/// Exec session creation parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecSpec {
    pub cmd: Vec<String>,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
    pub tty: bool,
    pub detach: bool,
}

/// Image build parameters sent alongside the context archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSpec {
    /// Dockerfile path relative to the context root.
    pub dockerfile: String,
    pub tag: String,
    pub network_mode: String,
    pub no_cache: bool,
}

/// Image push parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSpec {
    /// `None` pushes every tag of the repository.
    pub tag: Option<String>,
    /// Base64-encoded JSON credentials (the `X-Registry-Auth` header value).
    pub registry_auth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSummary {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSummary {
    pub id: String,
    pub repo_tags: Vec<String>,
}

/// Raw response body of a streaming call (build, push), chunk by chunk.
pub type ResponseBody<'a> = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'a>>;

/// A piece of exec output, tagged with the stream it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    StdOut(Bytes),
    StdErr(Bytes),
    /// Output of a tty session, where stdout and stderr are merged.
    Console(Bytes),
}

impl OutputChunk {
    pub fn bytes(&self) -> &Bytes {
        match self {
            OutputChunk::StdOut(b) | OutputChunk::StdErr(b) | OutputChunk::Console(b) => b,
        }
    }
}

/// Readable output of an attached exec session.
pub struct ExecOutput {
    inner: Pin<Box<dyn Stream<Item = Result<OutputChunk>> + Send>>,
}

impl ExecOutput {
    pub fn new(stream: impl Stream<Item = Result<OutputChunk>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Read the session to completion, interleaving stdout and stderr in
    /// arrival order.
    pub async fn read_to_string(mut self) -> Result<String> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(chunk?.bytes());
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Stream for ExecOutput {
    type Item = Result<OutputChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ExecOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecOutput").finish_non_exhaustive()
    }
}
