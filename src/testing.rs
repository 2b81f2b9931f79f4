//! Test doubles for the engine client.
//!
//! Provides:
//! - [`StubEngine`]: an in-memory [`EngineClient`] returning canned data
//! - [`EngineCall`]: the record of every call the stub received
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use whaler::provision::{ContainerProvisionRequest, Provisioner};
//! use whaler::testing::StubEngine;
//!
//! # async fn example() {
//! let engine = Arc::new(StubEngine::new().with_network("appnet", "net123"));
//! let provisioner = Provisioner::new(engine.clone());
//!
//! let request = ContainerProvisionRequest::new("web", "nginx:latest").with_network("appnet");
//! provisioner.create_container(&request).await.unwrap();
//!
//! assert_eq!(engine.created_specs().len(), 1);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::engine::{
    BuildSpec, ContainerDetails, ContainerSummary, CreateContainerSpec, EngineClient,
    EngineError, ExecOutput, ExecSpec, ImageSummary, NetworkSummary, OutputChunk, PushSpec,
    RemoveOptions, ResponseBody, Result,
};

/// Engine operations the stub can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubOperation {
    Ping,
    ListContainers,
    InspectContainer,
    CreateContainer,
    StartContainer,
    RestartContainer,
    RemoveContainer,
    CreateExec,
    StartExec,
    BuildImage,
    PushImage,
    ListNetworks,
    ListImages,
}

/// A call received by [`StubEngine`], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Ping,
    ListContainers { all: bool },
    InspectContainer { id: String },
    CreateContainer(CreateContainerSpec),
    StartContainer { id: String },
    RestartContainer { id: String, timeout: Option<Duration> },
    RemoveContainer { id: String, options: RemoveOptions },
    CreateExec { container_id: String, spec: ExecSpec },
    StartExec { exec_id: String },
    BuildImage { spec: BuildSpec, archive: Bytes },
    PushImage { repository: String, spec: PushSpec },
    ListNetworks,
    ListImages,
}

/// In-memory engine for tests.
///
/// Lists return what the builder methods registered, in registration order.
/// Streaming calls return the configured response chunks, optionally
/// followed by a mid-stream failure.
pub struct StubEngine {
    containers: Vec<ContainerSummary>,
    details: HashMap<String, ContainerDetails>,
    networks: Vec<NetworkSummary>,
    images: Vec<ImageSummary>,
    created_id: String,
    exec_id: String,
    exec_output: Vec<OutputChunk>,
    response: Vec<Bytes>,
    body_failure: Option<String>,
    stream_error: Option<String>,
    failures: HashMap<StubOperation, (u16, String)>,
    calls: Mutex<Vec<EngineCall>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            containers: Vec::new(),
            details: HashMap::new(),
            networks: Vec::new(),
            images: Vec::new(),
            created_id: "stub-container-id".to_string(),
            exec_id: "stub-exec-id".to_string(),
            exec_output: Vec::new(),
            response: Vec::new(),
            body_failure: None,
            stream_error: None,
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Register a container under a single name.
    pub fn with_container(self, id: &str, name: &str, image: &str) -> Self {
        self.with_container_summary(ContainerSummary {
            id: id.to_string(),
            names: vec![name.to_string()],
            image: image.to_string(),
        })
    }

    pub fn with_container_summary(mut self, summary: ContainerSummary) -> Self {
        self.containers.push(summary);
        self
    }

    /// Full inspect data for a container, keyed by its ID.
    pub fn with_container_details(mut self, details: ContainerDetails) -> Self {
        self.details.insert(details.id.clone(), details);
        self
    }

    pub fn with_network(mut self, name: &str, id: &str) -> Self {
        self.networks.push(NetworkSummary {
            name: name.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn with_image(mut self, id: &str, repo_tags: &[&str]) -> Self {
        self.images.push(ImageSummary {
            id: id.to_string(),
            repo_tags: repo_tags.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    /// ID returned by `create_container`.
    pub fn with_created_id(mut self, id: &str) -> Self {
        self.created_id = id.to_string();
        self
    }

    /// ID returned by `create_exec`; may be empty.
    pub fn with_exec_id(mut self, id: &str) -> Self {
        self.exec_id = id.to_string();
        self
    }

    pub fn with_exec_output(mut self, chunks: Vec<OutputChunk>) -> Self {
        self.exec_output = chunks;
        self
    }

    /// Body chunks returned by `build_image` and `push_image`.
    pub fn with_response(mut self, chunks: &[&str]) -> Self {
        self.response = chunks
            .iter()
            .map(|c| Bytes::copy_from_slice(c.as_bytes()))
            .collect();
        self
    }

    /// Make streaming bodies fail after the configured chunks.
    pub fn with_body_failure(mut self, reason: &str) -> Self {
        self.body_failure = Some(reason.to_string());
        self
    }

    /// End streaming bodies, after the configured chunks, with an error the
    /// engine reported inside the response (a failing build step, a
    /// registry `denied`).
    pub fn with_stream_error(mut self, message: &str) -> Self {
        self.stream_error = Some(message.to_string());
        self
    }

    /// Make `operation` fail with an engine rejection.
    pub fn failing(mut self, operation: StubOperation, status: u16, message: &str) -> Self {
        self.failures
            .insert(operation, (status, message.to_string()));
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Specs of every `create_container` call.
    pub fn created_specs(&self) -> Vec<CreateContainerSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::CreateContainer(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn check(&self, operation: StubOperation) -> Result<()> {
        match self.failures.get(&operation) {
            Some((status, message)) => Err(EngineError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Streaming body, with an error in first position reported by the call
    /// itself, as the Docker adapter does.
    fn body(&self) -> Result<ResponseBody<'static>> {
        let mut items: Vec<Result<Bytes>> = self.response.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.stream_error {
            items.push(Err(EngineError::Rejected {
                status: 200,
                message: message.clone(),
            }));
        }
        if let Some(reason) = &self.body_failure {
            items.push(Err(EngineError::Transport {
                reason: reason.clone(),
            }));
        }

        let mut items = items.into_iter();
        match items.next() {
            Some(Err(e)) => Err(e),
            Some(Ok(first)) => {
                let rest: Vec<_> = std::iter::once(Ok(first)).chain(items).collect();
                Ok(Box::pin(futures::stream::iter(rest)))
            }
            None => Ok(Box::pin(futures::stream::empty())),
        }
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineClient for StubEngine {
    async fn ping(&self) -> Result<()> {
        self.record(EngineCall::Ping);
        self.check(StubOperation::Ping)
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        self.record(EngineCall::ListContainers { all });
        self.check(StubOperation::ListContainers)?;
        Ok(self.containers.clone())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        self.record(EngineCall::InspectContainer { id: id.to_string() });
        self.check(StubOperation::InspectContainer)?;

        if let Some(details) = self.details.get(id) {
            return Ok(details.clone());
        }
        self.containers
            .iter()
            .find(|c| c.id == id)
            .map(|c| ContainerDetails {
                id: c.id.clone(),
                name: c.names.first().cloned().unwrap_or_default(),
                image: c.image.clone(),
                ..Default::default()
            })
            .ok_or_else(|| EngineError::Rejected {
                status: 404,
                message: format!("No such container: {}", id),
            })
    }

    async fn create_container(&self, spec: CreateContainerSpec) -> Result<String> {
        self.record(EngineCall::CreateContainer(spec));
        self.check(StubOperation::CreateContainer)?;
        Ok(self.created_id.clone())
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record(EngineCall::StartContainer { id: id.to_string() });
        self.check(StubOperation::StartContainer)
    }

    async fn restart_container(&self, id: &str, timeout: Option<Duration>) -> Result<()> {
        self.record(EngineCall::RestartContainer {
            id: id.to_string(),
            timeout,
        });
        self.check(StubOperation::RestartContainer)
    }

    async fn remove_container(&self, id: &str, options: RemoveOptions) -> Result<()> {
        self.record(EngineCall::RemoveContainer {
            id: id.to_string(),
            options,
        });
        self.check(StubOperation::RemoveContainer)
    }

    async fn create_exec(&self, container_id: &str, spec: ExecSpec) -> Result<String> {
        self.record(EngineCall::CreateExec {
            container_id: container_id.to_string(),
            spec,
        });
        self.check(StubOperation::CreateExec)?;
        Ok(self.exec_id.clone())
    }

    async fn start_exec(&self, exec_id: &str) -> Result<ExecOutput> {
        self.record(EngineCall::StartExec {
            exec_id: exec_id.to_string(),
        });
        self.check(StubOperation::StartExec)?;
        let chunks: Vec<Result<OutputChunk>> =
            self.exec_output.iter().cloned().map(Ok).collect();
        Ok(ExecOutput::new(futures::stream::iter(chunks)))
    }

    async fn build_image<'a>(
        &'a self,
        spec: BuildSpec,
        archive: Bytes,
    ) -> Result<ResponseBody<'a>> {
        self.record(EngineCall::BuildImage { spec, archive });
        self.check(StubOperation::BuildImage)?;
        self.body()
    }

    async fn push_image<'a>(&'a self, repository: &str, spec: PushSpec) -> Result<ResponseBody<'a>> {
        self.record(EngineCall::PushImage {
            repository: repository.to_string(),
            spec,
        });
        self.check(StubOperation::PushImage)?;
        self.body()
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        self.record(EngineCall::ListNetworks);
        self.check(StubOperation::ListNetworks)?;
        Ok(self.networks.clone())
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.record(EngineCall::ListImages);
        self.check(StubOperation::ListImages)?;
        Ok(self.images.clone())
    }
}
