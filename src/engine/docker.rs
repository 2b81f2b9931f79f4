//! [`EngineClient`] backed by the Docker Engine API via `bollard`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogOutput, NetworkingConfig,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::{BuildImageOptions, ListImagesOptions, PushImageOptions};
use bollard::models::{BuildInfo, HostConfig, PushImageInfo};
use bollard::network::ListNetworksOptions;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::EngineClient;
use crate::engine::error::{EngineError, Result};
use crate::engine::types::{
    BuildSpec, ContainerDetails, ContainerSummary, CreateContainerSpec, ExecOutput, ExecSpec,
    ImageSummary, NetworkSummary, OutputChunk, PortBinding, PortMap, PushSpec, RemoveOptions,
    ResponseBody,
};

impl From<bollard::errors::Error> for EngineError {
    fn from(e: bollard::errors::Error) -> Self {
        match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code,
                message,
            } => EngineError::Rejected {
                status: status_code,
                message,
            },
            // The response itself was a 200; the failure arrived as an
            // `{"error": ..}` message inside it.
            bollard::errors::Error::DockerStreamError { error } => EngineError::Rejected {
                status: 200,
                message: error,
            },
            other => EngineError::Transport {
                reason: other.to_string(),
            },
        }
    }
}

/// Connect to the Docker daemon.
///
/// Tries bollard's defaults first (which honour `DOCKER_HOST`), then, on
/// Unix and when enabled, the per-user socket locations used by Docker
/// Desktop and rootless Docker. A connection only counts once it answers a
/// ping.
pub async fn connect_docker(config: &EngineConfig) -> Result<Docker> {
    let mut last_error = match Docker::connect_with_defaults() {
        Ok(docker) => {
            let docker = docker.with_timeout(config.timeout);
            match docker.ping().await {
                Ok(_) => return Ok(docker),
                Err(e) => e.to_string(),
            }
        }
        Err(e) => e.to_string(),
    };
    tracing::debug!("Default Docker connection failed: {}", last_error);

    #[cfg(unix)]
    if config.socket_fallback {
        for socket in fallback_sockets() {
            if !socket.exists() {
                continue;
            }
            let path = socket.to_string_lossy();
            match Docker::connect_with_unix(
                &path,
                config.timeout.as_secs(),
                bollard::API_DEFAULT_VERSION,
            ) {
                Ok(docker) => match docker.ping().await {
                    Ok(_) => {
                        tracing::info!("Connected to Docker via fallback socket {}", path);
                        return Ok(docker);
                    }
                    Err(e) => last_error = format!("{}: {}", path, e),
                },
                Err(e) => last_error = format!("{}: {}", path, e),
            }
        }
    }

    Err(EngineError::Unavailable { reason: last_error })
}

/// Socket locations tried after the default connection fails.
#[cfg(unix)]
fn fallback_sockets() -> Vec<PathBuf> {
    let mut sockets = Vec::new();
    if let Some(home) = dirs::home_dir() {
        sockets.push(home.join(".docker").join("run").join("docker.sock"));
    }
    if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR") {
        sockets.push(PathBuf::from(runtime_dir).join("docker.sock"));
    }
    sockets.push(PathBuf::from("/var/run/docker.sock"));
    sockets
}

/// Docker Engine API client.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect once; the returned engine is meant to be shared.
    pub async fn connect(config: &EngineConfig) -> Result<Self> {
        let docker = connect_docker(config).await?;
        tracing::debug!("Docker engine connected");
        Ok(Self { docker })
    }

    /// Wrap an already connected bollard client.
    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

/// One progress message of a build or push, re-encoded as a JSON line.
///
/// Only the fields whaler reads are kept; unknown fields and progress
/// detail objects are dropped.
#[derive(Debug, Default, PartialEq, Serialize)]
struct ProgressLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aux: Option<AuxLine>,
}

#[derive(Debug, PartialEq, Serialize)]
struct AuxLine {
    #[serde(rename = "ID")]
    id: String,
}

impl From<BuildInfo> for ProgressLine {
    fn from(info: BuildInfo) -> Self {
        Self {
            id: info.id,
            stream: info.stream,
            status: info.status,
            progress: info.progress,
            aux: info.aux.and_then(|aux| aux.id).map(|id| AuxLine { id }),
        }
    }
}

impl From<PushImageInfo> for ProgressLine {
    fn from(info: PushImageInfo) -> Self {
        Self {
            status: info.status,
            progress: info.progress,
            ..Default::default()
        }
    }
}

impl ProgressLine {
    /// Newline-terminated JSON.
    fn into_bytes(self) -> Result<Bytes> {
        let mut line = serde_json::to_vec(&self).map_err(|e| EngineError::UnexpectedResponse {
            reason: format!("failed to encode progress message: {}", e),
        })?;
        line.push(b'\n');
        Ok(Bytes::from(line))
    }
}

/// Wait for the first item of a streaming response so that a refused request
/// is reported by the call itself rather than by the body.
async fn split_rejection<'a, S>(stream: S) -> Result<ResponseBody<'a>>
where
    S: Stream<Item = Result<Bytes>> + Send + 'a,
{
    let mut stream: ResponseBody<'a> = Box::pin(stream);
    match stream.next().await {
        Some(Err(e)) => Err(e),
        Some(Ok(first)) => Ok(Box::pin(
            futures::stream::once(futures::future::ready(Ok(first))).chain(stream),
        )),
        None => Ok(Box::pin(futures::stream::empty())),
    }
}

fn decode_registry_auth(token: &str) -> Result<DockerCredentials> {
    let json = STANDARD
        .decode(token)
        .map_err(|e| EngineError::InvalidRequest {
            reason: format!("registry auth is not valid base64: {}", e),
        })?;
    serde_json::from_slice(&json).map_err(|e| EngineError::InvalidRequest {
        reason: format!("registry auth is not valid JSON: {}", e),
    })
}

fn to_bollard_port_map(
    ports: PortMap,
) -> HashMap<String, Option<Vec<bollard::models::PortBinding>>> {
    ports
        .into_iter()
        .map(|(key, bindings)| {
            let bindings = bindings
                .into_iter()
                .map(|b| bollard::models::PortBinding {
                    host_ip: Some(b.host_ip),
                    host_port: Some(b.host_port),
                })
                .collect();
            (key, Some(bindings))
        })
        .collect()
}

fn from_bollard_port_map(
    ports: HashMap<String, Option<Vec<bollard::models::PortBinding>>>,
) -> PortMap {
    ports
        .into_iter()
        .map(|(key, bindings)| {
            let bindings = bindings
                .unwrap_or_default()
                .into_iter()
                .map(|b| PortBinding {
                    host_ip: b.host_ip.unwrap_or_default(),
                    host_port: b.host_port.unwrap_or_default(),
                })
                .collect();
            (key, bindings)
        })
        .collect()
}

fn to_bollard_config(spec: CreateContainerSpec) -> Config<String> {
    // bollard expects HashMap<String, HashMap<(), ()>> for exposed ports
    let exposed_ports: HashMap<String, HashMap<(), ()>> = spec
        .exposed_ports
        .into_iter()
        .map(|port| (port, HashMap::new()))
        .collect();

    let host_config = HostConfig {
        binds: Some(spec.host.binds),
        port_bindings: Some(to_bollard_port_map(spec.host.port_bindings)),
        network_mode: spec.host.network_mode,
        ..Default::default()
    };

    let networking_config = spec.networking.map(|networking| NetworkingConfig {
        endpoints_config: networking
            .endpoints
            .into_iter()
            .map(|(name, endpoint)| {
                (
                    name,
                    bollard::models::EndpointSettings {
                        network_id: Some(endpoint.network_id),
                        aliases: Some(endpoint.aliases),
                        ..Default::default()
                    },
                )
            })
            .collect(),
    });

    Config {
        image: Some(spec.image),
        env: Some(spec.env),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        networking_config,
        attach_stdin: Some(spec.attach_stdin),
        attach_stdout: Some(spec.attach_stdout),
        attach_stderr: Some(spec.attach_stderr),
        network_disabled: Some(false),
        ..Default::default()
    }
}

/// Restart options for a grace period in seconds; out-of-range values are
/// rejected rather than wrapped.
fn restart_options(timeout: Option<Duration>) -> Result<Option<RestartContainerOptions>> {
    timeout
        .map(|t| {
            isize::try_from(t.as_secs())
                .map(|t| RestartContainerOptions { t })
                .map_err(|_| EngineError::InvalidRequest {
                    reason: format!("restart timeout of {}s is too large", t.as_secs()),
                })
        })
        .transpose()
}

#[async_trait]
impl EngineClient for DockerEngine {
    async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let info = self.docker.inspect_container(id, None).await?;

        let (image, env) = info
            .config
            .map(|c| (c.image.unwrap_or_default(), c.env.unwrap_or_default()))
            .unwrap_or_default();
        let (binds, port_bindings) = info
            .host_config
            .map(|h| {
                (
                    h.binds.unwrap_or_default(),
                    from_bollard_port_map(h.port_bindings.unwrap_or_default()),
                )
            })
            .unwrap_or_default();

        Ok(ContainerDetails {
            id: info.id.unwrap_or_default(),
            name: info.name.unwrap_or_default(),
            image,
            binds,
            env,
            port_bindings,
        })
    }

    async fn create_container(&self, spec: CreateContainerSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };
        let response = self
            .docker
            .create_container(Some(options), to_bollard_config(spec))
            .await?;

        for warning in &response.warnings {
            tracing::warn!("Engine warning on create: {}", warning);
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn restart_container(&self, id: &str, timeout: Option<Duration>) -> Result<()> {
        let options = restart_options(timeout)?;
        self.docker.restart_container(id, options).await?;
        Ok(())
    }

    async fn remove_container(&self, id: &str, options: RemoveOptions) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: options.force,
                    v: options.remove_volumes,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    async fn create_exec(&self, container_id: &str, spec: ExecSpec) -> Result<String> {
        let options = CreateExecOptions {
            cmd: Some(spec.cmd),
            attach_stdin: Some(spec.attach_stdin),
            attach_stdout: Some(spec.attach_stdout),
            attach_stderr: Some(spec.attach_stderr),
            tty: Some(spec.tty),
            ..Default::default()
        };
        let created = self.docker.create_exec(container_id, options).await?;
        Ok(created.id)
    }

    async fn start_exec(&self, exec_id: &str) -> Result<ExecOutput> {
        let options = StartExecOptions {
            detach: false,
            tty: false,
            ..Default::default()
        };

        match self.docker.start_exec(exec_id, Some(options)).await? {
            StartExecResults::Attached { output, .. } => {
                let output = output.map_err(EngineError::from).map_ok(|log| match log {
                    LogOutput::StdErr { message } => OutputChunk::StdErr(message),
                    LogOutput::StdOut { message } | LogOutput::StdIn { message } => {
                        OutputChunk::StdOut(message)
                    }
                    LogOutput::Console { message } => OutputChunk::Console(message),
                });
                Ok(ExecOutput::new(output))
            }
            StartExecResults::Detached => Err(EngineError::UnexpectedResponse {
                reason: format!("exec session {} started detached", exec_id),
            }),
        }
    }

    async fn build_image<'a>(
        &'a self,
        spec: BuildSpec,
        archive: Bytes,
    ) -> Result<ResponseBody<'a>> {
        let options = BuildImageOptions {
            dockerfile: spec.dockerfile,
            t: spec.tag,
            networkmode: spec.network_mode,
            nocache: spec.no_cache,
            ..Default::default()
        };

        let stream = self
            .docker
            .build_image(options, None, Some(archive))
            .map(|item| {
                item.map_err(EngineError::from)
                    .and_then(|info| ProgressLine::from(info).into_bytes())
            });
        split_rejection(stream).await
    }

    async fn push_image<'a>(&'a self, repository: &str, spec: PushSpec) -> Result<ResponseBody<'a>> {
        let credentials = decode_registry_auth(&spec.registry_auth)?;
        let options = PushImageOptions {
            tag: spec.tag.unwrap_or_default(),
        };

        let stream = self
            .docker
            .push_image(repository, Some(options), Some(credentials))
            .map(|item| {
                item.map_err(EngineError::from)
                    .and_then(|info| ProgressLine::from(info).into_bytes())
            });
        split_rejection(stream).await
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?;

        Ok(networks
            .into_iter()
            .map(|n| NetworkSummary {
                name: n.name.unwrap_or_default(),
                id: n.id.unwrap_or_default(),
            })
            .collect())
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await?;

        Ok(images
            .into_iter()
            .map(|i| ImageSummary {
                id: i.id,
                repo_tags: i.repo_tags,
            })
            .collect())
    }
}
