//! Container lifecycle operations against the engine.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::{EngineClient, ExecOutput, ExecSpec, RemoveOptions};
use crate::network::{NetworkDiscovery, NetworkError};
use crate::provision::builder::build_create_spec;
use crate::provision::error::{ProvisionError, Result};
use crate::provision::types::{ContainerDescriptor, ContainerProvisionRequest};

/// Creates containers from provisioning requests and manages their lifecycle.
///
/// Holds a shared engine handle and no other state; overlapping calls from
/// different tasks are not coordinated.
#[derive(Clone)]
pub struct Provisioner {
    engine: Arc<dyn EngineClient>,
    networks: NetworkDiscovery,
}

impl Provisioner {
    pub fn new(engine: Arc<dyn EngineClient>) -> Self {
        let networks = NetworkDiscovery::new(Arc::clone(&engine));
        Self { engine, networks }
    }

    /// Create a container and return its ID.
    ///
    /// The network lookup and port parsing both happen before the engine is
    /// asked to create anything, so a bad request leaves no trace.
    pub async fn create_container(&self, request: &ContainerProvisionRequest) -> Result<String> {
        let network = match request.network() {
            Some(name) => Some(self.networks.find_network_by_name(name).await.map_err(
                |e| match e {
                    NetworkError::NotFound { name } => ProvisionError::NetworkNotFound { name },
                    NetworkError::Engine(e) => ProvisionError::Engine(e),
                },
            )?),
            None => None,
        };

        let spec = build_create_spec(request, network.as_ref())?;

        let id = self
            .engine
            .create_container(spec)
            .await
            .map_err(|e| ProvisionError::ContainerCreate {
                name: request.name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("Created container '{}' ({})", request.name, id);
        Ok(id)
    }

    /// List containers; `all = false` restricts to running ones.
    ///
    /// Only `id`, `name` and `image` are populated.
    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerDescriptor>> {
        self.engine
            .list_containers(all)
            .await?
            .into_iter()
            .map(ContainerDescriptor::try_from)
            .collect()
    }

    /// First container whose name or ID equals `identifier`.
    pub async fn find_container(&self, identifier: &str, all: bool) -> Result<ContainerDescriptor> {
        self.list_containers(all)
            .await?
            .into_iter()
            .find(|c| c.matches(identifier))
            .ok_or_else(|| ProvisionError::ContainerNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Full descriptor of one container, volumes, env and ports included.
    pub async fn inspect_container(&self, id: &str) -> Result<ContainerDescriptor> {
        let details = self.engine.inspect_container(id).await.map_err(|e| {
            if e.is_not_found() {
                ProvisionError::ContainerNotFound {
                    identifier: id.to_string(),
                }
            } else {
                ProvisionError::Engine(e)
            }
        })?;
        Ok(details.into())
    }

    pub async fn start_container(&self, id: &str) -> Result<()> {
        self.engine.start_container(id).await?;
        tracing::info!("Started container {}", id);
        Ok(())
    }

    /// Restart a container found by name or ID among all containers.
    ///
    /// `timeout` is the grace period before the engine kills the container.
    pub async fn restart_container(
        &self,
        identifier: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let container = self.find_container(identifier, true).await?;
        self.engine.restart_container(&container.id, timeout).await?;
        tracing::info!("Restarted container '{}' ({})", container.name, container.id);
        Ok(())
    }

    /// Remove a container and its anonymous volumes. `force` also removes a
    /// running container.
    pub async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.engine
            .remove_container(
                id,
                RemoveOptions {
                    force,
                    remove_volumes: true,
                },
            )
            .await?;
        tracing::info!("Removed container {}", id);
        Ok(())
    }

    /// Run `command` inside a container and return its combined output stream.
    pub async fn exec(&self, container_id: &str, command: &[String]) -> Result<ExecOutput> {
        self.inspect_container(container_id).await?;

        let spec = ExecSpec {
            cmd: command.to_vec(),
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: true,
            tty: false,
            detach: false,
        };
        let exec_id = self
            .engine
            .create_exec(container_id, spec)
            .await
            .map_err(|e| ProvisionError::ExecCreate {
                container: container_id.to_string(),
                reason: e.to_string(),
            })?;

        if exec_id.is_empty() {
            return Err(ProvisionError::ExecIdEmpty {
                container: container_id.to_string(),
            });
        }

        tracing::debug!("Attaching to exec session {} in {}", exec_id, container_id);
        Ok(self.engine.start_exec(&exec_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::engine::{ContainerSummary, OutputChunk};
    use crate::testing::{EngineCall, StubEngine, StubOperation};

    fn setup(engine: StubEngine) -> (Arc<StubEngine>, Provisioner) {
        let engine = Arc::new(engine);
        let provisioner = Provisioner::new(engine.clone());
        (engine, provisioner)
    }

    #[tokio::test]
    async fn test_create_without_network_skips_lookup() {
        let (engine, provisioner) = setup(StubEngine::new().with_created_id("c1"));
        let request = ContainerProvisionRequest::new("web", "nginx:latest");

        let id = provisioner.create_container(&request).await.unwrap();

        assert_eq!(id, "c1");
        assert!(!engine.calls().contains(&EngineCall::ListNetworks));
        let specs = engine.created_specs();
        assert_eq!(specs.len(), 1);
        assert!(specs[0].networking.is_none());
    }

    #[tokio::test]
    async fn test_create_with_unknown_network_creates_nothing() {
        let (engine, provisioner) =
            setup(StubEngine::new().with_network("bridge", "b1"));
        let request = ContainerProvisionRequest::new("web", "nginx:latest").with_network("appnet");

        let err = provisioner.create_container(&request).await.unwrap_err();

        assert!(matches!(err, ProvisionError::NetworkNotFound { ref name } if name == "appnet"));
        assert!(engine.created_specs().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_bad_port_creates_nothing() {
        let (engine, provisioner) = setup(StubEngine::new());
        let request = ContainerProvisionRequest::new("web", "nginx:latest").with_port("80");

        let err = provisioner.create_container(&request).await.unwrap_err();

        assert!(matches!(err, ProvisionError::PortSpec { .. }));
        assert!(engine.created_specs().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejection_passes_engine_message() {
        let (_, provisioner) = setup(StubEngine::new().failing(
            StubOperation::CreateContainer,
            409,
            "Conflict. The container name \"/web\" is already in use",
        ));
        let request = ContainerProvisionRequest::new("web", "nginx:latest");

        let err = provisioner.create_container(&request).await.unwrap_err();

        match err {
            ProvisionError::ContainerCreate { name, reason } => {
                assert_eq!(name, "web");
                assert_eq!(
                    reason,
                    "Conflict. The container name \"/web\" is already in use"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_containers_projects_summary() {
        let (engine, provisioner) = setup(
            StubEngine::new()
                .with_container("id1", "/web", "nginx:latest")
                .with_container("id2", "/db", "postgres:16"),
        );

        let containers = provisioner.list_containers(true).await.unwrap();

        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "web");
        assert_eq!(containers[1].image, "postgres:16");
        assert_eq!(engine.calls(), vec![EngineCall::ListContainers { all: true }]);
    }

    #[tokio::test]
    async fn test_list_containers_rejects_nameless_container() {
        let (_, provisioner) = setup(StubEngine::new().with_container_summary(
            ContainerSummary {
                id: "id1".to_string(),
                names: Vec::new(),
                image: "nginx".to_string(),
            },
        ));

        let err = provisioner.list_containers(false).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MissingContainerName { .. }));
    }

    #[tokio::test]
    async fn test_find_container_first_match_wins() {
        let (_, provisioner) = setup(
            StubEngine::new()
                .with_container("id1", "/web", "nginx:1")
                .with_container("web", "/other", "nginx:2"),
        );

        let found = provisioner.find_container("web", true).await.unwrap();
        assert_eq!(found.id, "id1");

        let by_id = provisioner.find_container("id1", true).await.unwrap();
        assert_eq!(by_id.name, "web");
    }

    #[tokio::test]
    async fn test_find_container_not_found() {
        let (_, provisioner) = setup(StubEngine::new());
        let err = provisioner.find_container("web", true).await.unwrap_err();
        assert_eq!(err.to_string(), "Container 'web' not found");

        let (_, provisioner) =
            setup(StubEngine::new().with_container("id1", "/db", "postgres"));
        let err = provisioner.find_container("web", false).await.unwrap_err();
        assert!(matches!(err, ProvisionError::ContainerNotFound { .. }));
    }

    #[tokio::test]
    async fn test_restart_resolves_against_all_containers() {
        let (engine, provisioner) =
            setup(StubEngine::new().with_container("id1", "/web", "nginx"));

        provisioner
            .restart_container("web", Some(Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::ListContainers { all: true },
                EngineCall::RestartContainer {
                    id: "id1".to_string(),
                    timeout: Some(Duration::from_secs(5)),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_container_drops_volumes() {
        let (engine, provisioner) = setup(StubEngine::new());

        provisioner.remove_container("id1", true).await.unwrap();

        assert_eq!(
            engine.calls(),
            vec![EngineCall::RemoveContainer {
                id: "id1".to_string(),
                options: RemoveOptions {
                    force: true,
                    remove_volumes: true,
                },
            }]
        );
    }

    #[tokio::test]
    async fn test_start_container() {
        let (engine, provisioner) = setup(StubEngine::new());
        provisioner.start_container("id1").await.unwrap();
        assert_eq!(
            engine.calls(),
            vec![EngineCall::StartContainer {
                id: "id1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_exec_returns_output() {
        let (engine, provisioner) = setup(
            StubEngine::new()
                .with_container("id1", "/web", "nginx")
                .with_exec_id("exec1")
                .with_exec_output(vec![OutputChunk::StdOut(Bytes::from_static(b"bin\netc\n"))]),
        );
        let command = vec!["ls".to_string(), "/".to_string()];

        let output = provisioner.exec("id1", &command).await.unwrap();
        assert_eq!(output.read_to_string().await.unwrap(), "bin\netc\n");

        let calls = engine.calls();
        assert_eq!(
            calls[1],
            EngineCall::CreateExec {
                container_id: "id1".to_string(),
                spec: ExecSpec {
                    cmd: command,
                    attach_stdin: false,
                    attach_stdout: true,
                    attach_stderr: true,
                    tty: false,
                    detach: false,
                },
            }
        );
        assert_eq!(
            calls[2],
            EngineCall::StartExec {
                exec_id: "exec1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_exec_missing_container() {
        let (engine, provisioner) = setup(StubEngine::new());

        let err = provisioner
            .exec("ghost", &["ls".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::ContainerNotFound { ref identifier } if identifier == "ghost"));
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_exec_empty_session_id_is_distinct() {
        let (engine, provisioner) = setup(
            StubEngine::new()
                .with_container("id1", "/web", "nginx")
                .with_exec_id(""),
        );

        let err = provisioner
            .exec("id1", &["ls".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::ExecIdEmpty { .. }));
        assert!(
            !engine
                .calls()
                .iter()
                .any(|c| matches!(c, EngineCall::StartExec { .. }))
        );
    }

    #[tokio::test]
    async fn test_exec_create_rejection() {
        let (_, provisioner) = setup(
            StubEngine::new()
                .with_container("id1", "/web", "nginx")
                .failing(StubOperation::CreateExec, 409, "Container id1 is not running"),
        );

        let err = provisioner
            .exec("id1", &["ls".to_string()])
            .await
            .unwrap_err();

        match err {
            ProvisionError::ExecCreate { reason, .. } => {
                assert_eq!(reason, "Container id1 is not running")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
