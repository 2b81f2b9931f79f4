//! End-to-end provisioning against the recording stub engine.
//!
//! Each test drives the public `Provisioner` API and asserts on the exact
//! engine calls it produced.

use std::sync::Arc;

use whaler::engine::{EndpointSettings, PortBinding};
use whaler::provision::{ContainerProvisionRequest, ProvisionError, Provisioner};
use whaler::testing::{EngineCall, StubEngine};

fn web_request() -> ContainerProvisionRequest {
    ContainerProvisionRequest::new("web", "nginx:latest")
        .with_port("8080:80")
        .with_network("appnet")
}

// ── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_on_named_network_wires_ports_and_endpoint() {
    let engine = Arc::new(
        StubEngine::new()
            .with_network("bridge", "b0")
            .with_network("appnet", "net123")
            .with_created_id("c0ffee"),
    );
    let provisioner = Provisioner::new(engine.clone());

    let id = provisioner.create_container(&web_request()).await.unwrap();
    assert_eq!(id, "c0ffee");

    let specs = engine.created_specs();
    assert_eq!(specs.len(), 1);
    let spec = &specs[0];

    assert_eq!(spec.name, "web");
    assert_eq!(spec.image, "nginx:latest");
    assert_eq!(
        spec.exposed_ports.iter().collect::<Vec<_>>(),
        vec!["80/tcp"]
    );
    assert_eq!(
        spec.host.port_bindings["80/tcp"],
        vec![PortBinding {
            host_ip: String::new(),
            host_port: "8080".to_string(),
        }]
    );
    assert!(spec.host.binds.is_empty());

    let networking = spec.networking.as_ref().unwrap();
    assert_eq!(
        networking.endpoints.get("appnet"),
        Some(&EndpointSettings {
            network_id: "net123".to_string(),
            aliases: vec!["web".to_string()],
        })
    );
}

#[tokio::test]
async fn create_on_unknown_network_never_reaches_engine_create() {
    let engine = Arc::new(StubEngine::new().with_network("bridge", "b0"));
    let provisioner = Provisioner::new(engine.clone());

    let err = provisioner.create_container(&web_request()).await.unwrap_err();

    assert_eq!(err.to_string(), "Network 'appnet' not found");
    assert_eq!(engine.calls(), vec![EngineCall::ListNetworks]);
}

#[tokio::test]
async fn network_lookup_is_case_sensitive() {
    let engine = Arc::new(StubEngine::new().with_network("AppNet", "net123"));
    let provisioner = Provisioner::new(engine.clone());

    let err = provisioner.create_container(&web_request()).await.unwrap_err();
    assert!(matches!(err, ProvisionError::NetworkNotFound { .. }));
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_start_restart_remove() {
    let engine = Arc::new(
        StubEngine::new()
            .with_network("appnet", "net123")
            .with_created_id("c1")
            .with_container("c1", "/web", "nginx:latest"),
    );
    let provisioner = Provisioner::new(engine.clone());

    let id = provisioner.create_container(&web_request()).await.unwrap();
    provisioner.start_container(&id).await.unwrap();
    provisioner.restart_container("web", None).await.unwrap();
    provisioner.remove_container(&id, true).await.unwrap();

    let calls = engine.calls();
    let names: Vec<&str> = calls
        .iter()
        .map(|c| match c {
            EngineCall::ListNetworks => "list_networks",
            EngineCall::CreateContainer(_) => "create",
            EngineCall::StartContainer { .. } => "start",
            EngineCall::ListContainers { all: true } => "list_all",
            EngineCall::RestartContainer { .. } => "restart",
            EngineCall::RemoveContainer { .. } => "remove",
            _ => "other",
        })
        .collect();
    assert_eq!(
        names,
        vec!["list_networks", "create", "start", "list_all", "restart", "remove"]
    );
}

#[tokio::test]
async fn find_container_by_created_name() {
    let engine = Arc::new(
        StubEngine::new()
            .with_container("aaa", "/db", "postgres:16")
            .with_container("bbb", "/web", "nginx:latest"),
    );
    let provisioner = Provisioner::new(engine);

    let found = provisioner.find_container("web", false).await.unwrap();
    assert_eq!(found.id, "bbb");
    assert_eq!(found.image, "nginx:latest");

    let err = provisioner.find_container("cache", true).await.unwrap_err();
    assert_eq!(err.to_string(), "Container 'cache' not found");
}

// ── Exec ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn exec_with_empty_session_id_is_reported() {
    let engine = Arc::new(
        StubEngine::new()
            .with_container("c1", "/web", "nginx:latest")
            .with_exec_id(""),
    );
    let provisioner = Provisioner::new(engine);

    let err = provisioner
        .exec("c1", &["cat".to_string(), "/etc/hostname".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::ExecIdEmpty { ref container } if container == "c1"));
}
