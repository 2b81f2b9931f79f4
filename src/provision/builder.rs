//! Assembly of the engine create call from a flat request.

use std::collections::BTreeMap;

use crate::engine::{CreateContainerSpec, EndpointSettings, HostSettings, NetworkingSettings};
use crate::network::NetworkDescriptor;
use crate::provision::error::Result;
use crate::provision::ports::port_bindings;
use crate::provision::types::ContainerProvisionRequest;

/// Build the create call for `request`.
///
/// `network` is the already resolved network named by the request, if any.
/// Without one, the networking section is left out entirely so the engine
/// falls back to its default bridge.
pub fn build_create_spec(
    request: &ContainerProvisionRequest,
    network: Option<&NetworkDescriptor>,
) -> Result<CreateContainerSpec> {
    let (exposed_ports, port_bindings) = port_bindings(&request.ports)?;

    let networking = network.map(|net| {
        let mut endpoints = BTreeMap::new();
        endpoints.insert(
            net.name.clone(),
            EndpointSettings {
                network_id: net.id.clone(),
                aliases: vec![request.name.clone()],
            },
        );
        NetworkingSettings { endpoints }
    });

    let host = HostSettings {
        binds: request.volumes.clone().unwrap_or_default(),
        port_bindings,
        network_mode: network.map(|net| net.name.clone()),
    };

    tracing::debug!(
        name = %request.name,
        image = %request.image,
        ports = exposed_ports.len(),
        binds = host.binds.len(),
        network = network.map(|n| n.name.as_str()).unwrap_or("<default>"),
        "Assembled container create request"
    );

    Ok(CreateContainerSpec {
        name: request.name.clone(),
        image: request.image.clone(),
        env: request.env.clone(),
        exposed_ports,
        host,
        networking,
        attach_stdin: false,
        attach_stdout: false,
        attach_stderr: false,
    })
}
