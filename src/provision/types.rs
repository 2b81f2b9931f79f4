//! Provisioning request and container descriptor types.

use crate::engine::{ContainerDetails, ContainerSummary};
use crate::provision::error::{ProvisionError, Result};

/// What a caller wants created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerProvisionRequest {
    /// Container name; also its alias on the attached network.
    pub name: String,
    /// Image reference, e.g. `nginx:latest`.
    pub image: String,
    /// `hostPath:containerPath` bind mounts. `None` is submitted as an empty list.
    pub volumes: Option<Vec<String>>,
    /// `KEY=value` entries.
    pub env: Vec<String>,
    /// `hostPort:containerPort` specs, TCP only.
    pub ports: Vec<String>,
    /// Network to attach to; `None` or empty leaves the engine default.
    pub network_name: Option<String>,
}

impl ContainerProvisionRequest {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_volume(mut self, bind: impl Into<String>) -> Self {
        self.volumes.get_or_insert_with(Vec::new).push(bind.into());
        self
    }

    pub fn with_env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn with_port(mut self, spec: impl Into<String>) -> Self {
        self.ports.push(spec.into());
        self
    }

    pub fn with_network(mut self, name: impl Into<String>) -> Self {
        self.network_name = Some(name.into());
        self
    }

    /// The network to attach to, ignoring an empty name.
    pub fn network(&self) -> Option<&str> {
        self.network_name.as_deref().filter(|n| !n.is_empty())
    }
}

/// A container as reported by the engine.
///
/// Descriptors built from a list call only carry `id`, `name` and `image`;
/// the engine's list endpoint does not report the rest. Inspect fills in
/// every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDescriptor {
    pub id: String,
    /// Display name without the engine's leading `/`.
    pub name: String,
    pub image: String,
    pub volumes: Vec<String>,
    pub env: Vec<String>,
    /// `hostPort:containerPort` specs.
    pub ports: Vec<String>,
}

impl ContainerDescriptor {
    /// Whether `identifier` is exactly this container's name or ID.
    pub fn matches(&self, identifier: &str) -> bool {
        self.name == identifier || self.id == identifier
    }
}

fn display_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

impl TryFrom<ContainerSummary> for ContainerDescriptor {
    type Error = ProvisionError;

    fn try_from(summary: ContainerSummary) -> Result<Self> {
        let name = match summary.names.first() {
            Some(name) => display_name(name).to_string(),
            None => return Err(ProvisionError::MissingContainerName { id: summary.id }),
        };

        Ok(Self {
            id: summary.id,
            name,
            image: summary.image,
            ..Default::default()
        })
    }
}

impl From<ContainerDetails> for ContainerDescriptor {
    fn from(details: ContainerDetails) -> Self {
        let ports = details
            .port_bindings
            .iter()
            .flat_map(|(key, bindings)| {
                let container_port = key.strip_suffix("/tcp").unwrap_or(key);
                bindings
                    .iter()
                    .map(move |b| format!("{}:{}", b.host_port, container_port))
            })
            .collect();

        Self {
            name: display_name(&details.name).to_string(),
            id: details.id,
            image: details.image,
            volumes: details.binds,
            env: details.env,
            ports,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::engine::PortBinding;

    #[test]
    fn test_request_builder() {
        let request = ContainerProvisionRequest::new("web", "nginx:latest")
            .with_volume("/srv/www:/usr/share/nginx/html")
            .with_env("MODE=prod")
            .with_port("8080:80")
            .with_network("appnet");

        assert_eq!(request.volumes.as_deref().map(<[String]>::len), Some(1));
        assert_eq!(request.env, vec!["MODE=prod"]);
        assert_eq!(request.ports, vec!["8080:80"]);
        assert_eq!(request.network(), Some("appnet"));
    }

    #[test]
    fn test_empty_network_name_means_no_network() {
        let request = ContainerProvisionRequest::new("web", "nginx").with_network("");
        assert_eq!(request.network(), None);
    }

    #[test]
    fn test_descriptor_from_summary_trims_slash() {
        let descriptor = ContainerDescriptor::try_from(ContainerSummary {
            id: "abc123".to_string(),
            names: vec!["/web".to_string(), "/alias".to_string()],
            image: "nginx:latest".to_string(),
        })
        .unwrap();

        assert_eq!(descriptor.name, "web");
        assert_eq!(descriptor.id, "abc123");
        assert!(descriptor.volumes.is_empty());
        assert!(descriptor.ports.is_empty());
    }

    #[test]
    fn test_descriptor_from_summary_without_names() {
        let err = ContainerDescriptor::try_from(ContainerSummary {
            id: "abc123".to_string(),
            names: Vec::new(),
            image: "nginx".to_string(),
        })
        .unwrap_err();

        assert!(matches!(err, ProvisionError::MissingContainerName { ref id } if id == "abc123"));
    }

    #[test]
    fn test_descriptor_from_details() {
        let mut port_bindings = BTreeMap::new();
        port_bindings.insert(
            "80/tcp".to_string(),
            vec![PortBinding {
                host_ip: String::new(),
                host_port: "8080".to_string(),
            }],
        );
        let descriptor = ContainerDescriptor::from(ContainerDetails {
            id: "abc123".to_string(),
            name: "/web".to_string(),
            image: "nginx:latest".to_string(),
            binds: vec!["/srv:/data".to_string()],
            env: vec!["MODE=prod".to_string()],
            port_bindings,
        });

        assert_eq!(descriptor.name, "web");
        assert_eq!(descriptor.ports, vec!["8080:80"]);
        assert_eq!(descriptor.volumes, vec!["/srv:/data"]);
        assert_eq!(descriptor.env, vec!["MODE=prod"]);
    }

    #[test]
    fn test_matches_name_or_id() {
        let descriptor = ContainerDescriptor {
            id: "abc123".to_string(),
            name: "web".to_string(),
            ..Default::default()
        };

        assert!(descriptor.matches("web"));
        assert!(descriptor.matches("abc123"));
        assert!(!descriptor.matches("Web"));
        assert!(!descriptor.matches("abc"));
    }
}
