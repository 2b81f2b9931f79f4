//! `hostPort:containerPort` parsing.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::engine::{PortBinding, PortMap};
use crate::provision::error::{ProvisionError, Result};

/// One TCP port publication, parsed from `"<hostPort>:<containerPort>"`.
///
/// Ports are kept as strings; the engine validates the numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub host_port: String,
    pub container_port: String,
}

impl PortSpec {
    /// Exposed-port key, e.g. `"80/tcp"`.
    pub fn exposed_port(&self) -> String {
        format!("{}/tcp", self.container_port)
    }

    /// Binding on all host interfaces.
    pub fn binding(&self) -> PortBinding {
        PortBinding {
            host_ip: String::new(),
            host_port: self.host_port.clone(),
        }
    }
}

impl FromStr for PortSpec {
    type Err = ProvisionError;

    fn from_str(spec: &str) -> Result<Self> {
        let invalid = |reason| ProvisionError::PortSpec {
            spec: spec.to_string(),
            reason,
        };

        let (host_port, container_port) = spec
            .split_once(':')
            .ok_or_else(|| invalid("expected exactly one ':'"))?;
        if container_port.contains(':') {
            return Err(invalid("expected exactly one ':'"));
        }
        if host_port.is_empty() || container_port.is_empty() {
            return Err(invalid("host and container port must both be set"));
        }

        Ok(Self {
            host_port: host_port.to_string(),
            container_port: container_port.to_string(),
        })
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

/// Parse every spec into the exposed-port set and the binding map.
///
/// A later spec for the same container port replaces the earlier binding.
pub fn port_bindings<S: AsRef<str>>(specs: &[S]) -> Result<(BTreeSet<String>, PortMap)> {
    let mut exposed = BTreeSet::new();
    let mut bindings = PortMap::new();

    for spec in specs {
        let port: PortSpec = spec.as_ref().parse()?;
        let key = port.exposed_port();
        exposed.insert(key.clone());
        bindings.insert(key, vec![port.binding()]);
    }

    Ok((exposed, bindings))
}
