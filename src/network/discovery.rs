//! Network listing and lookup by name.

use std::sync::Arc;

use crate::engine::{EngineClient, NetworkSummary};
use crate::network::error::{NetworkError, Result};

/// A named engine network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub name: String,
    pub id: String,
}

impl From<NetworkSummary> for NetworkDescriptor {
    fn from(n: NetworkSummary) -> Self {
        Self {
            name: n.name,
            id: n.id,
        }
    }
}

/// Lists and resolves engine networks.
#[derive(Clone)]
pub struct NetworkDiscovery {
    engine: Arc<dyn EngineClient>,
}

impl NetworkDiscovery {
    pub fn new(engine: Arc<dyn EngineClient>) -> Self {
        Self { engine }
    }

    /// All networks, in the order the engine reports them.
    pub async fn list_networks(&self) -> Result<Vec<NetworkDescriptor>> {
        let networks = self.engine.list_networks().await?;
        Ok(networks.into_iter().map(NetworkDescriptor::from).collect())
    }

    /// Find a network by exact, case-sensitive name.
    pub async fn find_network_by_name(&self, name: &str) -> Result<NetworkDescriptor> {
        let network = self
            .list_networks()
            .await?
            .into_iter()
            .find(|n| n.name == name)
            .ok_or_else(|| NetworkError::NotFound {
                name: name.to_string(),
            })?;

        tracing::debug!("Resolved network '{}' to {}", name, network.id);
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubEngine;

    fn discovery(engine: StubEngine) -> NetworkDiscovery {
        NetworkDiscovery::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_list_networks_keeps_engine_order() {
        let networks = discovery(
            StubEngine::new()
                .with_network("bridge", "b1")
                .with_network("appnet", "net123"),
        )
        .list_networks()
        .await
        .unwrap();

        let names: Vec<_> = networks.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["bridge", "appnet"]);
    }

    #[tokio::test]
    async fn test_find_network_by_name() {
        let network = discovery(
            StubEngine::new()
                .with_network("bridge", "b1")
                .with_network("appnet", "net123"),
        )
        .find_network_by_name("appnet")
        .await
        .unwrap();

        assert_eq!(
            network,
            NetworkDescriptor {
                name: "appnet".to_string(),
                id: "net123".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_find_network_is_case_sensitive() {
        let err = discovery(StubEngine::new().with_network("appnet", "net123"))
            .find_network_by_name("AppNet")
            .await
            .unwrap_err();

        assert!(matches!(err, NetworkError::NotFound { ref name } if name == "AppNet"));
        assert_eq!(err.to_string(), "Network 'AppNet' not found");
    }

    #[tokio::test]
    async fn test_find_network_in_empty_list() {
        let err = discovery(StubEngine::new())
            .find_network_by_name("appnet")
            .await
            .unwrap_err();

        assert!(matches!(err, NetworkError::NotFound { .. }));
    }
}
