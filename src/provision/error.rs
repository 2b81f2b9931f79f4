//! Error types for container provisioning.

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The requested network does not exist.
    #[error("Network '{name}' not found")]
    NetworkNotFound {
        /// Network name from the request.
        name: String,
    },

    /// A port spec is not of the form `host:container`.
    #[error("Invalid port spec '{spec}': {reason}")]
    PortSpec {
        /// The offending spec, verbatim.
        spec: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The engine refused to create the container.
    #[error("Failed to create container '{name}': {reason}")]
    ContainerCreate {
        /// Container name.
        name: String,
        /// Engine message.
        reason: String,
    },

    /// No container matches the given name or ID.
    #[error("Container '{identifier}' not found")]
    ContainerNotFound {
        /// Name or ID that was looked up.
        identifier: String,
    },

    /// The engine listed a container without any name.
    #[error("Container '{id}' has no name")]
    MissingContainerName {
        /// Container ID.
        id: String,
    },

    /// The engine refused to create an exec session.
    #[error("Failed to create exec session in container '{container}': {reason}")]
    ExecCreate {
        /// Container ID.
        container: String,
        /// Engine message.
        reason: String,
    },

    /// The engine created an exec session but returned no ID for it.
    #[error("Exec session in container '{container}' returned an empty ID")]
    ExecIdEmpty {
        /// Container ID.
        container: String,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
