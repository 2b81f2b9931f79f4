//! Error types for network discovery.

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

#[derive(Debug, Error)]
pub enum NetworkError {
    /// No network carries the requested name.
    #[error("Network '{name}' not found")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
