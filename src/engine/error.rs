//! Error types for engine calls.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors reported by an [`EngineClient`](super::EngineClient).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached at all.
    #[error("Docker not available: {reason}")]
    Unavailable {
        /// Reason why the engine is unreachable.
        reason: String,
    },

    /// The engine answered and refused the request. The message is the
    /// engine's own, passed through as-is.
    #[error("{message}")]
    Rejected {
        /// HTTP status returned by the engine. A failure reported inside a
        /// streamed build or push response carries that response's 200.
        status: u16,
        /// Engine-supplied message.
        message: String,
    },

    /// Transport failure while talking to the engine (connection reset,
    /// timeout, malformed payload).
    #[error("Engine transport error: {reason}")]
    Transport {
        /// Underlying failure.
        reason: String,
    },

    /// The request could not be turned into an engine call.
    #[error("Invalid engine request: {reason}")]
    InvalidRequest {
        /// What was wrong.
        reason: String,
    },

    /// The engine answered with something the client does not understand.
    #[error("Unexpected engine response: {reason}")]
    UnexpectedResponse {
        /// What was unexpected.
        reason: String,
    },
}

impl EngineError {
    /// Whether the engine reported that the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Rejected { status: 404, .. })
    }
}
