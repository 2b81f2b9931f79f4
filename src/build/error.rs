//! Error types for the image build pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for build and push operations.
pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// No context path was given and the working directory is unavailable.
    #[error("Could not resolve build context: {reason}")]
    PathResolution {
        /// Underlying I/O error.
        reason: String,
    },

    /// Walking or reading the context directory failed.
    #[error("Failed to archive build context at {path}: {reason}")]
    Archive {
        /// File or directory that could not be archived.
        path: PathBuf,
        /// Underlying error.
        reason: String,
    },

    /// The engine refused the build, either outright or partway through
    /// (a failing step).
    #[error("Build of '{tag}' was rejected: {reason}")]
    Submission {
        /// Tag requested for the image.
        tag: String,
        /// Engine message.
        reason: String,
        /// Progress received before the failure; empty when refused outright.
        output: String,
    },

    /// Registry credentials could not be serialized.
    #[error("Failed to encode registry credentials: {reason}")]
    AuthEncoding { reason: String },

    /// The engine or registry refused the push, either outright or
    /// partway through.
    #[error("Push of '{image}' was rejected: {reason}")]
    Push {
        /// Image reference that was pushed.
        image: String,
        /// Engine message.
        reason: String,
        /// Progress received before the failure; empty when refused outright.
        output: String,
    },

    /// The response stream could not be read to the end.
    #[error("Failed to read {operation} response: {reason}")]
    ResponseDrain {
        /// `"build"` or `"push"`.
        operation: &'static str,
        /// Underlying error.
        reason: String,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
