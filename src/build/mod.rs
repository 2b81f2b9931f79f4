//! Image build pipeline.
//!
//! ```text
//! context dir ──walk (sorted)──▶ tar.gz in memory ──▶ engine build ──▶ drained text
//! image ref ──strip tag──▶ engine push (all tags, X-Registry-Auth) ──▶ drained text
//! ```
//!
//! A rejection reported before the first response chunk is a submission
//! error ([`BuildError::Submission`] or [`BuildError::Push`]). A failure
//! after that is [`BuildError::ResponseDrain`].

pub mod auth;
pub mod context;
pub mod error;
pub mod images;
pub mod pipeline;

pub use auth::RegistryCredentials;
pub use context::{ArchiveEntry, BuildContextArchive, EntryKind};
pub use error::{BuildError, Result};
pub use images::ImageDescriptor;
pub use pipeline::{DEFAULT_DOCKERFILE, ImageBuildRequest, ImageBuilder};
