//! Local image listing.

use crate::engine::ImageSummary;

/// Placeholder name for untagged images.
pub const UNTAGGED: &str = "<none>";

/// A local image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub id: String,
    /// First repository tag, or `<none>` for dangling images.
    pub name: String,
}

impl From<ImageSummary> for ImageDescriptor {
    fn from(summary: ImageSummary) -> Self {
        let name = summary
            .repo_tags
            .into_iter()
            .find(|tag| tag != "<none>:<none>")
            .unwrap_or_else(|| UNTAGGED.to_string());
        Self {
            id: summary.id,
            name,
        }
    }
}
