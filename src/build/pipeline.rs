//! Build and push requests against the engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;

use crate::build::auth::RegistryCredentials;
use crate::build::context::BuildContextArchive;
use crate::build::error::{BuildError, Result};
use crate::build::images::ImageDescriptor;
use crate::engine::{BuildSpec, EngineClient, EngineError, PushSpec, ResponseBody};

/// Dockerfile used when a request does not name one.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Network mode for `RUN` steps during a build.
const BUILD_NETWORK_MODE: &str = "bridge";

/// One image build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageBuildRequest {
    /// Context directory; `None` uses the current working directory.
    pub context_path: Option<PathBuf>,
    /// Dockerfile path relative to the context; `None` uses `Dockerfile`.
    pub dockerfile: Option<String>,
    /// Tag for the resulting image, e.g. `app:1.0`.
    pub tag: String,
}

impl ImageBuildRequest {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, path: impl Into<PathBuf>) -> Self {
        self.context_path = Some(path.into());
        self
    }

    pub fn with_dockerfile(mut self, dockerfile: impl Into<String>) -> Self {
        self.dockerfile = Some(dockerfile.into());
        self
    }

    fn dockerfile(&self) -> &str {
        self.dockerfile.as_deref().unwrap_or(DEFAULT_DOCKERFILE)
    }
}

/// Builds images from directory contexts and pushes them to registries.
#[derive(Clone)]
pub struct ImageBuilder {
    engine: Arc<dyn EngineClient>,
}

impl ImageBuilder {
    pub fn new(engine: Arc<dyn EngineClient>) -> Self {
        Self { engine }
    }

    /// Build an image and return the engine's full response as text.
    ///
    /// The response is the engine's JSON progress stream, one object per
    /// line. A failing build step ends the build with
    /// [`BuildError::Submission`] carrying the engine's message and the
    /// progress received up to that point.
    pub async fn build(&self, request: &ImageBuildRequest) -> Result<String> {
        let context = resolve_context(request.context_path.as_deref())?;

        let archive = tokio::task::spawn_blocking({
            let context = context.clone();
            move || BuildContextArchive::from_dir(&context)
        })
        .await
        .map_err(|e| BuildError::Archive {
            path: context.clone(),
            reason: e.to_string(),
        })??;

        tracing::info!(
            "Building image '{}' from {} ({} entries, {} bytes)",
            request.tag,
            context.display(),
            archive.entries().len(),
            archive.len()
        );

        let spec = BuildSpec {
            dockerfile: request.dockerfile().to_string(),
            tag: request.tag.clone(),
            network_mode: BUILD_NETWORK_MODE.to_string(),
            no_cache: true,
        };
        let body = self
            .engine
            .build_image(spec, archive.into_bytes())
            .await
            .map_err(|e| BuildError::Submission {
                tag: request.tag.clone(),
                reason: e.to_string(),
                output: String::new(),
            })?;

        drain_response("build", body, |reason, output| BuildError::Submission {
            tag: request.tag.clone(),
            reason,
            output,
        })
        .await
    }

    /// Push every tag of `image`'s repository and return the engine's
    /// response as text.
    ///
    /// A refusal reported partway through (e.g. registry `denied`) is a
    /// [`BuildError::Push`] with the progress received so far.
    pub async fn publish(&self, image: &str, credentials: &RegistryCredentials) -> Result<String> {
        let registry_auth = credentials.encode()?;
        let repository = repository_of(image);

        tracing::info!("Pushing {} as {}", repository, credentials.username);

        let spec = PushSpec {
            tag: None,
            registry_auth,
        };
        let body = self
            .engine
            .push_image(repository, spec)
            .await
            .map_err(|e| BuildError::Push {
                image: image.to_string(),
                reason: e.to_string(),
                output: String::new(),
            })?;

        drain_response("push", body, |reason, output| BuildError::Push {
            image: image.to_string(),
            reason,
            output,
        })
        .await
    }

    /// Local images, in the order the engine reports them.
    pub async fn list_images(&self) -> Result<Vec<ImageDescriptor>> {
        let images = self.engine.list_images().await?;
        Ok(images.into_iter().map(ImageDescriptor::from).collect())
    }
}

fn resolve_context(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => std::env::current_dir().map_err(|e| BuildError::PathResolution {
            reason: e.to_string(),
        }),
    }
}

/// Repository part of an image reference, without tag or digest.
fn repository_of(image: &str) -> &str {
    let image = image.split_once('@').map_or(image, |(repo, _)| repo);
    match image.rfind(':') {
        Some(i) if !image[i..].contains('/') => &image[..i],
        _ => image,
    }
}

/// Read `body` to the end as text.
///
/// An engine refusal inside the stream goes through `rejected` with the
/// engine's message and the text read so far. Any other failure is a
/// [`BuildError::ResponseDrain`].
async fn drain_response(
    operation: &'static str,
    mut body: ResponseBody<'_>,
    rejected: impl FnOnce(String, String) -> BuildError,
) -> Result<String> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(EngineError::Rejected { message, .. }) => {
                tracing::warn!("Engine reported {} failure: {}", operation, message);
                return Err(rejected(message, String::from_utf8_lossy(&buf).into_owned()));
            }
            Err(e) => {
                return Err(BuildError::ResponseDrain {
                    operation,
                    reason: e.to_string(),
                });
            }
        };
        tracing::trace!("{} response chunk of {} bytes", operation, chunk.len());
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
