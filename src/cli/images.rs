//! Image CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use crate::build::{BuildError, ImageBuildRequest, ImageBuilder, RegistryCredentials};
use crate::engine::EngineClient;

pub(super) async fn cmd_list(engine: Arc<dyn EngineClient>) -> anyhow::Result<()> {
    let images = ImageBuilder::new(engine).list_images().await?;

    if images.is_empty() {
        println!("No images found.");
        return Ok(());
    }

    println!("{:<40} ID", "NAME");
    for image in images {
        println!("{:<40} {}", image.name, image.id);
    }
    Ok(())
}

pub(super) async fn cmd_build(
    engine: Arc<dyn EngineClient>,
    context: Option<PathBuf>,
    dockerfile: Option<String>,
    tag: String,
) -> anyhow::Result<()> {
    let request = ImageBuildRequest {
        context_path: context,
        dockerfile,
        tag,
    };
    let result = ImageBuilder::new(engine).build(&request).await;
    print_progress(result)
}

pub(super) async fn cmd_push(
    engine: Arc<dyn EngineClient>,
    image: &str,
    username: String,
    password: String,
) -> anyhow::Result<()> {
    let credentials = RegistryCredentials::new(username, password);
    let result = ImageBuilder::new(engine).publish(image, &credentials).await;
    print_progress(result)
}

/// Print the engine's progress, including what arrived before a failure.
fn print_progress(result: Result<String, BuildError>) -> anyhow::Result<()> {
    match result {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            if let BuildError::Submission { output, .. } | BuildError::Push { output, .. } = &e {
                print!("{}", output);
            }
            Err(e.into())
        }
    }
}
