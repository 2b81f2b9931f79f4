//! CLI command handling.
//!
//! Provides subcommands for:
//! - Inspecting the engine (`ps`, `networks`, `images`, `inspect`)
//! - Building and pushing images (`build`, `push`)
//! - Container lifecycle (`create`, `run`, `start`, `restart`, `rm`)
//! - Running commands in containers (`exec`)

mod containers;
mod images;

pub use containers::ContainerArgs;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ColorChoice, Parser, Subcommand};

use crate::engine::EngineClient;

#[derive(Parser, Debug)]
#[command(name = "whaler")]
#[command(about = "Build images and provision containers on a Docker engine")]
#[command(
    long_about = "Whaler talks to the Docker engine named by DOCKER_HOST (or the local socket).\nExamples:\n  whaler ps --all\n  whaler build --tag app:1.0 --context .\n  whaler run --name web --image nginx:latest --port 8080:80"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List containers
    Ps {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,
    },

    /// List networks
    Networks,

    /// List local images
    Images,

    /// Show a container's image, volumes, environment and ports
    Inspect {
        /// Container ID or name
        id: String,
    },

    /// Build an image from a directory
    #[command(long_about = "Archives the context directory and builds it.\nExample: whaler build --tag app:1.0 --context ./app")]
    Build {
        /// Context directory (default: current directory)
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Dockerfile path relative to the context (default: Dockerfile)
        #[arg(short = 'f', long)]
        dockerfile: Option<String>,

        /// Tag for the built image
        #[arg(short, long)]
        tag: String,
    },

    /// Push every tag of an image's repository
    Push {
        /// Image reference, e.g. registry.example.com/app:1.0
        image: String,

        /// Registry username
        #[arg(long, env = "WHALER_REGISTRY_USERNAME")]
        username: String,

        /// Registry password
        #[arg(long, env = "WHALER_REGISTRY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a container without starting it
    Create(ContainerArgs),

    /// Create a container and start it
    Run(ContainerArgs),

    /// Start a created container
    Start {
        /// Container ID or name
        id: String,
    },

    /// Restart a container
    Restart {
        /// Container ID or name
        identifier: String,

        /// Seconds to wait for the container to stop before killing it
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Remove a container
    Rm {
        /// Container ID or name
        id: String,

        /// Remove the container even if it is running
        #[arg(short, long)]
        force: bool,
    },

    /// Run a command in a container
    #[command(long_about = "Runs a command and prints its output.\nExample: whaler exec web -- ls -la /")]
    Exec {
        /// Container ID or name
        container: String,

        /// Command and arguments
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },
}

/// Run a command against `engine`.
pub async fn run_command(cmd: Command, engine: Arc<dyn EngineClient>) -> anyhow::Result<()> {
    match cmd {
        Command::Images => images::cmd_list(engine).await,
        Command::Build {
            context,
            dockerfile,
            tag,
        } => images::cmd_build(engine, context, dockerfile, tag).await,
        Command::Push {
            image,
            username,
            password,
        } => images::cmd_push(engine, &image, username, password).await,
        Command::Networks => containers::cmd_networks(engine).await,
        Command::Ps { all } => containers::cmd_ps(engine, all).await,
        Command::Inspect { id } => containers::cmd_inspect(engine, &id).await,
        Command::Create(args) => containers::cmd_create(engine, args, false).await,
        Command::Run(args) => containers::cmd_create(engine, args, true).await,
        Command::Start { id } => containers::cmd_start(engine, &id).await,
        Command::Restart {
            identifier,
            timeout,
        } => containers::cmd_restart(engine, &identifier, timeout).await,
        Command::Rm { id, force } => containers::cmd_rm(engine, &id, force).await,
        Command::Exec { container, cmd } => containers::cmd_exec(engine, &container, &cmd).await,
    }
}
