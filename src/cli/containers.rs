//! Container and network CLI commands.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::engine::{EngineClient, OutputChunk};
use crate::network::NetworkDiscovery;
use crate::provision::{ContainerProvisionRequest, Provisioner};

/// Flags describing a container to create.
#[derive(Args, Debug, Clone)]
pub struct ContainerArgs {
    /// Container name
    #[arg(long)]
    pub name: String,

    /// Image reference, e.g. nginx:latest
    #[arg(long)]
    pub image: String,

    /// Bind mount as hostPath:containerPath (repeatable)
    #[arg(short, long = "volume")]
    pub volumes: Vec<String>,

    /// Environment entry as KEY=value (repeatable)
    #[arg(short, long)]
    pub env: Vec<String>,

    /// Published port as hostPort:containerPort (repeatable)
    #[arg(short, long = "port")]
    pub ports: Vec<String>,

    /// Network to attach the container to
    #[arg(long)]
    pub network: Option<String>,
}

impl From<ContainerArgs> for ContainerProvisionRequest {
    fn from(args: ContainerArgs) -> Self {
        Self {
            name: args.name,
            image: args.image,
            volumes: Some(args.volumes),
            env: args.env,
            ports: args.ports,
            network_name: args.network,
        }
    }
}

pub(super) async fn cmd_networks(engine: Arc<dyn EngineClient>) -> anyhow::Result<()> {
    let networks = NetworkDiscovery::new(engine).list_networks().await?;

    if networks.is_empty() {
        println!("No networks found.");
        return Ok(());
    }

    println!("{:<24} ID", "NAME");
    for network in networks {
        println!("{:<24} {}", network.name, network.id);
    }
    Ok(())
}

pub(super) async fn cmd_ps(engine: Arc<dyn EngineClient>, all: bool) -> anyhow::Result<()> {
    let containers = Provisioner::new(engine).list_containers(all).await?;

    if containers.is_empty() {
        if all {
            println!("No containers found.");
        } else {
            println!("No running containers. Use --all to include stopped ones.");
        }
        return Ok(());
    }

    println!("{:<14} {:<24} IMAGE", "ID", "NAME");
    for container in containers {
        println!(
            "{:<14} {:<24} {}",
            short_id(&container.id),
            container.name,
            container.image
        );
    }
    Ok(())
}

pub(super) async fn cmd_inspect(engine: Arc<dyn EngineClient>, id: &str) -> anyhow::Result<()> {
    let container = Provisioner::new(engine).inspect_container(id).await?;

    println!("{} ({})", container.name, container.id);
    println!("  Image: {}", container.image);
    print_list("Volumes", &container.volumes);
    print_list("Env", &container.env);
    print_list("Ports", &container.ports);
    Ok(())
}

pub(super) async fn cmd_create(
    engine: Arc<dyn EngineClient>,
    args: ContainerArgs,
    start: bool,
) -> anyhow::Result<()> {
    let provisioner = Provisioner::new(engine);
    let request = ContainerProvisionRequest::from(args);

    let id = provisioner.create_container(&request).await?;
    if start {
        provisioner.start_container(&id).await?;
    }

    println!("{}", id);
    Ok(())
}

pub(super) async fn cmd_start(engine: Arc<dyn EngineClient>, id: &str) -> anyhow::Result<()> {
    Provisioner::new(engine).start_container(id).await?;
    println!("{}", id);
    Ok(())
}

pub(super) async fn cmd_restart(
    engine: Arc<dyn EngineClient>,
    identifier: &str,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    Provisioner::new(engine)
        .restart_container(identifier, timeout.map(Duration::from_secs))
        .await?;
    println!("{}", identifier);
    Ok(())
}

pub(super) async fn cmd_rm(engine: Arc<dyn EngineClient>, id: &str, force: bool) -> anyhow::Result<()> {
    Provisioner::new(engine).remove_container(id, force).await?;
    println!("{}", id);
    Ok(())
}

pub(super) async fn cmd_exec(
    engine: Arc<dyn EngineClient>,
    container: &str,
    cmd: &[String],
) -> anyhow::Result<()> {
    let mut output = Provisioner::new(engine).exec(container, cmd).await?;

    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    while let Some(chunk) = output.next().await {
        match chunk? {
            OutputChunk::StdErr(bytes) => stderr.write_all(&bytes).await?,
            OutputChunk::StdOut(bytes) | OutputChunk::Console(bytes) => {
                stdout.write_all(&bytes).await?
            }
        }
    }
    stdout.flush().await?;
    stderr.flush().await?;
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        println!("  {}: (none)", label);
    } else {
        println!("  {}:", label);
        for item in items {
            println!("    {}", item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_into_request() {
        let args = ContainerArgs {
            name: "web".to_string(),
            image: "nginx:latest".to_string(),
            volumes: vec!["/srv:/data".to_string()],
            env: vec!["MODE=prod".to_string()],
            ports: vec!["8080:80".to_string()],
            network: Some("appnet".to_string()),
        };

        let request = ContainerProvisionRequest::from(args);

        assert_eq!(
            request,
            ContainerProvisionRequest::new("web", "nginx:latest")
                .with_volume("/srv:/data")
                .with_env("MODE=prod")
                .with_port("8080:80")
                .with_network("appnet")
        );
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
