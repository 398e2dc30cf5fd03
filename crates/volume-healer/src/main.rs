//! Node-level remediation controller for CSI-backed volumes.
//!
//! One invocation runs one pass: fetch the node's volume stats, identify
//! and health-check the configured drivers, then walk every claim-backed
//! volume and recover it — bouncing the owning workload when the driver
//! can restage volumes, force-restarting the pod when it cannot.

mod cluster;
mod config;
mod error;
mod remediate;
mod stats;
mod volume;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cluster::{ClusterApi, KubeCluster};
use crate::config::{Config, ResolverKind};
use crate::error::Result;
use crate::remediate::{build_registry, health_check, Remediator};
use crate::volume::{ClusterDriverResolver, DriverResolver, LocalAgentResolver};

/// Recover CSI volumes on a node by bouncing or restarting their workloads
#[derive(Parser)]
#[command(name = "volume-healer")]
#[command(about = "Recover CSI volumes on a node by bouncing or restarting their workloads")]
#[command(version)]
struct Cli {
    /// Comma separated list of CSI driver endpoint sockets
    #[arg(long, default_value = "")]
    endpoints: String,

    /// Path to the kubelet directory
    #[arg(long, default_value = "/var/lib/kubelet")]
    kubelet_path: PathBuf,

    /// Name of the node whose volumes are inspected
    #[arg(long, default_value = "")]
    node_name: String,

    /// Path to the kubeconfig file (in-cluster credentials when omitted)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Strategy for resolving the driver behind a claim
    #[arg(long, value_enum, default_value = "cluster")]
    resolver: ResolverKind,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            endpoints: Config::parse_endpoints(&cli.endpoints),
            kubelet_path: cli.kubelet_path,
            node_name: cli.node_name,
            kubeconfig: cli.kubeconfig,
            resolver: cli.resolver,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting volume-healer"
    );

    let config = Config::from(Cli::parse());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                cancel.cancel();
            }
        }
    });

    if let Err(error) = run(&config, cancel).await {
        error!(error = %error, "remediation pass failed");
        std::process::exit(1);
    }
}

async fn run(config: &Config, cancel: CancellationToken) -> Result<()> {
    config.validate()?;

    let cluster: Arc<dyn ClusterApi> = Arc::new(KubeCluster::connect(config).await?);

    let summary = cluster.node_stats().await?;
    info!(
        node = %config.node_name,
        pods = summary.pods.len(),
        "fetched node volume stats"
    );

    let drivers = build_registry(&config.endpoints).await?;
    health_check(&drivers).await;

    let resolver: Box<dyn DriverResolver> = match config.resolver {
        ResolverKind::Cluster => Box::new(ClusterDriverResolver::new(cluster.clone())),
        ResolverKind::Local => Box::new(LocalAgentResolver::new(config.kubelet_path.clone())),
    };

    let remediator = Remediator::new(cluster, drivers, resolver, cancel);
    remediator.run(&summary).await;

    info!("remediation pass complete");
    Ok(())
}
