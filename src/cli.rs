//! # e2e-ingress CLI
//!
//! Inspects the Knative ingress gateway of the current cluster the same way the
//! e2e suite does, so an environment can be checked before running the suite.
//!
//! ## Usage
//!
//! ```bash
//! # List ingress gateway services with their addresses and ports
//! e2e-ingress list
//!
//! # Print the address the suite would use for port 80
//! e2e-ingress address --port 80
//!
//! # Look in a different namespace
//! e2e-ingress --ingress-namespace my-istio list
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use knctl_e2e::cluster::KubeClusterQuery;
use knctl_e2e::config::E2eConfig;
use knctl_e2e::ingress::IngressServices;
use std::sync::Arc;
use tracing::debug;

/// knctl e2e ingress inspection
#[derive(Parser)]
#[command(name = "e2e-ingress")]
#[command(
    about = "Inspect the Knative ingress gateway used by the knctl e2e suite",
    long_about = None,
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("BUILD_GIT_HASH"),
        " ",
        env!("BUILD_DATETIME"),
        ")"
    )
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Namespace holding the ingress gateway services
    #[arg(long, global = true)]
    ingress_namespace: Option<String>,

    /// Node name identifying a single-node local cluster
    #[arg(long, global = true)]
    local_node_name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List ingress gateway services
    List,
    /// Print the preferred address and port for a logical port
    Address {
        /// Logical port of the ingress gateway
        #[arg(short, long, default_value_t = 80)]
        port: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider before the Kubernetes client is created
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();

    let mut config = E2eConfig::from_env();
    let level = &config.log_level;
    knctl_e2e::logging::init(&format!("knctl_e2e={level},e2e_ingress={level}"));

    if let Some(namespace) = cli.ingress_namespace {
        config.ingress.namespace = namespace;
    }
    if let Some(node_name) = cli.local_node_name {
        config.ingress.local_node_name = node_name;
    }

    let cluster = Arc::new(KubeClusterQuery::try_default().await?);
    let ingress = IngressServices::new(cluster, config.ingress);

    match cli.command {
        Commands::List => list_command(&ingress).await,
        Commands::Address { port } => address_command(&ingress, port).await,
    }
}

async fn list_command(ingress: &IngressServices) -> Result<()> {
    let services = ingress
        .list()
        .await
        .context("Failed to list ingress services")?;

    if services.is_empty() {
        println!("No ingress services found.");
        return Ok(());
    }

    println!(
        "{:<30} {:<14} {:<40} {:<20} {:<8}",
        "NAME", "TYPE", "ADDRESSES", "PORTS", "AGE"
    );
    println!("{}", "-".repeat(116));

    let now = Utc::now();
    for service in services {
        let addresses = service.addresses().await;
        let addresses = if addresses.is_empty() {
            "<pending>".to_string()
        } else {
            addresses.join(",")
        };
        let ports = service
            .ports()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let age = service
            .creation_time()
            .map_or_else(|| "-".to_string(), |created| format_age(created, now));

        println!(
            "{:<30} {:<14} {:<40} {:<20} {:<8}",
            service.name(),
            service.exposure_type(),
            addresses,
            ports,
            age
        );
    }

    Ok(())
}

async fn address_command(ingress: &IngressServices, port: i32) -> Result<()> {
    let (address, mapped_port) = ingress
        .preferred_address(port)
        .await
        .with_context(|| format!("Failed to find ingress address for port {port}"))?;
    println!("{address}:{mapped_port}");
    Ok(())
}

/// Age in the largest whole unit, kubectl style
fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}
