//! # Ingress Service Variants
//!
//! Uniform view over the two ways an ingress gateway Service can be exposed.
//!
//! - **LoadBalancer**: the cloud provider assigns ingress points; ports are not remapped.
//! - **NodePort**: every node exposes a fixed port; addresses come from node status.

use crate::cluster::ClusterQuery;
use crate::constants::EXTERNAL_NODE_ADDRESS_TYPES;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Service, ServicePort};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Exposure type of an ingress service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureType {
    LoadBalancer,
    NodePort,
}

impl ExposureType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureType::LoadBalancer => "LoadBalancer",
            ExposureType::NodePort => "NodePort",
        }
    }
}

impl fmt::Display for ExposureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ingress gateway Service, tagged by how it is exposed
#[derive(Debug, Clone)]
pub enum IngressService {
    LoadBalancer(LoadBalancerService),
    NodePort(NodePortService),
}

/// Ingress gateway exposed through a cloud load balancer
#[derive(Debug, Clone)]
pub struct LoadBalancerService {
    service: Service,
}

/// Ingress gateway exposed on a port of every node
#[derive(Clone)]
pub struct NodePortService {
    service: Service,
    cluster: Arc<dyn ClusterQuery>,
    local_env: LocalEnvironment,
}

impl fmt::Debug for NodePortService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePortService")
            .field("service", &self.service)
            .field("local_env", &self.local_env)
            .finish_non_exhaustive()
    }
}

/// Single-node local development cluster detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEnvironment {
    /// Exact name of the only node in such a cluster
    pub node_name: String,
    /// Program and arguments printing the cluster's reachable IP
    pub ip_command: Vec<String>,
}

impl IngressService {
    #[must_use]
    pub fn load_balancer(service: Service) -> Self {
        IngressService::LoadBalancer(LoadBalancerService { service })
    }

    #[must_use]
    pub fn node_port(
        service: Service,
        cluster: Arc<dyn ClusterQuery>,
        local_env: LocalEnvironment,
    ) -> Self {
        IngressService::NodePort(NodePortService {
            service,
            cluster,
            local_env,
        })
    }

    /// Underlying Service object
    #[must_use]
    pub fn service(&self) -> &Service {
        match self {
            IngressService::LoadBalancer(lb) => &lb.service,
            IngressService::NodePort(np) => &np.service,
        }
    }

    #[must_use]
    pub fn exposure_type(&self) -> ExposureType {
        match self {
            IngressService::LoadBalancer(_) => ExposureType::LoadBalancer,
            IngressService::NodePort(_) => ExposureType::NodePort,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.service().metadata.name.as_deref().unwrap_or_default()
    }

    /// Externally reachable addresses (IPs or hostnames), in encounter order
    ///
    /// Empty when nothing reachable is known yet. Never fails: a NodePort lookup that
    /// cannot list nodes or query the local environment yields no addresses.
    pub async fn addresses(&self) -> Vec<String> {
        match self {
            IngressService::LoadBalancer(lb) => lb.addresses(),
            IngressService::NodePort(np) => np.addresses().await,
        }
    }

    /// Exposed ports: logical ports for LoadBalancer, node ports for NodePort
    #[must_use]
    pub fn ports(&self) -> Vec<i32> {
        let ports = service_ports(self.service()).iter();
        match self {
            IngressService::LoadBalancer(_) => ports.map(|p| p.port).collect(),
            IngressService::NodePort(_) => ports.map(|p| p.node_port.unwrap_or_default()).collect(),
        }
    }

    /// Externally reachable port for logical `port`, or 0 if the service does not declare it
    #[must_use]
    pub fn mapped_port(&self, port: i32) -> i32 {
        let Some(declared) = service_ports(self.service())
            .iter()
            .find(|p| p.port == port)
        else {
            return 0;
        };

        match self {
            IngressService::LoadBalancer(_) => port,
            IngressService::NodePort(_) => declared.node_port.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.service()
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|timestamp| timestamp.0)
    }
}

impl LoadBalancerService {
    fn addresses(&self) -> Vec<String> {
        let ingress = self
            .service
            .status
            .as_ref()
            .and_then(|s| s.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_deref())
            .unwrap_or_default();

        ingress
            .iter()
            .flat_map(|point| point.ip.iter().chain(point.hostname.iter()))
            .filter(|addr| !addr.is_empty())
            .cloned()
            .collect()
    }
}

impl NodePortService {
    async fn addresses(&self) -> Vec<String> {
        let nodes = match self.cluster.list_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                // TODO: surface node listing failures once callers can handle them
                warn!("Failed to list nodes for service '{}': {}", self.name(), e);
                return Vec::new();
            }
        };

        if let [node] = nodes.as_slice() {
            if node.metadata.name.as_deref() == Some(self.local_env.node_name.as_str()) {
                return self.local_env.ip().await.into_iter().collect();
            }
        }

        nodes.iter().flat_map(external_addresses).collect()
    }

    fn name(&self) -> &str {
        self.service.metadata.name.as_deref().unwrap_or_default()
    }
}

impl LocalEnvironment {
    /// Run the IP command and return its output if it is a single IP literal
    async fn ip(&self) -> Option<String> {
        let (program, args) = self.ip_command.split_first()?;
        debug!("Querying local environment IP via '{}'", self.ip_command.join(" "));

        let output = match tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to execute '{}': {}", program, e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(
                "'{}' failed ({}): {}",
                self.ip_command.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if out.parse::<IpAddr>().is_ok() {
            Some(out)
        } else {
            warn!("Local environment IP output is not an IP address: '{}'", out);
            None
        }
    }
}

fn service_ports(service: &Service) -> &[ServicePort] {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_deref())
        .unwrap_or_default()
}

fn external_addresses(node: &Node) -> impl Iterator<Item = String> + '_ {
    node.status
        .as_ref()
        .and_then(|s| s.addresses.as_deref())
        .unwrap_or_default()
        .iter()
        .filter(|addr| EXTERNAL_NODE_ADDRESS_TYPES.contains(&addr.type_.as_str()))
        .map(|addr| addr.address.clone())
}
