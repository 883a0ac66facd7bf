//! # Cluster Query
//!
//! Read-only access to the cluster objects ingress discovery needs.
//!
//! [`ClusterQuery`] is the seam between discovery logic and the Kubernetes API.
//! [`KubeClusterQuery`] talks to a live cluster through `kube`; tests provide
//! in-memory implementations.

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Service};
use kube::api::{Api, ListParams};
use kube::Client;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Error returned by a cluster query
#[derive(Debug, Error)]
pub enum ClusterQueryError {
    #[error("{0}")]
    Kube(#[from] kube::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Cluster query capability
///
/// Implementations must be safe for concurrent read-only use: parallel tests share
/// one instance.
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// List services in `namespace` matching `label_selector` (`key=value[,key=value]`)
    async fn list_services(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Service>, ClusterQueryError>;

    /// List all nodes in the cluster
    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterQueryError>;
}

/// [`ClusterQuery`] backed by a `kube` client
#[derive(Clone)]
pub struct KubeClusterQuery {
    client: Client,
}

impl fmt::Debug for KubeClusterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeClusterQuery").finish_non_exhaustive()
    }
}

impl KubeClusterQuery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the default kubeconfig or in-cluster configuration
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterQuery for KubeClusterQuery {
    async fn list_services(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Service>, ClusterQueryError> {
        debug!(
            "Listing services in namespace '{}' with selector '{}'",
            namespace, label_selector
        );
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let services = api
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(services.items)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterQueryError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api.list(&ListParams::default()).await?;
        Ok(nodes.items)
    }
}

/// Build a label selector string from key/value pairs
pub fn label_selector(labels: &[(&str, &str)]) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
