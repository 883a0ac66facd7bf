//! # Ingress Discovery
//!
//! Finds the externally reachable address of the Knative ingress gateway.
//!
//! Ingress gateway Services are the Services in the Istio system namespace labelled
//! `knative=ingressgateway`. Each is wrapped as an [`IngressService`] according to how
//! it is exposed; `ClusterIP` and `ExternalName` services are not reachable from the
//! test host and are skipped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use knctl_e2e::cluster::KubeClusterQuery;
//! use knctl_e2e::config::IngressConfig;
//! use knctl_e2e::ingress::IngressServices;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cluster = Arc::new(KubeClusterQuery::try_default().await?);
//! let ingress = IngressServices::new(cluster, IngressConfig::from_env());
//!
//! let (address, port) = ingress.preferred_address(80).await?;
//! println!("http://{address}:{port}");
//! # Ok(())
//! # }
//! ```

pub mod service;

pub use service::{ExposureType, IngressService, LocalEnvironment};

use crate::cluster::{label_selector, ClusterQuery, ClusterQueryError};
use crate::config::IngressConfig;
use crate::constants::{INGRESS_GATEWAY_LABEL_KEY, INGRESS_GATEWAY_LABEL_VALUE};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Error returned by ingress discovery
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("Listing services in namespace '{namespace}': {source}")]
    Listing {
        namespace: String,
        #[source]
        source: ClusterQueryError,
    },
    #[error("Expected to find at least one ingress address")]
    NoIngressAddress,
}

/// Ingress gateway discovery over a cluster query capability
#[derive(Clone)]
pub struct IngressServices {
    cluster: Arc<dyn ClusterQuery>,
    config: IngressConfig,
}

impl fmt::Debug for IngressServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngressServices")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IngressServices {
    pub fn new(cluster: Arc<dyn ClusterQuery>, config: IngressConfig) -> Self {
        Self { cluster, config }
    }

    /// List ingress gateway services in listing order
    ///
    /// Only LoadBalancer and NodePort services are returned.
    pub async fn list(&self) -> Result<Vec<IngressService>, IngressError> {
        let selector = label_selector(&[(INGRESS_GATEWAY_LABEL_KEY, INGRESS_GATEWAY_LABEL_VALUE)]);

        let services = self
            .cluster
            .list_services(&self.config.namespace, &selector)
            .await
            .map_err(|source| IngressError::Listing {
                namespace: self.config.namespace.clone(),
                source,
            })?;

        let local_env = LocalEnvironment {
            node_name: self.config.local_node_name.clone(),
            ip_command: self.config.local_ip_command.clone(),
        };

        let mut ingress_services = Vec::with_capacity(services.len());

        for service in services {
            let service_type = service
                .spec
                .as_ref()
                .and_then(|spec| spec.type_.as_deref())
                .unwrap_or("ClusterIP")
                .to_string();

            match service_type.as_str() {
                "LoadBalancer" => ingress_services.push(IngressService::load_balancer(service)),
                "NodePort" => ingress_services.push(IngressService::node_port(
                    service,
                    Arc::clone(&self.cluster),
                    local_env.clone(),
                )),
                // ClusterIP, ExternalName: not reachable from outside the cluster
                other => debug!(
                    "Skipping ingress service '{}' of type {}",
                    service.metadata.name.as_deref().unwrap_or_default(),
                    other
                ),
            }
        }

        debug!(
            "Found {} ingress service(s) in namespace '{}'",
            ingress_services.len(),
            self.config.namespace
        );
        Ok(ingress_services)
    }

    /// Address and port through which logical `port` of the ingress gateway is reachable
    ///
    /// Returns the first service, in listing order, that has at least one address and
    /// maps `port`. The port is returned as a decimal string.
    pub async fn preferred_address(&self, port: i32) -> Result<(String, String), IngressError> {
        for service in self.list().await? {
            let mapped = service.mapped_port(port);
            if mapped == 0 {
                debug!("Ingress service '{}' does not map port {}", service.name(), port);
                continue;
            }

            let Some(address) = service.addresses().await.into_iter().next() else {
                debug!("Ingress service '{}' has no reachable address", service.name());
                continue;
            };

            info!(
                "Using {} ingress service '{}' at {}:{}",
                service.exposure_type(),
                service.name(),
                address,
                mapped
            );
            return Ok((address, mapped.to_string()));
        }

        Err(IngressError::NoIngressAddress)
    }
}
