//! Common test utilities for ingress discovery and command runner tests
//!
//! Provides an in-memory [`ClusterQuery`] and builders for Service and Node fixtures.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Service};
use knctl_e2e::cluster::{ClusterQuery, ClusterQueryError};
use knctl_e2e::config::IngressConfig;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Initialise test logging once per test binary
pub fn init_logging() {
    knctl_e2e::logging::init_for_tests("knctl_e2e=debug");
}

/// In-memory cluster
///
/// Returns the configured services for any namespace/selector and records the
/// queries it received.
#[derive(Debug, Default)]
pub struct FakeCluster {
    services: Vec<Service>,
    nodes: Vec<Node>,
    fail_services: Option<String>,
    fail_nodes: Option<String>,
    service_queries: Mutex<Vec<(String, String)>>,
    node_queries: AtomicUsize,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(mut self, services: Vec<Service>) -> Self {
        self.services = services;
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn failing_services(mut self, message: &str) -> Self {
        self.fail_services = Some(message.to_string());
        self
    }

    pub fn failing_nodes(mut self, message: &str) -> Self {
        self.fail_nodes = Some(message.to_string());
        self
    }

    pub fn service_queries(&self) -> Vec<(String, String)> {
        self.service_queries.lock().expect("queries lock").clone()
    }

    pub fn node_queries(&self) -> usize {
        self.node_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterQuery for FakeCluster {
    async fn list_services(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Service>, ClusterQueryError> {
        self.service_queries
            .lock()
            .expect("queries lock")
            .push((namespace.to_string(), label_selector.to_string()));

        match &self.fail_services {
            Some(message) => Err(ClusterQueryError::Unavailable(message.clone())),
            None => Ok(self.services.clone()),
        }
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClusterQueryError> {
        self.node_queries.fetch_add(1, Ordering::SeqCst);

        match &self.fail_nodes {
            Some(message) => Err(ClusterQueryError::Unavailable(message.clone())),
            None => Ok(self.nodes.clone()),
        }
    }
}

/// Discovery config whose local IP command prints `output`
pub fn ingress_config_with_local_ip(output: &str) -> IngressConfig {
    IngressConfig {
        local_ip_command: vec!["echo".to_string(), output.to_string()],
        ..IngressConfig::default()
    }
}

/// LoadBalancer Service with logical ports and ingress points `(ip, hostname)`
pub fn load_balancer_service(
    name: &str,
    ports: &[i32],
    ingress: &[(Option<&str>, Option<&str>)],
) -> Service {
    let ports: Vec<_> = ports.iter().map(|p| json!({ "port": p })).collect();
    let ingress: Vec<_> = ingress
        .iter()
        .map(|(ip, hostname)| json!({ "ip": ip, "hostname": hostname }))
        .collect();

    service(json!({
        "metadata": {
            "name": name,
            "namespace": "istio-system",
            "labels": { "knative": "ingressgateway" }
        },
        "spec": { "type": "LoadBalancer", "ports": ports },
        "status": { "loadBalancer": { "ingress": ingress } }
    }))
}

/// NodePort Service with `(logical port, node port)` pairs
pub fn node_port_service(name: &str, ports: &[(i32, i32)]) -> Service {
    let ports: Vec<_> = ports
        .iter()
        .map(|(port, node_port)| json!({ "port": port, "nodePort": node_port }))
        .collect();

    service(json!({
        "metadata": {
            "name": name,
            "namespace": "istio-system",
            "labels": { "knative": "ingressgateway" }
        },
        "spec": { "type": "NodePort", "ports": ports }
    }))
}

/// Service of any other type (ClusterIP, ExternalName)
pub fn typed_service(name: &str, service_type: &str, ports: &[i32]) -> Service {
    let ports: Vec<_> = ports.iter().map(|p| json!({ "port": p })).collect();

    service(json!({
        "metadata": { "name": name, "namespace": "istio-system" },
        "spec": { "type": service_type, "ports": ports, "externalName": "gateway.example.com" }
    }))
}

/// Node with `(type, address)` status addresses
pub fn node(name: &str, addresses: &[(&str, &str)]) -> Node {
    let addresses: Vec<_> = addresses
        .iter()
        .map(|(kind, address)| json!({ "type": kind, "address": address }))
        .collect();

    serde_json::from_value(json!({
        "metadata": { "name": name },
        "status": { "addresses": addresses }
    }))
    .expect("valid Node fixture")
}

fn service(value: serde_json::Value) -> Service {
    serde_json::from_value(value).expect("valid Service fixture")
}
