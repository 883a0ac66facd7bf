//! # Constants
//!
//! Shared constants used by the e2e support layer.
//!
//! These values represent the defaults of a standard knctl e2e environment and
//! can be overridden via environment variables (see [`crate::config`]).

/// Namespace the CLI under test operates in when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

/// CLI binary exercised by the e2e suite
pub const DEFAULT_KNCTL_BINARY: &str = "knctl";

/// Default log level for test processes
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Namespace holding the Istio ingress gateway services
pub const ISTIO_SYSTEM_NAMESPACE: &str = "istio-system";

/// Label key marking a Service as the Knative ingress gateway
pub const INGRESS_GATEWAY_LABEL_KEY: &str = "knative";

/// Label value marking a Service as the Knative ingress gateway
pub const INGRESS_GATEWAY_LABEL_VALUE: &str = "ingressgateway";

/// Node name of a single-node minikube cluster
/// Compared exactly, not as a pattern
pub const LOCAL_ENV_NODE_NAME: &str = "minikube";

/// Command printing the reachable IP of the minikube VM
pub const LOCAL_ENV_IP_COMMAND: &[&str] = &["minikube", "ip"];

/// Placeholder printed instead of arguments when a run is redacted
pub const REDACTED_PLACEHOLDER: &str = "-redacted-";

/// Node address types reachable from outside the cluster
/// `InternalIP` is never included
pub const EXTERNAL_NODE_ADDRESS_TYPES: &[&str] = &["Hostname", "ExternalIP", "ExternalDNS"];
