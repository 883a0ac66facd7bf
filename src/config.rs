//! # E2E Configuration
//!
//! Suite-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_KNCTL_BINARY, DEFAULT_LOG_LEVEL, DEFAULT_NAMESPACE, ISTIO_SYSTEM_NAMESPACE,
    LOCAL_ENV_IP_COMMAND, LOCAL_ENV_NODE_NAME,
};

/// E2E suite configuration
///
/// All settings have defaults matching a standard knctl e2e environment and can be
/// overridden via environment variables.
#[derive(Debug, Clone)]
pub struct E2eConfig {
    /// Namespace appended as `-n <namespace>` to CLI invocations
    pub namespace: String,
    /// CLI binary under test (name on PATH or absolute path)
    pub knctl_binary: String,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Ingress discovery settings
    pub ingress: IngressConfig,
}

/// Ingress discovery configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressConfig {
    /// Namespace listed for ingress gateway services
    pub namespace: String,
    /// Node name identifying a single-node local development cluster
    pub local_node_name: String,
    /// Command (program followed by arguments) printing the local cluster IP
    pub local_ip_command: Vec<String>,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            knctl_binary: DEFAULT_KNCTL_BINARY.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            ingress: IngressConfig::default(),
        }
    }
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            namespace: ISTIO_SYSTEM_NAMESPACE.to_string(),
            local_node_name: LOCAL_ENV_NODE_NAME.to_string(),
            local_ip_command: LOCAL_ENV_IP_COMMAND
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl E2eConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            namespace: env_var_or_default_str("KNCTL_E2E_NAMESPACE", DEFAULT_NAMESPACE),
            knctl_binary: env_var_or_default_str("KNCTL_BINARY", DEFAULT_KNCTL_BINARY),
            log_level: env_var_or_default_str("KNCTL_E2E_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            ingress: IngressConfig::from_env(),
        }
    }
}

impl IngressConfig {
    /// Load ingress discovery configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env_var_or_default_str("KNCTL_E2E_INGRESS_NAMESPACE", &defaults.namespace),
            local_node_name: env_var_or_default_str(
                "KNCTL_E2E_LOCAL_NODE_NAME",
                &defaults.local_node_name,
            ),
            local_ip_command: env_var_words("KNCTL_E2E_LOCAL_IP_COMMAND")
                .unwrap_or(defaults.local_ip_command),
        }
    }
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Read environment variable as a whitespace-separated command line
fn env_var_words(key: &str) -> Option<Vec<String>> {
    let words: Vec<String> = std::env::var(key)
        .ok()?
        .split_whitespace()
        .map(ToString::to_string)
        .collect();
    (!words.is_empty()).then_some(words)
}
