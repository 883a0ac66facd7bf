//! knctl E2E Support Library
//!
//! Test-support layer for the knctl end-to-end suite:
//!
//! - [`runner`]: runs the CLI under test as a child process, with namespace
//!   injection, output capture, cancellation, and redaction
//! - [`ingress`]: discovers the externally reachable address of the Knative ingress
//!   gateway, for LoadBalancer and NodePort exposed gateways
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use knctl_e2e::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = E2eConfig::from_env();
//! knctl_e2e::logging::init_for_tests(&config.log_level);
//!
//! let knctl = CommandRunner::from_config(&config);
//! knctl.run(&["deploy", "-s", "hello", "-i", "gcr.io/knative-samples/helloworld-go"]).await;
//!
//! let cluster = Arc::new(KubeClusterQuery::try_default().await?);
//! let ingress = IngressServices::new(cluster, config.ingress.clone());
//! let (address, port) = ingress.preferred_address(80).await?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod constants;
pub mod ingress;
pub mod logging;
pub mod prelude;
pub mod runner;
