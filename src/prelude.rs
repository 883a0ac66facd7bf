//! # Prelude
//!
//! Re-exports the types an e2e test typically needs.
//!
//! ```rust
//! use knctl_e2e::prelude::*;
//! ```

pub use crate::cluster::{ClusterQuery, ClusterQueryError, KubeClusterQuery};
pub use crate::config::{E2eConfig, IngressConfig};
pub use crate::ingress::{ExposureType, IngressError, IngressService, IngressServices};
pub use crate::runner::{CommandError, CommandRunner, FailureReporter, PanicReporter, RunOpts};
