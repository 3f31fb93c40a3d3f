//! Router configuration.
//!
//! Loaded from a TOML file with `[routing]` and `[topology]` sections, e.g.:
//!
//! ```toml
//! [routing]
//! dispatch_timeout_ms = 5000
//!
//! [topology]
//! seed_nodes = ["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7003"]
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use crate::error::{Result, RouterError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level router configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub routing: RoutingConfig,
    pub topology: TopologyConfig,
}

/// Dispatch behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Deadline for one whole dispatch call, in milliseconds. Sub-requests
    /// still running when it expires report `Timeout` for their keys.
    pub dispatch_timeout_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: 5000,
        }
    }
}

/// Topology bootstrap hints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Initial contact points handed to the discovery collaborator. The
    /// router itself never dials these; discovery is external.
    pub seed_nodes: Vec<String>,
}

impl RouterConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RouterError::Config(format!("failed to read config file: {}", e)))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| RouterError::Config(e.to_string()))
    }

    /// Dispatch deadline as a `Duration`.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.routing.dispatch_timeout_ms)
    }
}
