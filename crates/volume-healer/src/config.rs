//! Process configuration.
//!
//! All settings arrive through command-line flags and are folded into
//! one [`Config`] value constructed at startup and passed by reference
//! into the components that need it.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Which strategy resolves the driver behind a claim.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum ResolverKind {
    /// Claim annotations and the bound PV, via the cluster API.
    #[default]
    Cluster,
    /// The kubelet's on-disk volume layout.
    Local,
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket paths of the CSI driver endpoints on this node.
    pub endpoints: Vec<String>,
    /// Root of the kubelet directory (the local volume layout lives
    /// underneath it).
    pub kubelet_path: PathBuf,
    /// Name of the node whose volumes are inspected.
    pub node_name: String,
    /// Path to a kubeconfig file; `None` selects in-cluster credentials.
    pub kubeconfig: Option<PathBuf>,
    /// Driver resolution strategy.
    pub resolver: ResolverKind,
}

impl Config {
    /// Split a comma-separated endpoint list, dropping empty segments.
    #[must_use]
    pub fn parse_endpoints(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check the settings that have no usable default.
    pub fn validate(&self) -> Result<()> {
        if self.node_name.is_empty() {
            return Err(Error::Config("node name is required".into()));
        }
        if self.endpoints.is_empty() {
            return Err(Error::Config("no CSI endpoints provided".into()));
        }
        Ok(())
    }
}
