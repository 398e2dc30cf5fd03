//! Error taxonomy for the remediation controller.
//!
//! Startup-phase errors (configuration, cluster client construction,
//! stats retrieval, driver registry) are fatal and terminate the
//! process. Everything hit while iterating volumes is logged at the loop
//! boundary and the pass moves on to the next volume.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or invalid. Always fatal.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The driver control channel failed or answered garbage.
    #[error(transparent)]
    Protocol(#[from] csi_client::CsiError),

    /// A cluster API request failed (includes object-not-found).
    #[error("cluster API request failed: {0}")]
    ClusterApi(#[from] kube::Error),

    /// An update raced with a concurrent writer (HTTP 409).
    #[error("conflicting update to {resource}")]
    Conflict {
        /// Human-readable resource description, e.g. `Deployment ns/app`.
        resource: String,
    },

    /// Conflict retries were exhausted without a successful update.
    #[error("update to {resource} still conflicting after {attempts} attempts")]
    ConflictExhausted { resource: String, attempts: u32 },

    /// The pod's top owner is not a kind this controller can scale.
    #[error("unsupported owner kind: {kind}")]
    UnsupportedOwnerKind { kind: String },

    /// The pod has no owning controller, so deleting it would not get it
    /// recreated.
    #[error("no owner found for pod {pod} in namespace {namespace}")]
    NoOwnerFound { namespace: String, pod: String },

    /// The bound persistent volume has no CSI source.
    #[error("PV {pv} is not a CSI volume")]
    NotACsiVolume { pv: String },

    /// The ownership chain exceeded the walk bound; the cluster data is
    /// almost certainly cyclic or corrupt.
    #[error("owner chain in namespace {namespace} exceeds {depth} links")]
    OwnerChainTooDeep { namespace: String, depth: usize },

    /// The scaled-down workload never reached the target replica count
    /// within the configured window.
    #[error("timed out waiting for {kind} {namespace}/{name} to quiesce")]
    QuiesceTimeout {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Quiesce failed AND the attempt to restore the original replica
    /// count failed too: the workload may be stuck scaled to zero.
    #[error("failed to revert replicas after a failed scale-down: {revert} (scale-down failure: {quiesce})")]
    RevertFailed {
        quiesce: Box<Error>,
        revert: Box<Error>,
    },

    /// The local volume sidecar file does not exist.
    #[error("no volume data file at {path}")]
    VolumeDataNotFound { path: PathBuf },

    /// The local volume sidecar file could not be read.
    #[error("failed to read volume data at {path}: {source}")]
    VolumeDataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The local volume sidecar file is not valid JSON.
    #[error("malformed volume data at {path}: {source}")]
    MalformedVolumeData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The node stats summary did not decode.
    #[error("failed to decode the node stats summary: {0}")]
    StatsDecode(#[source] serde_json::Error),

    /// The operation was aborted by a shutdown request.
    #[error("operation cancelled by shutdown")]
    Cancelled,
}

impl Error {
    /// True for version-conflict failures that are worth retrying.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
