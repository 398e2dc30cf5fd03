//! Ownership-chain resolution.
//!
//! Walks a pod's owner references upward to the top-level controller.
//! Only the first owner reference is considered when several exist; the
//! walk is bounded so cyclic or corrupt cluster data cannot hang it.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use std::fmt;

use super::ClusterApi;
use crate::error::{Error, Result};

/// Upper bound on ownership links followed before giving up.
pub const MAX_OWNER_DEPTH: usize = 8;

/// Kind of the top-level owner of a pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    /// A controller kind this component does not know; still treated as
    /// the top of the chain.
    Other(String),
    /// The pod has no owner at all.
    None,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::Deployment => f.write_str("Deployment"),
            OwnerKind::StatefulSet => f.write_str("StatefulSet"),
            OwnerKind::DaemonSet => f.write_str("DaemonSet"),
            OwnerKind::Other(kind) => f.write_str(kind),
            OwnerKind::None => Ok(()),
        }
    }
}

/// Result of an ownership walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopOwner {
    pub name: String,
    pub kind: OwnerKind,
}

impl TopOwner {
    /// The "no owner" result: empty name, kind none.
    #[must_use]
    pub fn none() -> Self {
        Self {
            name: String::new(),
            kind: OwnerKind::None,
        }
    }
}

/// Walk the ownership chain starting from `owner_refs` and return the
/// top-level controller.
///
/// ReplicaSets are looked up and walked through; Deployments,
/// StatefulSets, DaemonSets, and unrecognized kinds terminate the walk.
/// Lookup failures propagate. A chain longer than [`MAX_OWNER_DEPTH`]
/// fails with [`Error::OwnerChainTooDeep`].
pub async fn resolve_top_owner(
    cluster: &dyn ClusterApi,
    namespace: &str,
    owner_refs: &[OwnerReference],
) -> Result<TopOwner> {
    let mut refs = owner_refs.to_vec();

    for _ in 0..MAX_OWNER_DEPTH {
        // Only the first reference is considered when several exist.
        let Some(owner) = refs.first() else {
            return Ok(TopOwner::none());
        };

        match owner.kind.as_str() {
            "ReplicaSet" => {
                let replicaset = cluster.get_replicaset(namespace, &owner.name).await?;
                refs = replicaset.metadata.owner_references.unwrap_or_default();
            }
            "Deployment" => {
                return Ok(TopOwner {
                    name: owner.name.clone(),
                    kind: OwnerKind::Deployment,
                })
            }
            "StatefulSet" => {
                return Ok(TopOwner {
                    name: owner.name.clone(),
                    kind: OwnerKind::StatefulSet,
                })
            }
            "DaemonSet" => {
                return Ok(TopOwner {
                    name: owner.name.clone(),
                    kind: OwnerKind::DaemonSet,
                })
            }
            other => {
                return Ok(TopOwner {
                    name: owner.name.clone(),
                    kind: OwnerKind::Other(other.to_string()),
                })
            }
        }
    }

    Err(Error::OwnerChainTooDeep {
        namespace: namespace.to_string(),
        depth: MAX_OWNER_DEPTH,
    })
}
