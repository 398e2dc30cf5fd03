//! Guarded pod restart.
//!
//! Deletes a pod so its owning controller recreates it. Refuses to act
//! on ownerless pods: deleting one of those would not bring it back.

use tracing::info;

use super::owner::resolve_top_owner;
use super::ClusterApi;
use crate::error::{Error, Result};

/// Delete `pod_name` after confirming a controller owns it.
pub async fn restart_pod(cluster: &dyn ClusterApi, namespace: &str, pod_name: &str) -> Result<()> {
    let pod = cluster.get_pod(namespace, pod_name).await?;
    let owner_refs = pod.metadata.owner_references.unwrap_or_default();

    let owner = resolve_top_owner(cluster, namespace, &owner_refs).await?;
    if owner.name.is_empty() {
        return Err(Error::NoOwnerFound {
            namespace: namespace.to_string(),
            pod: pod_name.to_string(),
        });
    }

    info!(
        namespace,
        pod = pod_name,
        owner = %owner.name,
        kind = %owner.kind,
        "deleting pod so its owner recreates it"
    );
    cluster.delete_pod(namespace, pod_name).await
}
