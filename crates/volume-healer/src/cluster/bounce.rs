//! The workload bounce operator.
//!
//! Pulses a controller's desired replica count to a target (zero in the
//! production path) and back: fetch and record the original count, scale
//! down under conflict retry, poll until the observed count reaches the
//! target, then restore. A failed or cancelled wait still restores the
//! original count; only a failed restore after a failed wait surfaces
//! the combined [`Error::RevertFailed`], which means the workload may be
//! stuck at zero and needs an operator.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::owner::{resolve_top_owner, OwnerKind, TopOwner};
use super::ClusterApi;
use crate::error::{Error, Result};

/// Bound and pacing of the refetch-and-retry loop around controller
/// mutations. Conflicts are expected under concurrent writers; anything
/// still conflicting after `attempts` tries is given up on.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

/// The two owner kinds this operator can scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScaleKind {
    Deployment,
    StatefulSet,
}

impl ScaleKind {
    fn as_str(self) -> &'static str {
        match self {
            ScaleKind::Deployment => "Deployment",
            ScaleKind::StatefulSet => "StatefulSet",
        }
    }

    fn for_owner(owner: &TopOwner) -> Result<Self> {
        match owner.kind {
            OwnerKind::Deployment => Ok(ScaleKind::Deployment),
            OwnerKind::StatefulSet => Ok(ScaleKind::StatefulSet),
            ref other => Err(Error::UnsupportedOwnerKind {
                kind: other.to_string(),
            }),
        }
    }
}

pub struct BounceOperator {
    cluster: Arc<dyn ClusterApi>,
    retry: RetryPolicy,
    poll_interval: Duration,
    quiesce_timeout: Duration,
}

impl BounceOperator {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self {
            cluster,
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(2),
            quiesce_timeout: Duration::from_secs(120),
        }
    }

    /// Resolve `pod_name`'s top owner and bounce it.
    pub async fn bounce_pod_owner(
        &self,
        namespace: &str,
        pod_name: &str,
        target: i32,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let pod = self.cluster.get_pod(namespace, pod_name).await?;
        let owner_refs = pod.metadata.owner_references.unwrap_or_default();
        let owner = resolve_top_owner(self.cluster.as_ref(), namespace, &owner_refs).await?;
        self.bounce(namespace, &owner, target, cancel).await
    }

    /// Scale `owner` to `target` replicas, wait for the observed count to
    /// settle there, then restore the original count.
    pub async fn bounce(
        &self,
        namespace: &str,
        owner: &TopOwner,
        target: i32,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let kind = ScaleKind::for_owner(owner)?;
        let name = owner.name.as_str();

        let original = self.desired_replicas(kind, namespace, name).await?;
        info!(
            kind = kind.as_str(),
            namespace,
            name,
            original,
            target,
            "pulsing workload replicas for volume recovery"
        );

        self.set_desired(kind, namespace, name, target).await?;

        match self
            .wait_for_quiesce(kind, namespace, name, target, cancel)
            .await
        {
            Ok(()) => {
                debug!(
                    kind = kind.as_str(),
                    namespace, name, "workload quiesced, restoring replicas"
                );
                self.set_desired(kind, namespace, name, original).await
            }
            Err(quiesce) => {
                warn!(
                    kind = kind.as_str(),
                    namespace,
                    name,
                    error = %quiesce,
                    "scale-down did not settle, restoring original replicas"
                );
                // The revert must run even on cancellation; it does not
                // observe the token.
                match self.set_desired(kind, namespace, name, original).await {
                    Ok(()) => Err(quiesce),
                    Err(revert) => Err(Error::RevertFailed {
                        quiesce: Box::new(quiesce),
                        revert: Box::new(revert),
                    }),
                }
            }
        }
    }

    async fn desired_replicas(&self, kind: ScaleKind, namespace: &str, name: &str) -> Result<i32> {
        // An absent spec.replicas means the API-server default of 1.
        match kind {
            ScaleKind::Deployment => {
                let deployment = self.cluster.get_deployment(namespace, name).await?;
                Ok(deployment.spec.and_then(|s| s.replicas).unwrap_or(1))
            }
            ScaleKind::StatefulSet => {
                let statefulset = self.cluster.get_statefulset(namespace, name).await?;
                Ok(statefulset.spec.and_then(|s| s.replicas).unwrap_or(1))
            }
        }
    }

    async fn observed_replicas(&self, kind: ScaleKind, namespace: &str, name: &str) -> Result<i32> {
        match kind {
            ScaleKind::Deployment => {
                let deployment = self.cluster.get_deployment(namespace, name).await?;
                Ok(deployment.status.and_then(|s| s.replicas).unwrap_or(0))
            }
            ScaleKind::StatefulSet => {
                let statefulset = self.cluster.get_statefulset(namespace, name).await?;
                Ok(statefulset.status.map(|s| s.replicas).unwrap_or(0))
            }
        }
    }

    /// Refetch-and-reapply the desired replica count until the update
    /// lands or the retry policy is exhausted.
    async fn set_desired(
        &self,
        kind: ScaleKind,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<()> {
        let mut delay = self.retry.base_delay;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match kind {
                ScaleKind::Deployment => {
                    let mut deployment = self.cluster.get_deployment(namespace, name).await?;
                    deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
                    self.cluster.update_deployment(namespace, &deployment).await
                }
                ScaleKind::StatefulSet => {
                    let mut statefulset = self.cluster.get_statefulset(namespace, name).await?;
                    statefulset
                        .spec
                        .get_or_insert_with(Default::default)
                        .replicas = Some(replicas);
                    self.cluster
                        .update_statefulset(namespace, &statefulset)
                        .await
                }
            };

            match result {
                Ok(()) => return Ok(()),
                Err(err) if err.is_conflict() && attempt < self.retry.attempts => {
                    debug!(
                        kind = kind.as_str(),
                        namespace, name, attempt, "update conflicted, refetching and retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.retry.max_delay);
                }
                Err(err) if err.is_conflict() => {
                    return Err(Error::ConflictExhausted {
                        resource: format!("{} {namespace}/{name}", kind.as_str()),
                        attempts: attempt,
                    })
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Poll the observed replica count until it reaches `target`, the
    /// timeout elapses, or `cancel` trips. Poll errors abort the wait.
    async fn wait_for_quiesce(
        &self,
        kind: ScaleKind,
        namespace: &str,
        name: &str,
        target: i32,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let poll = async {
            loop {
                if self.observed_replicas(kind, namespace, name).await? == target {
                    return Ok(());
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.quiesce_timeout, poll) => match result {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::QuiesceTimeout {
                    kind: kind.as_str(),
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }),
            },
        }
    }
}
