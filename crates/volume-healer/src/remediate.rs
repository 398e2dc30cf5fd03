//! The remediation pass.
//!
//! Fuses per-volume driver identity with per-driver capability flags to
//! pick a recovery action: drivers that can stage/unstage volumes get
//! their workload bounced (pods come back with freshly staged mounts),
//! drivers that cannot get the pod force-restarted. Every per-volume
//! failure is logged and skipped; only startup failures abort the pass.

use std::collections::HashMap;
use std::sync::Arc;

use csi_client::{GrpcDriverClient, NodeDriverClient};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cluster::bounce::BounceOperator;
use crate::cluster::restart::restart_pod;
use crate::cluster::ClusterApi;
use crate::error::Result;
use crate::stats::{PodReference, Summary, VolumeStats};
use crate::volume::DriverResolver;

/// Drivers keyed by their identity-reported name. Built once at startup,
/// read-only afterwards; channels close when the registry drops.
pub type DriverRegistry = HashMap<String, Box<dyn NodeDriverClient>>;

/// Open one client per configured endpoint and key it by the name the
/// driver reports about itself. Any failure is fatal: a registry with an
/// unidentified driver is unusable.
pub async fn build_registry(endpoints: &[String]) -> Result<DriverRegistry> {
    let mut drivers: DriverRegistry = HashMap::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let client = GrpcDriverClient::connect(endpoint.clone()).await?;
        let name = client.driver_name().await?;
        info!(driver = %name, endpoint = %endpoint, "registered driver");
        drivers.insert(name, Box::new(client));
    }
    Ok(drivers)
}

/// Probe every registered driver once. Failures and unhealthy answers
/// are logged; the driver stays registered either way, so later volume
/// handling can still reference it.
pub async fn health_check(drivers: &DriverRegistry) {
    for (name, client) in drivers {
        match client.probe().await {
            Ok(true) => info!(driver = %name, "driver node service is healthy"),
            Ok(false) => warn!(driver = %name, "driver node service is not healthy"),
            Err(error) => {
                error!(driver = %name, error = %error, "failed to probe driver node service");
            }
        }
    }
}

pub struct Remediator {
    cluster: Arc<dyn ClusterApi>,
    drivers: DriverRegistry,
    resolver: Box<dyn DriverResolver>,
    bounce: BounceOperator,
    cancel: CancellationToken,
}

impl Remediator {
    pub fn new(
        cluster: Arc<dyn ClusterApi>,
        drivers: DriverRegistry,
        resolver: Box<dyn DriverResolver>,
        cancel: CancellationToken,
    ) -> Self {
        let bounce = BounceOperator::new(cluster.clone());
        Self {
            cluster,
            drivers,
            resolver,
            bounce,
            cancel,
        }
    }

    /// One strictly sequential pass over every claim-backed volume in
    /// the node summary. Volumes are never handled in parallel: two
    /// volumes can share an owning workload, and concurrent bounces of
    /// the same owner would race each other's revert targets.
    pub async fn run(&self, summary: &Summary) {
        for pod in &summary.pods {
            if self.cancel.is_cancelled() {
                info!("shutdown requested, stopping the remediation pass");
                return;
            }
            for volume in &pod.volume_stats {
                self.remediate_volume(&pod.pod_ref, volume).await;
            }
        }
    }

    async fn remediate_volume(&self, pod_ref: &PodReference, volume: &VolumeStats) {
        // Volumes with no claim (ephemeral volumes) are not ours to fix.
        let Some(pvc_ref) = &volume.pvc_ref else {
            return;
        };
        let namespace = pod_ref.namespace.as_str();
        let pod_name = pod_ref.name.as_str();

        let driver = match self
            .resolver
            .driver_name(&pod_ref.uid, pod_name, &pvc_ref.name, &pvc_ref.namespace)
            .await
        {
            Ok(driver) => driver,
            Err(error) => {
                error!(
                    namespace,
                    pod = pod_name,
                    pvc = %pvc_ref.name,
                    error = %error,
                    "failed to resolve the driver backing the claim"
                );
                return;
            }
        };

        let Some(client) = self.drivers.get(&driver) else {
            info!(driver = %driver, namespace, pod = pod_name, "driver not found in the registry");
            return;
        };

        match client.supports_volume_condition().await {
            Ok(true) => {}
            Ok(false) => {
                info!(driver = %driver, "driver does not report volume conditions");
                return;
            }
            Err(error) => {
                error!(
                    driver = %driver,
                    error = %error,
                    "failed to check volume condition support"
                );
                return;
            }
        }

        let stage_unstage = match client.supports_stage_unstage().await {
            Ok(supported) => supported,
            Err(error) => {
                error!(
                    driver = %driver,
                    error = %error,
                    "failed to check stage/unstage support"
                );
                return;
            }
        };

        if stage_unstage {
            info!(driver = %driver, namespace, pod = pod_name, "driver can restage, bouncing the owner");
            if let Err(error) = self
                .bounce
                .bounce_pod_owner(namespace, pod_name, 0, &self.cancel)
                .await
            {
                error!(
                    driver = %driver,
                    namespace,
                    pod = pod_name,
                    error = %error,
                    "failed to bounce the pod's owner"
                );
            }
        } else {
            info!(driver = %driver, namespace, pod = pod_name, "driver cannot restage, restarting the pod");
            if let Err(error) = restart_pod(self.cluster.as_ref(), namespace, pod_name).await {
                error!(
                    driver = %driver,
                    namespace,
                    pod = pod_name,
                    error = %error,
                    "failed to restart the pod"
                );
            }
        }
    }
}
