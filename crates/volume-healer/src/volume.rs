//! Claim-to-driver resolution.
//!
//! Two interchangeable strategies answer "which storage driver backs
//! this claim": the cluster-metadata variant reads the claim's
//! provisioner annotation (falling back to the bound PV's CSI source),
//! and the local-agent variant inspects the per-pod volume sidecar file
//! the kubelet keeps on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::cluster::ClusterApi;
use crate::error::{Error, Result};

/// Current provisioner annotation key on claims.
const PROVISIONER_ANNOTATION: &str = "volume.kubernetes.io/storage-provisioner";
/// Deprecated beta key still present on older clusters.
const LEGACY_PROVISIONER_ANNOTATION: &str = "volume.beta.kubernetes.io/storage-provisioner";

/// Resolves the storage driver backing one mounted volume.
#[async_trait]
pub trait DriverResolver: Send + Sync {
    async fn driver_name(
        &self,
        pod_uid: &str,
        pod_name: &str,
        pvc_name: &str,
        pvc_namespace: &str,
    ) -> Result<String>;
}

/// Cluster-metadata strategy: claim annotation first, bound PV second.
pub struct ClusterDriverResolver {
    cluster: Arc<dyn ClusterApi>,
}

impl ClusterDriverResolver {
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl DriverResolver for ClusterDriverResolver {
    async fn driver_name(
        &self,
        _pod_uid: &str,
        _pod_name: &str,
        pvc_name: &str,
        pvc_namespace: &str,
    ) -> Result<String> {
        let pvc = self.cluster.get_pvc(pvc_namespace, pvc_name).await?;

        if let Some(annotations) = &pvc.metadata.annotations {
            for annotation_key in [PROVISIONER_ANNOTATION, LEGACY_PROVISIONER_ANNOTATION] {
                if let Some(driver) = annotations.get(annotation_key).filter(|v| !v.is_empty()) {
                    debug!(pvc = pvc_name, driver = %driver, "driver taken from claim annotation");
                    return Ok(driver.clone());
                }
            }
        }

        let pv_name = pvc
            .spec
            .and_then(|spec| spec.volume_name)
            .unwrap_or_default();
        let pv = self.cluster.get_pv(&pv_name).await?;
        match pv.spec.and_then(|spec| spec.csi) {
            Some(csi) => Ok(csi.driver),
            None => Err(Error::NotACsiVolume { pv: pv_name }),
        }
    }
}

/// Shape of the kubelet's per-volume sidecar file; everything except the
/// driver name is ignored.
#[derive(Debug, Deserialize)]
struct VolumeData {
    #[serde(rename = "driverName")]
    driver_name: String,
}

/// Local-agent strategy: read `vol_data.json` from the kubelet layout.
pub struct LocalAgentResolver {
    root: PathBuf,
}

impl LocalAgentResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn volume_data_path(&self, pod_uid: &str, pv_name: &str) -> PathBuf {
        self.root
            .join("pods")
            .join(pod_uid)
            .join("volumes/kubernetes.io~csi")
            .join(pv_name)
            .join("vol_data.json")
    }

    async fn load_driver_name(path: &Path) -> Result<String> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::VolumeDataNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(Error::VolumeDataRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let data: VolumeData =
            serde_json::from_slice(&bytes).map_err(|source| Error::MalformedVolumeData {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(data.driver_name)
    }
}

#[async_trait]
impl DriverResolver for LocalAgentResolver {
    async fn driver_name(
        &self,
        pod_uid: &str,
        _pod_name: &str,
        _pvc_name: &str,
        _pvc_namespace: &str,
    ) -> Result<String> {
        // TODO: plumb the PV name through from the claim lookup; the
        // stats input this resolver receives does not carry it, so the
        // path below has an empty PV segment and will not match the real
        // kubelet layout.
        let pv_name = "";
        let path = self.volume_data_path(pod_uid, pv_name);
        Self::load_driver_name(&path).await
    }
}
