//! Serde mirror of the kubelet stats summary, reduced to the fields the
//! remediation pass consumes: which pods mount which claims.

use serde::{Deserialize, Serialize};

/// Top-level node stats summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub pods: Vec<PodStats>,
}

/// Per-pod slice of the summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodStats {
    #[serde(rename = "podRef")]
    pub pod_ref: PodReference,
    /// Volume usage entries; the wire name is `volume`.
    #[serde(rename = "volume", default)]
    pub volume_stats: Vec<VolumeStats>,
}

/// Identity of the pod a stats entry belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodReference {
    pub name: String,
    pub namespace: String,
    pub uid: String,
}

/// One mounted volume of a pod.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeStats {
    pub name: String,
    /// Absent for volumes with no claim (ephemeral volumes); those are
    /// skipped by the remediation pass.
    #[serde(rename = "pvcRef", default, skip_serializing_if = "Option::is_none")]
    pub pvc_ref: Option<PvcReference>,
}

/// Reference to the claim backing a volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PvcReference {
    pub name: String,
    pub namespace: String,
}
