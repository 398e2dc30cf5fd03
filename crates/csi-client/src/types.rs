//! Decoded capability model for the node service.

use crate::proto;

/// A node-service capability advertised by a CSI plugin.
///
/// Decoded from the wire representation in [`proto::NodeServiceCapability`];
/// entries the decoder does not recognize are dropped rather than failing
/// the whole capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCapability {
    /// Volumes can be staged/unstaged independently of pod publication.
    StageUnstageVolume,
    /// The node service can report volume usage statistics.
    GetVolumeStats,
    /// Volumes can be expanded on the node.
    ExpandVolume,
    /// The node service can report per-volume health conditions.
    VolumeCondition,
}

impl NodeCapability {
    /// Decode one wire capability entry.
    ///
    /// Returns `None` for entries with no RPC payload and for RPC types
    /// this client does not know (including the explicit `UNKNOWN`
    /// discriminant).
    pub fn from_proto(capability: &proto::NodeServiceCapability) -> Option<Self> {
        use proto::node_service_capability::rpc::Type;

        let proto::node_service_capability::Type::Rpc(rpc) = capability.r#type.as_ref()?;
        match Type::try_from(rpc.r#type).ok()? {
            Type::Unknown => None,
            Type::StageUnstageVolume => Some(Self::StageUnstageVolume),
            Type::GetVolumeStats => Some(Self::GetVolumeStats),
            Type::ExpandVolume => Some(Self::ExpandVolume),
            Type::VolumeCondition => Some(Self::VolumeCondition),
        }
    }
}
