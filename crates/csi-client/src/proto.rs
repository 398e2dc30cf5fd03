//! Vendored subset of the prost-generated `csi.v1` protobuf bindings.
//!
//! Only the messages exchanged by the identity and node-capability RPCs
//! are kept; the rest of the CSI surface is out of scope here. Field
//! numbers and wire shapes follow the upstream `csi.proto` exactly, so
//! these types are wire-compatible with any conforming plugin.

/// Intentionally empty.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPluginInfoRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPluginInfoResponse {
    /// Plugin name in domain notation, e.g. `csi.example.com`. REQUIRED.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// Opaque vendor version string. REQUIRED.
    #[prost(string, tag = "2")]
    pub vendor_version: ::prost::alloc::string::String,
    /// Optional opaque metadata.
    #[prost(map = "string, string", tag = "3")]
    pub manifest: ::std::collections::HashMap<
        ::prost::alloc::string::String,
        ::prost::alloc::string::String,
    >,
}

/// Intentionally empty.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProbeRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProbeResponse {
    /// Readiness of the plugin. OPTIONAL: when absent the caller SHALL
    /// assume the plugin is ready.
    #[prost(message, optional, tag = "1")]
    pub ready: ::core::option::Option<bool>,
}

/// Intentionally empty.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeGetCapabilitiesRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeGetCapabilitiesResponse {
    /// All capabilities the node service supports. OPTIONAL.
    #[prost(message, repeated, tag = "1")]
    pub capabilities: ::prost::alloc::vec::Vec<NodeServiceCapability>,
}

/// Specifies a capability of the node service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeServiceCapability {
    #[prost(oneof = "node_service_capability::Type", tags = "1")]
    pub r#type: ::core::option::Option<node_service_capability::Type>,
}

/// Nested message and enum types in `NodeServiceCapability`.
pub mod node_service_capability {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Rpc {
        #[prost(enumeration = "rpc::Type", tag = "1")]
        pub r#type: i32,
    }

    /// Nested message and enum types in `RPC`.
    pub mod rpc {
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
        )]
        #[repr(i32)]
        pub enum Type {
            Unknown = 0,
            StageUnstageVolume = 1,
            GetVolumeStats = 2,
            ExpandVolume = 3,
            VolumeCondition = 4,
        }
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        /// RPC that the node service supports.
        #[prost(message, tag = "1")]
        Rpc(Rpc),
    }
}

/// Intentionally empty.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeGetInfoRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeGetInfoResponse {
    /// Identifier of the node as understood by the plugin. REQUIRED.
    #[prost(string, tag = "1")]
    pub node_id: ::prost::alloc::string::String,
    /// Maximum number of volumes publishable to this node; zero means
    /// the orchestrator decides. OPTIONAL.
    #[prost(int64, tag = "2")]
    pub max_volumes_per_node: i64,
}
