//! The driver client trait and its gRPC-over-Unix-socket adapter.

use async_trait::async_trait;
use http::uri::PathAndQuery;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tonic::codec::ProstCodec;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::debug;

use crate::error::CsiError;
use crate::proto;
use crate::types::NodeCapability;

const GET_PLUGIN_INFO: &str = "/csi.v1.Identity/GetPluginInfo";
const PROBE: &str = "/csi.v1.Identity/Probe";
const NODE_GET_CAPABILITIES: &str = "/csi.v1.Node/NodeGetCapabilities";

/// Capability-negotiation surface of one CSI node plugin.
///
/// One instance per driver endpoint. Capability predicates query the
/// plugin fresh on every call; nothing is cached in this layer.
#[async_trait]
pub trait NodeDriverClient: Send + Sync {
    /// Ask the plugin for its driver name.
    ///
    /// Fails with a protocol error when the channel is unreachable or
    /// the plugin reports an empty name.
    async fn driver_name(&self) -> Result<String, CsiError>;

    /// Liveness probe. A plugin that answers "not ready" yields
    /// `Ok(false)`; only an unusable channel is an error.
    async fn probe(&self) -> Result<bool, CsiError>;

    /// Enumerate the node-service capabilities the plugin advertises.
    /// Entries the decoder does not recognize are skipped.
    async fn node_capabilities(&self) -> Result<Vec<NodeCapability>, CsiError>;

    /// Whether the plugin can stage/unstage volumes independently of
    /// publishing them to a pod.
    async fn supports_stage_unstage(&self) -> Result<bool, CsiError> {
        Ok(self
            .node_capabilities()
            .await?
            .contains(&NodeCapability::StageUnstageVolume))
    }

    /// Whether the plugin reports per-volume health conditions.
    async fn supports_volume_condition(&self) -> Result<bool, CsiError> {
        Ok(self
            .node_capabilities()
            .await?
            .contains(&NodeCapability::VolumeCondition))
    }
}

/// Concrete [`NodeDriverClient`] over a gRPC channel dialed through the
/// plugin's Unix socket. The channel lives as long as the client; tonic
/// closes it when the last clone drops.
pub struct GrpcDriverClient {
    endpoint: String,
    grpc: tonic::client::Grpc<Channel>,
}

impl GrpcDriverClient {
    /// Dial the plugin socket at `socket_path` and wrap the channel.
    ///
    /// The authority in the placeholder URI is never used for routing;
    /// the connector below dials the socket directly.
    pub async fn connect(socket_path: impl Into<String>) -> Result<Self, CsiError> {
        let endpoint = socket_path.into();
        debug!(endpoint = %endpoint, "dialing driver control socket");

        let path = endpoint.clone();
        let channel = Endpoint::from_static("http://localhost")
            .connect_with_connector(service_fn(move |_: Uri| {
                let path = path.clone();
                async move {
                    let stream = UnixStream::connect(path).await?;
                    Ok::<_, std::io::Error>(TokioIo::new(stream))
                }
            }))
            .await
            .map_err(|source| CsiError::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;

        Ok(Self {
            endpoint,
            grpc: tonic::client::Grpc::new(channel),
        })
    }

    /// Socket path this client was dialed against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn unary<Req, Resp>(
        &self,
        operation: &'static str,
        path: &'static str,
        request: Req,
    ) -> Result<Resp, CsiError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.grpc.clone();
        grpc.ready().await.map_err(|e| CsiError::Rpc {
            operation,
            source: tonic::Status::unavailable(format!("channel not ready: {e}")),
        })?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await
            .map_err(|source| CsiError::Rpc { operation, source })?;

        Ok(response.into_inner())
    }
}

#[async_trait]
impl NodeDriverClient for GrpcDriverClient {
    async fn driver_name(&self) -> Result<String, CsiError> {
        debug!(endpoint = %self.endpoint, "calling GetPluginInfo for the driver name");
        let response: proto::GetPluginInfoResponse = self
            .unary("GetPluginInfo", GET_PLUGIN_INFO, proto::GetPluginInfoRequest {})
            .await?;

        if response.name.is_empty() {
            return Err(CsiError::malformed("GetPluginInfo", "empty driver name"));
        }
        Ok(response.name)
    }

    async fn probe(&self) -> Result<bool, CsiError> {
        debug!(endpoint = %self.endpoint, "probing driver liveness");
        let response: proto::ProbeResponse =
            self.unary("Probe", PROBE, proto::ProbeRequest {}).await?;

        // An absent readiness field means ready per the CSI contract.
        Ok(response.ready.unwrap_or(true))
    }

    async fn node_capabilities(&self) -> Result<Vec<NodeCapability>, CsiError> {
        debug!(endpoint = %self.endpoint, "querying node service capabilities");
        let response: proto::NodeGetCapabilitiesResponse = self
            .unary(
                "NodeGetCapabilities",
                NODE_GET_CAPABILITIES,
                proto::NodeGetCapabilitiesRequest {},
            )
            .await?;

        Ok(response
            .capabilities
            .iter()
            .filter_map(NodeCapability::from_proto)
            .collect())
    }
}
