//! Protocol error type for the driver control channel.

use thiserror::Error;

/// Failure talking to a CSI plugin over its local socket.
///
/// Every variant is a protocol-level problem: the channel could not be
/// reached or the plugin answered with something the caller cannot use.
/// A plugin that answers "not ready" is not an error.
#[derive(Debug, Error)]
pub enum CsiError {
    /// The endpoint socket could not be dialed.
    #[error("failed to connect to driver endpoint {endpoint}: {source}")]
    Connect {
        /// Socket path of the driver endpoint.
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The RPC itself failed (channel broken, plugin returned an error).
    #[error("{operation} failed: {source}")]
    Rpc {
        /// CSI method name, e.g. `GetPluginInfo`.
        operation: &'static str,
        #[source]
        source: tonic::Status,
    },

    /// The plugin answered, but the response is unusable.
    #[error("{operation} returned a malformed response: {reason}")]
    MalformedResponse {
        /// CSI method name, e.g. `GetPluginInfo`.
        operation: &'static str,
        /// Human-readable description of what was wrong.
        reason: String,
    },
}

impl CsiError {
    /// Build a [`CsiError::MalformedResponse`] from anything displayable.
    pub fn malformed<R: std::fmt::Display>(operation: &'static str, reason: R) -> Self {
        Self::MalformedResponse {
            operation,
            reason: reason.to_string(),
        }
    }
}
