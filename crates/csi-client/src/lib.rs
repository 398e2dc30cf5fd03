//! Capability negotiation client for CSI node plugins.
//!
//! A CSI driver exposes its control surface on a node-local Unix socket.
//! This crate speaks the small slice of that surface a remediation
//! controller needs:
//! - driver identification (`Identity/GetPluginInfo`)
//! - liveness probing (`Identity/Probe`)
//! - node-service capability discovery (`Node/NodeGetCapabilities`)
//!
//! The [`NodeDriverClient`] trait is the seam: callers program against it
//! and tests substitute fakes. [`GrpcDriverClient`] is the concrete
//! adapter holding one long-lived channel per driver endpoint. No retry
//! happens in this layer; callers decide whether a failure is fatal
//! (driver discovery) or advisory (health checks during remediation).

pub mod client;
pub mod error;
pub mod proto;
pub mod types;

pub use client::{GrpcDriverClient, NodeDriverClient};
pub use error::CsiError;
pub use types::NodeCapability;
