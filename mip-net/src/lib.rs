//! mip-net: Network node for MIP.
//!
//! Drives `mip_core::MipEngine` with a raw `AF_PACKET` socket and threads.
//! Serves local applications over a Unix channel socket, relays
//! routing-control traffic, and runs the distance-vector routing service.

pub mod framing;
pub mod event;
pub mod config;
pub mod interface;
pub mod client;
pub mod driver;
pub mod router_service;
pub mod node;

pub use client::Channel;
pub use config::{ConfigError, DaemonConfig};
pub use driver::Driver;
pub use event::Event;
pub use node::MipNode;

// Re-export commonly used types from mip-core
pub use mip_core::types::InterfaceId;
