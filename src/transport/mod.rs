//! Connection to the coordinating server.

pub mod client;
pub mod protocol;

pub use client::{OutboundHandle, TransportClient};
pub use protocol::{Inbound, Outbound};
