//! Link and channel interface abstractions.

pub mod ethernet;
pub mod local;

use std::io;

use mip_core::types::{InterfaceId, LinkAddr};

/// Writable end of the raw link socket. Held by the driver.
pub trait LinkWriter: Send {
    /// Transmit one framed unit on `interface` toward `dst`.
    fn send_frame(&mut self, interface: InterfaceId, dst: &LinkAddr, frame: &[u8]) -> io::Result<()>;
}

/// Writable end of a connected local channel client. Held by the driver.
pub trait ChannelWriter: Send {
    /// Send one complete envelope, framed for the stream.
    fn send_msg(&mut self, data: &[u8]) -> io::Result<()>;
}
