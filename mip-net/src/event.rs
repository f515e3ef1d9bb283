//! Event types for the driver loop.

use std::fmt;
use std::sync::mpsc;

use mip_core::types::InterfaceId;

use crate::interface::ChannelWriter;

/// Identifies one accepted local channel client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// What a local client identified itself as with its entity-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Ping,
    Routing,
}

/// Events sent to the driver thread.
pub enum Event {
    /// A frame arrived on the raw link socket.
    LinkFrame { interface: InterfaceId, data: Vec<u8> },
    /// A local client connected and identified itself.
    ClientUp {
        id: ChannelId,
        kind: ClientKind,
        writer: Box<dyn ChannelWriter>,
    },
    /// A complete envelope arrived from a local client.
    ClientData { id: ChannelId, data: Vec<u8> },
    /// A local client disconnected.
    ClientDown { id: ChannelId },
    /// The raw link socket failed; no further protocol operation is
    /// possible.
    LinkDown(String),
    /// Shut down the driver loop.
    Shutdown,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::LinkFrame { interface, data } => f
                .debug_struct("LinkFrame")
                .field("interface", interface)
                .field("data_len", &data.len())
                .finish(),
            Event::ClientUp { id, kind, .. } => f
                .debug_struct("ClientUp")
                .field("id", id)
                .field("kind", kind)
                .finish(),
            Event::ClientData { id, data } => f
                .debug_struct("ClientData")
                .field("id", id)
                .field("data_len", &data.len())
                .finish(),
            Event::ClientDown { id } => f.debug_tuple("ClientDown").field(id).finish(),
            Event::LinkDown(e) => f.debug_tuple("LinkDown").field(e).finish(),
            Event::Shutdown => write!(f, "Shutdown"),
        }
    }
}

pub type EventSender = mpsc::Sender<Event>;
pub type EventReceiver = mpsc::Receiver<Event>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel()
}
