//! Pending-packet buffer: outbound datagrams blocked on an asynchronous
//! routing lookup or link resolution.
//!
//! Entries correlate by the PDU destination field at park time — the final
//! destination while a lookup is outstanding, the next hop while resolution
//! is outstanding — together with which completion they await. Positional
//! release is deliberately not offered: with several destinations unresolved
//! at once, only keyed matching pairs responses with the right packets.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::constants;
use crate::pdu::PduHeader;

/// Which asynchronous completion a parked packet is blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waiting {
    /// A routing lookup RESPONSE for the final destination.
    Lookup,
    /// A resolution RESPONSE for the next hop.
    Resolution,
}

/// A parked outbound datagram: header plus serialized SDU bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPacket {
    pub pdu: PduHeader,
    pub sdu: Vec<u8>,
    pub waiting: Waiting,
}

impl PendingPacket {
    /// The correlation key: the current PDU destination.
    pub fn key(&self) -> u8 {
        self.pdu.dest
    }
}

/// Returned when parking displaced the oldest entry; carries the dropped
/// packet so the caller can log it.
#[derive(Debug)]
pub struct BufferFull(pub PendingPacket);

impl fmt::Display for BufferFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pending buffer full, dropped oldest packet for {}",
            self.0.key()
        )
    }
}

/// Bounded FIFO of parked packets.
pub struct PendingBuffer {
    packets: VecDeque<PendingPacket>,
    capacity: usize,
}

impl PendingBuffer {
    pub fn new() -> Self {
        Self::with_capacity(constants::PENDING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PendingBuffer {
            packets: VecDeque::new(),
            capacity,
        }
    }

    /// Park a packet. The packet is always stored; if the buffer was full,
    /// the oldest entry is dropped and returned in the error.
    pub fn park(&mut self, packet: PendingPacket) -> Result<(), BufferFull> {
        self.packets.push_back(packet);
        if self.packets.len() > self.capacity {
            if let Some(dropped) = self.packets.pop_front() {
                return Err(BufferFull(dropped));
            }
        }
        Ok(())
    }

    /// Remove and return the oldest packet parked for `dest` in state
    /// `waiting`, or `None`.
    pub fn release_by_destination(&mut self, dest: u8, waiting: Waiting) -> Option<PendingPacket> {
        let at = self
            .packets
            .iter()
            .position(|p| p.key() == dest && p.waiting == waiting)?;
        self.packets.remove(at)
    }

    /// Remove and return every packet parked for `dest` in state `waiting`,
    /// oldest first.
    pub fn release_all(&mut self, dest: u8, waiting: Waiting) -> Vec<PendingPacket> {
        let mut released = Vec::new();
        while let Some(packet) = self.release_by_destination(dest, waiting) {
            released.push(packet);
        }
        released
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl Default for PendingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
