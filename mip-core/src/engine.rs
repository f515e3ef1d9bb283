//! The daemon's forwarding engine.
//!
//! Owns the resolution cache and the pending-packet buffer, and processes
//! traffic from the three logical channels — application, routing control
//! and link layer — without performing any I/O. Returns `Vec<EngineAction>`
//! that the caller must execute.

use alloc::vec::Vec;

use crate::arp::{ArpTable, Reach, TableFull};
use crate::constants;
use crate::frame::{self, FrameHeader};
use crate::pdu::{PduHeader, SduType};
use crate::pending::{PendingBuffer, PendingPacket, Waiting};
use crate::sdu::{AppSdu, ArpKind, ArpSdu, RoutingSdu};
use crate::types::{InterfaceId, LinkAddr, LocalInterface};

/// Actions produced by the engine for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    /// Transmit a fully framed unit on a specific interface.
    SendFrame {
        interface: InterfaceId,
        dst: LinkAddr,
        frame: Vec<u8>,
    },
    /// Deliver an envelope to the connected PING-DATA client.
    DeliverApp { sdu: AppSdu },
    /// Deliver an envelope to the connected ROUTING-CONTROL client.
    DeliverRouting { sdu: AppSdu },
}

/// Engine configuration: this host's identity and its egress interfaces.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub address: u8,
    pub interfaces: Vec<LocalInterface>,
}

pub struct MipEngine {
    address: u8,
    interfaces: Vec<LocalInterface>,
    arp: ArpTable,
    pending: PendingBuffer,
}

impl MipEngine {
    pub fn new(config: EngineConfig) -> Self {
        let mut arp = ArpTable::new();
        // this host's own address, marked local so it is never evicted
        let _ = arp.insert(config.address, constants::LOCAL_LINK_ADDR, Reach::Local);
        MipEngine {
            address: config.address,
            interfaces: config.interfaces,
            arp,
            pending: PendingBuffer::new(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn arp(&self) -> &ArpTable {
        &self.arp
    }

    pub fn pending(&self) -> &PendingBuffer {
        &self.pending
    }

    // =========================================================================
    // Application channel
    // =========================================================================

    /// An envelope arrived from the PING-DATA client: build a DATA datagram,
    /// ask the routing service for a path, and park it until the answer.
    pub fn handle_app_data(&mut self, raw: &[u8]) -> Vec<EngineAction> {
        let sdu = match AppSdu::deserialize(raw) {
            Ok(sdu) => sdu,
            Err(e) => {
                log::warn!("<daemon>: discarding bad application message: {}", e);
                return Vec::new();
            }
        };

        if sdu.dest == self.address {
            // loopback; delivered with ourselves as the peer
            return Vec::from([EngineAction::DeliverApp {
                sdu: AppSdu::new(self.address, sdu.ttl, sdu.payload),
            }]);
        }
        if sdu.dest == constants::BROADCAST_ADDR {
            log::warn!("<daemon>: {} is not a routable destination", sdu.dest);
            return Vec::new();
        }

        let ttl = if sdu.ttl == 0 {
            constants::MAX_TTL
        } else {
            sdu.ttl.min(constants::MAX_TTL)
        };

        let wire = AppSdu::new(sdu.dest, ttl, sdu.payload).serialize();
        if wire.len() > constants::MAX_SDU_LEN {
            log::warn!("<daemon>: application message too large ({} bytes)", wire.len());
            return Vec::new();
        }

        let pdu = PduHeader {
            dest: sdu.dest,
            src: self.address,
            ttl,
            sdu_len: wire.len() as u16,
            sdu_type: SduType::Data,
        };

        log::debug!("<daemon>: parking packet for {} awaiting lookup", sdu.dest);
        let actions = Vec::from([self.lookup_request(sdu.dest)]);
        self.park(PendingPacket {
            pdu,
            sdu: wire,
            waiting: Waiting::Lookup,
        });
        actions
    }

    // =========================================================================
    // Routing-control channel
    // =========================================================================

    /// An envelope arrived from the ROUTING-CONTROL client.
    pub fn handle_routing_data(&mut self, raw: &[u8]) -> Vec<EngineAction> {
        let envelope = match AppSdu::deserialize(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("<daemon>: discarding bad routing message: {}", e);
                return Vec::new();
            }
        };
        let sdu = match RoutingSdu::decode(&envelope.payload) {
            Ok(sdu) => sdu,
            Err(e) => {
                log::warn!("<daemon>: discarding bad routing message: {}", e);
                return Vec::new();
            }
        };

        match sdu {
            // control traffic is flooded link-broadcast; the PDU destination
            // addresses it (everyone for HELLO, one neighbor for UPDATE) and
            // receivers filter on it
            RoutingSdu::Hello { .. } => {
                self.broadcast_control(constants::BROADCAST_ADDR, &envelope.payload)
            }
            RoutingSdu::Update { .. } => self.broadcast_control(envelope.dest, &envelope.payload),
            RoutingSdu::Response { dest, next_hop, .. } => {
                self.handle_lookup_response(dest, next_hop)
            }
            RoutingSdu::Request { .. } => {
                log::debug!("<daemon>: ignoring lookup request from routing client");
                Vec::new()
            }
        }
    }

    fn handle_lookup_response(&mut self, dest: u8, next_hop: u8) -> Vec<EngineAction> {
        let released = self.pending.release_all(dest, Waiting::Lookup);
        if released.is_empty() {
            log::debug!("<daemon>: lookup response for {} with nothing pending", dest);
            return Vec::new();
        }

        if next_hop == constants::BROADCAST_ADDR {
            log::warn!(
                "<daemon>: no route to {}, dropping {} packet(s)",
                dest,
                released.len()
            );
            return Vec::new();
        }

        let mut actions = Vec::new();
        match self.arp.lookup(next_hop) {
            Some((link, Reach::Via(interface))) => {
                for mut packet in released {
                    packet.pdu.dest = next_hop;
                    self.frame_data(packet.pdu, packet.sdu, link, interface, &mut actions);
                }
            }
            Some((_, Reach::Local)) => {
                // a route via ourselves cannot be installed (loop avoidance),
                // so a local next hop only means a confused peer
                log::warn!("<daemon>: lookup for {} answered with own address", dest);
            }
            None => {
                log::debug!("<daemon>: next hop {} unresolved, sending request", next_hop);
                self.broadcast_arp_request(next_hop, &mut actions);
                for mut packet in released {
                    packet.pdu.dest = next_hop;
                    packet.waiting = Waiting::Resolution;
                    self.park(packet);
                }
            }
        }
        actions
    }

    // =========================================================================
    // Link layer
    // =========================================================================

    /// A frame arrived on `interface`.
    pub fn handle_link_frame(&mut self, interface: InterfaceId, raw: &[u8]) -> Vec<EngineAction> {
        let (header, pdu, sdu) = match frame::decode(raw) {
            Ok(parts) => parts,
            Err(e) => {
                log::debug!("<daemon>: discarding malformed frame: {}", e);
                return Vec::new();
            }
        };

        match pdu.sdu_type {
            SduType::Arp => self.handle_arp(interface, &header, &pdu, sdu),
            SduType::Routing => self.handle_routing_frame(&pdu, sdu),
            SduType::Data => self.handle_data_frame(&pdu, sdu),
        }
    }

    fn handle_arp(
        &mut self,
        interface: InterfaceId,
        header: &FrameHeader,
        pdu: &PduHeader,
        sdu: &[u8],
    ) -> Vec<EngineAction> {
        let arp = match ArpSdu::decode(sdu) {
            Ok(arp) => arp,
            Err(e) => {
                log::warn!("<daemon>: discarding bad resolution frame: {}", e);
                return Vec::new();
            }
        };

        // some media loop broadcasts back to the sender
        if pdu.src == self.address {
            return Vec::new();
        }

        let mut actions = Vec::new();
        match arp.kind {
            ArpKind::Request => {
                // cache the requester's mapping opportunistically
                self.learn(pdu.src, header.src, interface);

                if self.arp.contains(arp.address) {
                    log::debug!(
                        "<daemon>: answering resolution request from {} for {}",
                        pdu.src,
                        arp.address
                    );
                    let response = PduHeader {
                        dest: pdu.src,
                        src: self.address,
                        ttl: 0,
                        sdu_len: constants::ARP_SDU_SIZE as u16,
                        sdu_type: SduType::Arp,
                    };
                    let body = ArpSdu::response(arp.address).encode();
                    self.frame_to(response, &body, header.src, interface, &mut actions);
                }
            }
            ArpKind::Response => {
                log::debug!("<daemon>: resolution response: {} is reachable", arp.address);
                self.learn(arp.address, header.src, interface);

                let released = self.pending.release_all(arp.address, Waiting::Resolution);
                if let Some((link, Reach::Via(egress))) = self.arp.lookup(arp.address) {
                    for packet in released {
                        self.frame_data(packet.pdu, packet.sdu, link, egress, &mut actions);
                    }
                }
            }
        }
        actions
    }

    fn handle_routing_frame(&mut self, pdu: &PduHeader, sdu: &[u8]) -> Vec<EngineAction> {
        if pdu.src == self.address {
            return Vec::new();
        }
        if pdu.dest != self.address && pdu.dest != constants::BROADCAST_ADDR {
            return Vec::new();
        }
        if let Err(e) = RoutingSdu::decode(sdu) {
            log::warn!("<daemon>: discarding bad routing frame: {}", e);
            return Vec::new();
        }
        Vec::from([EngineAction::DeliverRouting {
            sdu: AppSdu::new(pdu.src, pdu.ttl, sdu.to_vec()),
        }])
    }

    fn handle_data_frame(&mut self, pdu: &PduHeader, sdu: &[u8]) -> Vec<EngineAction> {
        let inner = match AppSdu::deserialize(sdu) {
            Ok(inner) => inner,
            Err(e) => {
                log::warn!("<daemon>: discarding bad data frame: {}", e);
                return Vec::new();
            }
        };

        if inner.dest == self.address {
            log::debug!("<daemon>: delivering packet from {}", pdu.src);
            return Vec::from([EngineAction::DeliverApp {
                sdu: AppSdu::new(pdu.src, pdu.ttl, inner.payload),
            }]);
        }

        // forwarding: spend a hop, drop on expiry
        if pdu.ttl <= 1 {
            log::debug!("<daemon>: TTL expired, dropping packet for {}", inner.dest);
            return Vec::new();
        }
        let forwarded = PduHeader {
            dest: inner.dest,
            src: pdu.src,
            ttl: pdu.ttl - 1,
            sdu_len: pdu.sdu_len,
            sdu_type: SduType::Data,
        };

        log::debug!(
            "<daemon>: forwarding packet for {}, parking awaiting lookup",
            inner.dest
        );
        let actions = Vec::from([self.lookup_request(inner.dest)]);
        self.park(PendingPacket {
            pdu: forwarded,
            sdu: sdu.to_vec(),
            waiting: Waiting::Lookup,
        });
        actions
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn lookup_request(&self, dest: u8) -> EngineAction {
        EngineAction::DeliverRouting {
            sdu: AppSdu::new(
                self.address,
                0,
                RoutingSdu::Request { dest }.encode(),
            ),
        }
    }

    /// Insert a learned mapping, evicting the LRU learned entry on a full
    /// table. Local entries are never replaced.
    fn learn(&mut self, address: u8, link: LinkAddr, interface: InterfaceId) {
        if address == self.address {
            return;
        }
        if let Err(TableFull) = self.arp.insert(address, link, Reach::Via(interface)) {
            match self.arp.evict_lru() {
                Some(evicted) => {
                    log::warn!("<daemon>: resolution cache full, evicted entry for {}", evicted);
                    let _ = self.arp.insert(address, link, Reach::Via(interface));
                }
                None => {
                    log::warn!("<daemon>: resolution cache full, could not cache {}", address)
                }
            }
        }
    }

    fn park(&mut self, packet: PendingPacket) {
        if let Err(e) = self.pending.park(packet) {
            log::warn!("<daemon>: {}", e);
        }
    }

    /// Frame a DATA transmission, keeping the inner TTL byte in step with
    /// the header.
    fn frame_data(
        &self,
        pdu: PduHeader,
        mut sdu: Vec<u8>,
        dst: LinkAddr,
        interface: InterfaceId,
        actions: &mut Vec<EngineAction>,
    ) {
        if sdu.len() >= 2 {
            sdu[1] = pdu.ttl;
        }
        self.frame_to(pdu, &sdu, dst, interface, actions);
    }

    /// Frame and emit one unicast transmission on `interface`.
    fn frame_to(
        &self,
        pdu: PduHeader,
        sdu: &[u8],
        dst: LinkAddr,
        interface: InterfaceId,
        actions: &mut Vec<EngineAction>,
    ) {
        let src = match self.interfaces.iter().find(|i| i.id == interface) {
            Some(iface) => iface.link,
            None => {
                log::warn!("<daemon>: no such interface {:?}", interface);
                return;
            }
        };
        let header = FrameHeader { dest: dst, src };
        actions.push(EngineAction::SendFrame {
            interface,
            dst,
            frame: frame::encode(&header, &pdu, sdu),
        });
    }

    /// Frame a control payload for every interface, addressed at the link
    /// layer to everyone.
    fn broadcast_control(&self, dest: u8, payload: &[u8]) -> Vec<EngineAction> {
        if payload.len() > constants::MAX_SDU_LEN {
            log::warn!("<daemon>: routing payload too large ({} bytes)", payload.len());
            return Vec::new();
        }
        let pdu = PduHeader {
            dest,
            src: self.address,
            ttl: 0,
            sdu_len: payload.len() as u16,
            sdu_type: SduType::Routing,
        };
        self.broadcast(pdu, payload)
    }

    fn broadcast_arp_request(&self, address: u8, actions: &mut Vec<EngineAction>) {
        let pdu = PduHeader {
            dest: constants::BROADCAST_ADDR,
            src: self.address,
            ttl: 0,
            sdu_len: constants::ARP_SDU_SIZE as u16,
            sdu_type: SduType::Arp,
        };
        actions.extend(self.broadcast(pdu, &ArpSdu::request(address).encode()));
    }

    fn broadcast(&self, pdu: PduHeader, sdu: &[u8]) -> Vec<EngineAction> {
        let mut actions = Vec::with_capacity(self.interfaces.len());
        for iface in &self.interfaces {
            let header = FrameHeader {
                dest: constants::BROADCAST_LINK_ADDR,
                src: iface.link,
            };
            actions.push(EngineAction::SendFrame {
                interface: iface.id,
                dst: constants::BROADCAST_LINK_ADDR,
                frame: frame::encode(&header, &pdu, sdu),
            });
        }
        actions
    }
}
