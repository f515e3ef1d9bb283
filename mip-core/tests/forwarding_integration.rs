//! End-to-end tests over a virtual broadcast network.
//!
//! Each host runs a real forwarding engine plus a real routing engine; the
//! harness shuttles engine actions between them and models shared link
//! segments, so the full lookup → park → resolve → transmit pipeline runs
//! without sockets.

use std::collections::VecDeque;

use mip_core::engine::{EngineAction, EngineConfig, MipEngine};
use mip_core::router::{RouterAction, RouterEngine};
use mip_core::sdu::{AppSdu, RoutingSdu};
use mip_core::types::{InterfaceId, LinkAddr, LocalInterface};

const BROADCAST: LinkAddr = [0xFF; 6];

fn mac(address: u8, ifindex: i32) -> LinkAddr {
    [address, ifindex as u8, 0, 0, 0, address]
}

struct Host {
    address: u8,
    engine: MipEngine,
    router: RouterEngine,
    inbox: Vec<AppSdu>,
    /// (interface, link address, segment) per attachment.
    ifaces: Vec<(InterfaceId, LinkAddr, usize)>,
}

enum Item {
    Engine(usize, EngineAction),
    Router(usize, RouterAction),
}

struct Net {
    hosts: Vec<Host>,
}

impl Net {
    /// Build hosts from (address, segments-attached-to) pairs.
    fn new(layout: &[(u8, &[usize])]) -> Self {
        let hosts = layout
            .iter()
            .map(|(address, segments)| {
                let ifaces: Vec<(InterfaceId, LinkAddr, usize)> = segments
                    .iter()
                    .enumerate()
                    .map(|(n, &segment)| {
                        let id = InterfaceId(n as i32 + 1);
                        (id, mac(*address, id.0), segment)
                    })
                    .collect();
                let interfaces = ifaces
                    .iter()
                    .map(|&(id, link, _)| LocalInterface { id, link })
                    .collect();
                Host {
                    address: *address,
                    engine: MipEngine::new(EngineConfig {
                        address: *address,
                        interfaces,
                    }),
                    router: RouterEngine::new(*address),
                    inbox: Vec::new(),
                    ifaces,
                }
            })
            .collect();
        Net { hosts }
    }

    fn host(&self, address: u8) -> usize {
        self.hosts
            .iter()
            .position(|h| h.address == address)
            .expect("no such host")
    }

    fn start_routers(&mut self) {
        for at in 0..self.hosts.len() {
            let actions = self.hosts[at].router.start();
            self.pump(actions.into_iter().map(|a| Item::Router(at, a)).collect());
        }
    }

    fn tick_round(&mut self) {
        for at in 0..self.hosts.len() {
            let actions = self.hosts[at].router.handle_tick();
            self.pump(actions.into_iter().map(|a| Item::Router(at, a)).collect());
        }
    }

    fn send_app(&mut self, from: u8, dest: u8, payload: &[u8]) {
        let at = self.host(from);
        let raw = AppSdu::new(dest, 0, payload.to_vec()).serialize();
        let actions = self.hosts[at].engine.handle_app_data(&raw);
        self.pump(actions.into_iter().map(|a| Item::Engine(at, a)).collect());
    }

    fn pump(&mut self, mut queue: VecDeque<Item>) {
        while let Some(item) = queue.pop_front() {
            match item {
                Item::Engine(at, EngineAction::SendFrame { interface, dst, frame }) => {
                    let segment = self.hosts[at]
                        .ifaces
                        .iter()
                        .find(|(id, _, _)| *id == interface)
                        .map(|(_, _, segment)| *segment)
                        .expect("frame sent on unknown interface");

                    // every other host attached to the segment whose NIC
                    // accepts the destination address receives the frame
                    let receivers: Vec<(usize, InterfaceId)> = self
                        .hosts
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != at)
                        .flat_map(|(other, host)| {
                            host.ifaces
                                .iter()
                                .filter(|(_, link, seg)| {
                                    *seg == segment && (dst == BROADCAST || dst == *link)
                                })
                                .map(move |(id, _, _)| (other, *id))
                                .collect::<Vec<_>>()
                        })
                        .collect();

                    for (other, iface) in receivers {
                        let actions = self.hosts[other].engine.handle_link_frame(iface, &frame);
                        queue.extend(actions.into_iter().map(|a| Item::Engine(other, a)));
                    }
                }
                Item::Engine(at, EngineAction::DeliverApp { sdu }) => {
                    self.hosts[at].inbox.push(sdu);
                }
                Item::Engine(at, EngineAction::DeliverRouting { sdu }) => {
                    let decoded = RoutingSdu::decode(&sdu.payload).expect("bad routing envelope");
                    let actions = self.hosts[at].router.handle_message(decoded);
                    queue.extend(actions.into_iter().map(|a| Item::Router(at, a)));
                }
                Item::Router(at, RouterAction { target, sdu }) => {
                    let raw = AppSdu::new(target, 0, sdu.encode()).serialize();
                    let actions = self.hosts[at].engine.handle_routing_data(&raw);
                    queue.extend(actions.into_iter().map(|a| Item::Engine(at, a)));
                }
            }
        }
    }
}

#[test]
fn direct_neighbor_ping_end_to_end() {
    let mut net = Net::new(&[(10, &[0]), (20, &[0])]);
    net.start_routers();
    net.tick_round();

    // cold start: no route, no resolution entry for 20 anywhere on A
    let a = net.host(10);
    assert!(!net.hosts[a].engine.arp().contains(20));

    net.send_app(10, 20, b"hello");

    // the datagram went lookup -> park -> resolve -> park -> transmit
    let b = net.host(20);
    assert_eq!(net.hosts[b].inbox.len(), 1);
    let delivered = &net.hosts[b].inbox[0];
    assert_eq!(delivered.dest, 10); // originator
    assert_eq!(delivered.payload, b"hello");
    // direct neighbor: full default TTL, no hop spent
    assert_eq!(delivered.ttl, 15);

    // both ends cached each other's link address along the way
    let a = net.host(10);
    assert!(net.hosts[a].engine.arp().contains(20));
    assert!(net.hosts[b].engine.arp().contains(10));

    // nothing left parked
    assert!(net.hosts[a].engine.pending().is_empty());
    assert!(net.hosts[b].engine.pending().is_empty());
}

#[test]
fn two_hop_forwarding_spends_ttl() {
    // A(10) -- seg0 -- B(20) -- seg1 -- C(30)
    let mut net = Net::new(&[(10, &[0]), (20, &[0, 1]), (30, &[1])]);
    net.start_routers();
    net.tick_round();
    net.tick_round();

    net.send_app(10, 30, b"over the hill");

    let c = net.host(30);
    assert_eq!(net.hosts[c].inbox.len(), 1);
    let delivered = &net.hosts[c].inbox[0];
    assert_eq!(delivered.dest, 10);
    assert_eq!(delivered.payload, b"over the hill");
    // one forwarding hop at B
    assert_eq!(delivered.ttl, 14);

    // and the answer finds its way back
    net.send_app(30, 10, b"and back");
    let a = net.host(10);
    assert_eq!(net.hosts[a].inbox.len(), 1);
    assert_eq!(net.hosts[a].inbox[0].dest, 30);
    assert_eq!(net.hosts[a].inbox[0].payload, b"and back");
}

#[test]
fn unroutable_destination_is_dropped() {
    let mut net = Net::new(&[(10, &[0]), (20, &[0])]);
    net.start_routers();
    net.tick_round();

    net.send_app(10, 99, b"into the void");

    let a = net.host(10);
    // the no-route response drained the parked packet
    assert!(net.hosts[a].engine.pending().is_empty());
    let b = net.host(20);
    assert!(net.hosts[b].inbox.is_empty());
}

#[test]
fn concurrent_lookups_to_distinct_destinations() {
    // A talks to both B and C at once; responses must pair with the right
    // parked packets regardless of arrival order
    let mut net = Net::new(&[(10, &[0]), (20, &[0]), (30, &[0])]);
    net.start_routers();
    net.tick_round();

    net.send_app(10, 20, b"for B");
    net.send_app(10, 30, b"for C");

    let b = net.host(20);
    let c = net.host(30);
    assert_eq!(net.hosts[b].inbox.len(), 1);
    assert_eq!(net.hosts[b].inbox[0].payload, b"for B");
    assert_eq!(net.hosts[c].inbox.len(), 1);
    assert_eq!(net.hosts[c].inbox[0].payload, b"for C");
}

#[test]
fn neighbor_timeout_invalidates_transit_routes() {
    // A -- B -- C, then B goes silent from A's point of view
    let mut net = Net::new(&[(10, &[0]), (20, &[0, 1]), (30, &[1])]);
    net.start_routers();
    net.tick_round();
    net.tick_round();

    // confirm A can reach C first
    net.send_app(10, 30, b"probe");
    let c = net.host(30);
    assert_eq!(net.hosts[c].inbox.len(), 1);

    // two generations without any HELLO from B or C reaching A
    let a = net.host(10);
    let actions = net.hosts[a].router.handle_tick();
    net.pump(actions.into_iter().map(|x| Item::Router(a, x)).collect());
    let actions = net.hosts[a].router.handle_tick();
    net.pump(actions.into_iter().map(|x| Item::Router(a, x)).collect());

    // sending again now dies on the no-route answer instead of reaching C
    net.send_app(10, 30, b"ghost");
    let a = net.host(10);
    assert!(net.hosts[a].engine.pending().is_empty());
    let c = net.host(30);
    assert_eq!(net.hosts[c].inbox.len(), 1, "no second delivery expected");
}
