//! The distance-vector routing engine.
//!
//! Maintains routing state and processes routing-control messages without
//! performing any I/O. Returns `Vec<RouterAction>` that the caller writes to
//! the daemon channel. One instance runs per routing service process.

pub mod table;

use alloc::vec::Vec;

use crate::constants;
use crate::sdu::{RouteAdvert, RoutingSdu};

use self::table::RoutingTable;

/// The engine's position in its periodic cycle.
///
/// `SendHello` and `BroadcastUpdate` are transient: handling an event walks
/// through them and settles back in `AwaitEvent`. `Exit` is terminal and
/// makes every handler a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    SendHello,
    AwaitEvent,
    BroadcastUpdate,
    Exit,
}

/// An outbound routing-control message for the caller to deliver.
///
/// `target` is the broadcast sentinel for HELLOs, the addressed neighbor
/// for UPDATEs, and this host for lookup RESPONSEs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterAction {
    pub target: u8,
    pub sdu: RoutingSdu,
}

pub struct RouterEngine {
    address: u8,
    generation: u8,
    state: RouterState,
    table: RoutingTable,
}

impl RouterEngine {
    pub fn new(address: u8) -> Self {
        let mut table = RoutingTable::new();
        // this host's own entry; hop count zero, never subject to timeout
        table.merge(address, address, 0, 0);
        RouterEngine {
            address,
            generation: 0,
            state: RouterState::SendHello,
            table,
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn generation(&self) -> u8 {
        self.generation
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Emit the initial HELLO. The caller arms the periodic timer alongside.
    pub fn start(&mut self) -> Vec<RouterAction> {
        if self.state != RouterState::SendHello {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.send_hello(&mut actions);
        actions
    }

    /// Periodic timer fired: detect silent neighbors, propagate any
    /// unreachability, then announce ourselves for the next period.
    pub fn handle_tick(&mut self) -> Vec<RouterAction> {
        if self.state != RouterState::AwaitEvent {
            return Vec::new();
        }
        let mut actions = Vec::new();

        let mut changed = false;
        for neighbor in self.table.timed_out_neighbors(self.generation) {
            log::debug!("<router {}> neighbor {} timed out", self.address, neighbor);
            changed |= self.table.invalidate_via(neighbor);
        }
        if changed {
            self.broadcast_update(&mut actions);
        }

        self.state = RouterState::SendHello;
        self.send_hello(&mut actions);
        actions
    }

    /// A routing-control message arrived from the daemon channel.
    pub fn handle_message(&mut self, sdu: RoutingSdu) -> Vec<RouterAction> {
        if self.state != RouterState::AwaitEvent {
            return Vec::new();
        }
        let mut actions = Vec::new();
        match sdu {
            RoutingSdu::Hello { origin } => self.handle_hello(origin, &mut actions),
            RoutingSdu::Update { origin, routes } => {
                self.handle_update(origin, &routes, &mut actions)
            }
            RoutingSdu::Request { dest } => self.handle_request(dest, &mut actions),
            RoutingSdu::Response { .. } => {
                // lookup answers flow router -> daemon, never the other way
                log::debug!("<router {}> ignoring unexpected lookup response", self.address);
            }
        }
        actions
    }

    /// Enter the terminal state; all further events are ignored.
    pub fn shutdown(&mut self) {
        self.state = RouterState::Exit;
    }

    fn handle_hello(&mut self, origin: u8, actions: &mut Vec<RouterAction>) {
        if origin == self.address {
            return;
        }
        let is_new = !self.table.has_pair(origin, origin);
        self.table.merge(origin, origin, 1, self.generation);
        self.table.stamp_neighbor(origin, self.generation);
        if is_new {
            log::debug!("<router {}> new neighbor {}", self.address, origin);
            self.broadcast_update(actions);
        }
    }

    fn handle_update(&mut self, origin: u8, routes: &[RouteAdvert], actions: &mut Vec<RouterAction>) {
        let mut changed = false;
        for route in routes {
            // never accept a route through ourselves
            if route.next_hop == self.address {
                continue;
            }
            let hops = if route.hops == constants::UNREACHABLE {
                constants::UNREACHABLE
            } else {
                route.hops.saturating_add(1)
            };
            changed |= self.table.merge(route.dest, origin, hops, self.generation);
        }
        if changed {
            log::debug!("<router {}> table updated by {}", self.address, origin);
            self.broadcast_update(actions);
        }
    }

    fn handle_request(&mut self, dest: u8, actions: &mut Vec<RouterAction>) {
        let (next_hop, hops) = self
            .table
            .best(dest)
            .unwrap_or((constants::BROADCAST_ADDR, constants::UNREACHABLE));
        actions.push(RouterAction {
            target: self.address,
            sdu: RoutingSdu::Response { dest, next_hop, hops },
        });
    }

    /// Send one poisoned UPDATE per usable neighbor: paths through that
    /// neighbor are reported back to it as unreachable, only in the
    /// outgoing message.
    fn broadcast_update(&mut self, actions: &mut Vec<RouterAction>) {
        self.state = RouterState::BroadcastUpdate;
        let adverts = self.table.adverts();
        for neighbor in self.table.neighbors() {
            let routes: Vec<RouteAdvert> = adverts
                .iter()
                .map(|advert| {
                    if advert.next_hop == neighbor {
                        RouteAdvert {
                            hops: constants::UNREACHABLE,
                            ..*advert
                        }
                    } else {
                        *advert
                    }
                })
                .collect();
            actions.push(RouterAction {
                target: neighbor,
                sdu: RoutingSdu::Update {
                    origin: self.address,
                    routes,
                },
            });
        }
        self.state = RouterState::AwaitEvent;
    }

    fn send_hello(&mut self, actions: &mut Vec<RouterAction>) {
        actions.push(RouterAction {
            target: constants::BROADCAST_ADDR,
            sdu: RoutingSdu::Hello {
                origin: self.address,
            },
        });
        self.generation = self.generation.wrapping_add(1);
        self.state = RouterState::AwaitEvent;
    }
}
