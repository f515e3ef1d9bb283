//! The routing table.
//!
//! Keeps every candidate path per destination, one entry per
//! (destination, next-hop) pair. Entries are never removed; a dead path is
//! marked with the unreachable hop count and revives in place when a usable
//! report for the same pair arrives. Keeping the alternates allows immediate
//! fallback to another next hop when the primary is invalidated, without
//! re-converging from scratch.

use alloc::vec::Vec;

use crate::constants;
use crate::sdu::RouteAdvert;

/// One candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub dest: u8,
    pub next_hop: u8,
    /// Hop count; `constants::UNREACHABLE` marks a dead path.
    pub hops: u8,
    /// Generation stamp of the last HELLO seen for this path's neighbor.
    pub generation: u8,
}

pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        RoutingTable { entries: Vec::new() }
    }

    /// Merge one reported path. For an existing (destination, next-hop)
    /// pair the hop count is mutated in place — covering improvement,
    /// worsening, downgrade to unreachable and revival — otherwise a new
    /// candidate is appended. Returns whether the table changed.
    pub fn merge(&mut self, dest: u8, next_hop: u8, hops: u8, generation: u8) -> bool {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.dest == dest && e.next_hop == next_hop)
        {
            if entry.hops == hops {
                return false;
            }
            entry.hops = hops;
            entry.generation = generation;
            return true;
        }
        self.entries.push(RouteEntry {
            dest,
            next_hop,
            hops,
            generation,
        });
        true
    }

    /// Whether a candidate for (dest, next_hop) exists, dead or alive.
    pub fn has_pair(&self, dest: u8, next_hop: u8) -> bool {
        self.entries
            .iter()
            .any(|e| e.dest == dest && e.next_hop == next_hop)
    }

    /// Best known path to `dest`: the minimum hop count among usable
    /// candidates.
    pub fn best(&self, dest: u8) -> Option<(u8, u8)> {
        self.entries
            .iter()
            .filter(|e| e.dest == dest && e.hops != constants::UNREACHABLE)
            .min_by_key(|e| e.hops)
            .map(|e| (e.next_hop, e.hops))
    }

    /// Refresh the generation stamp on the direct entry for `neighbor`.
    pub fn stamp_neighbor(&mut self, neighbor: u8, generation: u8) {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.dest == neighbor && e.hops == 1)
        {
            entry.generation = generation;
        }
    }

    /// Direct neighbors whose generation stamp does not match `generation`,
    /// i.e. no HELLO arrived in the last period.
    pub fn timed_out_neighbors(&self, generation: u8) -> Vec<u8> {
        let mut stale = Vec::new();
        for entry in &self.entries {
            if entry.hops == 1 && entry.generation != generation && !stale.contains(&entry.next_hop)
            {
                stale.push(entry.next_hop);
            }
        }
        stale
    }

    /// Mark every path routed through `next_hop` unreachable, including the
    /// neighbor's own entry. Returns whether anything changed.
    pub fn invalidate_via(&mut self, next_hop: u8) -> bool {
        let mut changed = false;
        for entry in self.entries.iter_mut().filter(|e| e.next_hop == next_hop) {
            if entry.hops != constants::UNREACHABLE {
                entry.hops = constants::UNREACHABLE;
                changed = true;
            }
        }
        changed
    }

    /// Usable direct neighbors, deduplicated.
    pub fn neighbors(&self) -> Vec<u8> {
        let mut neighbors = Vec::new();
        for entry in &self.entries {
            if entry.hops == 1 && !neighbors.contains(&entry.next_hop) {
                neighbors.push(entry.next_hop);
            }
        }
        neighbors
    }

    /// The table reduced to one advert per destination: the best candidate,
    /// or an unreachable report when every candidate is dead (so that loss
    /// of a destination propagates).
    pub fn adverts(&self) -> Vec<RouteAdvert> {
        let mut adverts: Vec<RouteAdvert> = Vec::new();
        for entry in &self.entries {
            match adverts.iter_mut().find(|a| a.dest == entry.dest) {
                Some(advert) => {
                    if entry.hops < advert.hops {
                        advert.next_hop = entry.next_hop;
                        advert.hops = entry.hops;
                    }
                }
                None => adverts.push(RouteAdvert {
                    dest: entry.dest,
                    next_hop: entry.next_hop,
                    hops: entry.hops,
                }),
            }
        }
        adverts
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}
