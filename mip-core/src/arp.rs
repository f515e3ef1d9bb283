//! Resolution cache: maps host addresses to link addresses and egress
//! interfaces.
//!
//! The table is bounded. Inserting into a full table fails with `TableFull`;
//! the caller decides whether to evict. `evict_lru` removes the
//! least-recently-used learned entry — entries for this host's own addresses
//! are never evicted.

use alloc::vec::Vec;
use core::fmt;

use crate::constants;
use crate::types::{InterfaceId, LinkAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFull;

impl fmt::Display for TableFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolution cache full")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No such resolution entry")
    }
}

/// How a cached host is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    /// One of this host's own addresses; not subject to eviction.
    Local,
    /// Reached through the given local interface.
    Via(InterfaceId),
}

#[derive(Debug, Clone, Copy)]
struct ArpEntry {
    address: u8,
    link: LinkAddr,
    reach: Reach,
    last_used: u64,
}

/// The resolution cache.
pub struct ArpTable {
    entries: Vec<ArpEntry>,
    capacity: usize,
    clock: u64,
}

impl ArpTable {
    pub fn new() -> Self {
        Self::with_capacity(constants::ARP_TABLE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ArpTable {
            entries: Vec::new(),
            capacity,
            clock: 0,
        }
    }

    /// Insert or overwrite the mapping for `address`. Overwriting replaces
    /// the link address and interface, which handles link-address changes.
    pub fn insert(&mut self, address: u8, link: LinkAddr, reach: Reach) -> Result<(), TableFull> {
        self.clock += 1;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.address == address) {
            entry.link = link;
            entry.reach = reach;
            entry.last_used = self.clock;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(TableFull);
        }
        self.entries.push(ArpEntry {
            address,
            link,
            reach,
            last_used: self.clock,
        });
        Ok(())
    }

    /// Look up the link address and reach for a host, refreshing recency.
    pub fn lookup(&mut self, address: u8) -> Option<(LinkAddr, Reach)> {
        self.clock += 1;
        let clock = self.clock;
        self.entries
            .iter_mut()
            .find(|e| e.address == address)
            .map(|e| {
                e.last_used = clock;
                (e.link, e.reach)
            })
    }

    /// Whether an entry exists, without touching recency.
    pub fn contains(&self, address: u8) -> bool {
        self.entries.iter().any(|e| e.address == address)
    }

    pub fn remove(&mut self, address: u8) -> Result<(), NotFound> {
        match self.entries.iter().position(|e| e.address == address) {
            Some(at) => {
                self.entries.remove(at);
                Ok(())
            }
            None => Err(NotFound),
        }
    }

    /// Evict the least-recently-used learned entry, returning its address.
    /// Local entries survive.
    pub fn evict_lru(&mut self) -> Option<u8> {
        let at = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.reach != Reach::Local)
            .min_by_key(|(_, e)| e.last_used)
            .map(|(at, _)| at)?;
        Some(self.entries.remove(at).address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ArpTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss() {
        let mut table = ArpTable::new();
        assert_eq!(table.lookup(42), None);
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = ArpTable::new();
        table.insert(20, [0xAA; 6], Reach::Via(InterfaceId(3))).unwrap();

        let (link, reach) = table.lookup(20).unwrap();
        assert_eq!(link, [0xAA; 6]);
        assert_eq!(reach, Reach::Via(InterfaceId(3)));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = ArpTable::new();
        table.insert(20, [0xAA; 6], Reach::Via(InterfaceId(3))).unwrap();
        table.insert(20, [0xAA; 6], Reach::Via(InterfaceId(3))).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_insert_overwrites_changed_link() {
        let mut table = ArpTable::new();
        table.insert(20, [0xAA; 6], Reach::Via(InterfaceId(3))).unwrap();
        table.insert(20, [0xBB; 6], Reach::Via(InterfaceId(4))).unwrap();

        assert_eq!(table.len(), 1);
        let (link, reach) = table.lookup(20).unwrap();
        assert_eq!(link, [0xBB; 6]);
        assert_eq!(reach, Reach::Via(InterfaceId(4)));
    }

    #[test]
    fn test_insert_full_table_fails() {
        let mut table = ArpTable::with_capacity(2);
        table.insert(1, [0x01; 6], Reach::Via(InterfaceId(1))).unwrap();
        table.insert(2, [0x02; 6], Reach::Via(InterfaceId(1))).unwrap();
        assert_eq!(
            table.insert(3, [0x03; 6], Reach::Via(InterfaceId(1))),
            Err(TableFull)
        );
        // overwriting an existing entry still works
        table.insert(2, [0x22; 6], Reach::Via(InterfaceId(1))).unwrap();
    }

    #[test]
    fn test_remove() {
        let mut table = ArpTable::new();
        table.insert(20, [0xAA; 6], Reach::Via(InterfaceId(3))).unwrap();
        assert_eq!(table.remove(20), Ok(()));
        assert_eq!(table.remove(20), Err(NotFound));
        assert!(table.is_empty());
    }

    #[test]
    fn test_evict_lru_skips_local() {
        let mut table = ArpTable::with_capacity(3);
        table.insert(10, [0x00; 6], Reach::Local).unwrap();
        table.insert(20, [0x02; 6], Reach::Via(InterfaceId(1))).unwrap();
        table.insert(30, [0x03; 6], Reach::Via(InterfaceId(1))).unwrap();

        // 20 is older than 30; refresh 20 so 30 becomes the LRU
        table.lookup(20);

        assert_eq!(table.evict_lru(), Some(30));
        assert!(table.contains(10));
        assert!(table.contains(20));
    }

    #[test]
    fn test_evict_lru_only_local_left() {
        let mut table = ArpTable::new();
        table.insert(10, [0x00; 6], Reach::Local).unwrap();
        assert_eq!(table.evict_lru(), None);
        assert!(table.contains(10));
    }
}
