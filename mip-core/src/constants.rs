// =============================================================================
// MIP protocol constants
// =============================================================================

/// EtherType carried in the frame header of every MIP frame.
pub const ETH_P_MIP: u16 = 0x88B5;

/// Link address length in bytes.
pub const MAC_ADDR_LEN: usize = 6;

/// Link-layer broadcast address.
pub const BROADCAST_LINK_ADDR: [u8; MAC_ADDR_LEN] = [0xFF; MAC_ADDR_LEN];

/// Sentinel link address stored in resolution entries for this host's own
/// addresses.
pub const LOCAL_LINK_ADDR: [u8; MAC_ADDR_LEN] = [0x00; MAC_ADDR_LEN];

/// Frame header size: two link addresses plus the protocol identifier.
pub const FRAME_HEADER_SIZE: usize = 2 * MAC_ADDR_LEN + 2;

/// PDU header size in bytes.
pub const PDU_HEADER_SIZE: usize = 4;

// --- Address space ---

/// Lowest assignable host address.
pub const MIN_ADDR: u8 = 0x00;

/// Broadcast / "no route" sentinel. Never assigned to a real host.
pub const BROADCAST_ADDR: u8 = 0xFF;

// --- PDU fields ---

/// TTL is a 4-bit field.
pub const MAX_TTL: u8 = 0x0F;

/// SDU length is a 9-bit field.
pub const MAX_SDU_LEN: usize = 0x1FF;

/// SDU type tags (3-bit field).
pub const SDU_TYPE_ARP: u8 = 0x01;
pub const SDU_TYPE_DATA: u8 = 0x02;
pub const SDU_TYPE_ROUTING: u8 = 0x04;

// --- Resolution ---

/// Resolution SDU kinds.
pub const ARP_REQUEST: u8 = 0x00;
pub const ARP_RESPONSE: u8 = 0x01;

/// Encoded resolution SDU size (kind + address + padding).
pub const ARP_SDU_SIZE: usize = 4;

/// Resolution cache capacity.
pub const ARP_TABLE_SIZE: usize = 16;

// --- Routing ---

/// Hop count marking a destination as unreachable.
pub const UNREACHABLE: u8 = 0xFF;

/// Routing-control message tags.
pub const TAG_HELLO: &[u8; 3] = b"HEL";
pub const TAG_UPDATE: &[u8; 3] = b"UPD";
pub const TAG_REQUEST: &[u8; 3] = b"REQ";
pub const TAG_RESPONSE: &[u8; 3] = b"RES";

/// HELLO period in seconds. A direct neighbor missing one full period is
/// declared unreachable.
pub const HELLO_INTERVAL_SECS: u64 = 1;

// --- Pending-packet buffer ---

/// Pending-packet buffer capacity; overflow drops the oldest entry.
pub const PENDING_CAPACITY: usize = 32;

// --- Local application channel ---

/// Entity-type byte sent by a PING-DATA client on connect.
pub const ENTITY_PING: u8 = 0x02;

/// Entity-type byte sent by a ROUTING-CONTROL client on connect.
pub const ENTITY_ROUTING: u8 = 0x04;
