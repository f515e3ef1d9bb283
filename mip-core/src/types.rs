use crate::constants;

/// A link-layer (MAC) address.
pub type LinkAddr = [u8; constants::MAC_ADDR_LEN];

/// Opaque identifier for a local network interface (the OS ifindex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterfaceId(pub i32);

/// A local egress interface: OS identifier plus its link address, used as
/// the source address when framing outbound traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalInterface {
    pub id: InterfaceId,
    pub link: LinkAddr,
}
