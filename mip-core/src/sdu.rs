//! SDU codecs for the three payload families: resolution, application data
//! and routing control.

use alloc::vec::Vec;
use core::fmt;

use crate::constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SduError {
    TooShort,
    BadResolutionKind(u8),
    UnknownTag([u8; 3]),
    TruncatedRoutes,
}

impl fmt::Display for SduError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SduError::TooShort => write!(f, "SDU too short"),
            SduError::BadResolutionKind(k) => write!(f, "Bad resolution kind {:#04x}", k),
            SduError::UnknownTag(t) => {
                write!(f, "Unknown routing tag {:02x}{:02x}{:02x}", t[0], t[1], t[2])
            }
            SduError::TruncatedRoutes => write!(f, "UPDATE shorter than its route count"),
        }
    }
}

// =============================================================================
// Resolution SDU
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpKind {
    Request,
    Response,
}

/// Resolution payload: a request naming the queried host, or a response
/// naming the answered host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpSdu {
    pub kind: ArpKind,
    pub address: u8,
}

impl ArpSdu {
    pub fn request(address: u8) -> Self {
        ArpSdu { kind: ArpKind::Request, address }
    }

    pub fn response(address: u8) -> Self {
        ArpSdu { kind: ArpKind::Response, address }
    }

    /// Encode as `[kind:1][address:1][padding:2]`.
    pub fn encode(&self) -> [u8; constants::ARP_SDU_SIZE] {
        let kind = match self.kind {
            ArpKind::Request => constants::ARP_REQUEST,
            ArpKind::Response => constants::ARP_RESPONSE,
        };
        [kind, self.address, 0, 0]
    }

    pub fn decode(raw: &[u8]) -> Result<Self, SduError> {
        if raw.len() < constants::ARP_SDU_SIZE {
            return Err(SduError::TooShort);
        }
        let kind = match raw[0] {
            constants::ARP_REQUEST => ArpKind::Request,
            constants::ARP_RESPONSE => ArpKind::Response,
            other => return Err(SduError::BadResolutionKind(other)),
        };
        Ok(ArpSdu { kind, address: raw[1] })
    }
}

// =============================================================================
// Application SDU
// =============================================================================

/// The `[address:1][ttl:1][payload]` envelope used both as the DATA payload
/// on the wire and as the message format on the local application channel.
///
/// Outbound, `dest` is the final destination; on delivery it carries the
/// originating host so the application knows whom to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSdu {
    pub dest: u8,
    pub ttl: u8,
    pub payload: Vec<u8>,
}

impl AppSdu {
    pub fn new(dest: u8, ttl: u8, payload: Vec<u8>) -> Self {
        AppSdu { dest, ttl, payload }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(2 + self.payload.len());
        raw.push(self.dest);
        raw.push(self.ttl);
        raw.extend_from_slice(&self.payload);
        raw
    }

    pub fn deserialize(raw: &[u8]) -> Result<Self, SduError> {
        if raw.len() < 2 {
            return Err(SduError::TooShort);
        }
        Ok(AppSdu {
            dest: raw[0],
            ttl: raw[1],
            payload: raw[2..].to_vec(),
        })
    }
}

// =============================================================================
// Routing-control SDU
// =============================================================================

/// One advertised path in an UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteAdvert {
    pub dest: u8,
    pub next_hop: u8,
    pub hops: u8,
}

/// Routing-control payload: a 3-letter ASCII tag followed by type-specific
/// fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingSdu {
    /// `HEL` + origin. Periodic keep-alive announcing a host to neighbors.
    Hello { origin: u8 },
    /// `UPD` + origin + count + count route triples.
    Update { origin: u8, routes: Vec<RouteAdvert> },
    /// `REQ` + destination. Local lookup request from daemon to router.
    Request { dest: u8 },
    /// `RES` + destination + next hop + hop count. Lookup answer; the
    /// destination identifies which outstanding request this resolves.
    Response { dest: u8, next_hop: u8, hops: u8 },
}

impl RoutingSdu {
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        match self {
            RoutingSdu::Hello { origin } => {
                raw.extend_from_slice(constants::TAG_HELLO);
                raw.push(*origin);
            }
            RoutingSdu::Update { origin, routes } => {
                raw.extend_from_slice(constants::TAG_UPDATE);
                raw.push(*origin);
                raw.push(routes.len() as u8);
                for route in routes {
                    raw.push(route.dest);
                    raw.push(route.next_hop);
                    raw.push(route.hops);
                }
            }
            RoutingSdu::Request { dest } => {
                raw.extend_from_slice(constants::TAG_REQUEST);
                raw.push(*dest);
            }
            RoutingSdu::Response { dest, next_hop, hops } => {
                raw.extend_from_slice(constants::TAG_RESPONSE);
                raw.push(*dest);
                raw.push(*next_hop);
                raw.push(*hops);
            }
        }
        raw
    }

    pub fn decode(raw: &[u8]) -> Result<Self, SduError> {
        if raw.len() < 4 {
            return Err(SduError::TooShort);
        }
        let tag = [raw[0], raw[1], raw[2]];

        if &tag == constants::TAG_HELLO {
            Ok(RoutingSdu::Hello { origin: raw[3] })
        } else if &tag == constants::TAG_UPDATE {
            if raw.len() < 5 {
                return Err(SduError::TooShort);
            }
            let origin = raw[3];
            let count = raw[4] as usize;
            if raw.len() < 5 + 3 * count {
                return Err(SduError::TruncatedRoutes);
            }
            let mut routes = Vec::with_capacity(count);
            for i in 0..count {
                let at = 5 + 3 * i;
                routes.push(RouteAdvert {
                    dest: raw[at],
                    next_hop: raw[at + 1],
                    hops: raw[at + 2],
                });
            }
            Ok(RoutingSdu::Update { origin, routes })
        } else if &tag == constants::TAG_REQUEST {
            Ok(RoutingSdu::Request { dest: raw[3] })
        } else if &tag == constants::TAG_RESPONSE {
            if raw.len() < 6 {
                return Err(SduError::TooShort);
            }
            Ok(RoutingSdu::Response {
                dest: raw[3],
                next_hop: raw[4],
                hops: raw[5],
            })
        } else {
            Err(SduError::UnknownTag(tag))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_arp_request_encoding() {
        let sdu = ArpSdu::request(42);
        assert_eq!(sdu.encode(), [0x00, 42, 0, 0]);
        assert_eq!(ArpSdu::decode(&sdu.encode()).unwrap(), sdu);
    }

    #[test]
    fn test_arp_response_encoding() {
        let sdu = ArpSdu::response(200);
        assert_eq!(sdu.encode(), [0x01, 200, 0, 0]);
        assert_eq!(ArpSdu::decode(&sdu.encode()).unwrap(), sdu);
    }

    #[test]
    fn test_arp_bad_kind() {
        assert_eq!(
            ArpSdu::decode(&[0x02, 1, 0, 0]),
            Err(SduError::BadResolutionKind(0x02))
        );
    }

    #[test]
    fn test_arp_too_short() {
        assert_eq!(ArpSdu::decode(&[0x00, 1]), Err(SduError::TooShort));
    }

    #[test]
    fn test_app_sdu_roundtrip() {
        let sdu = AppSdu::new(20, 5, b"hello".to_vec());
        let raw = sdu.serialize();
        assert_eq!(raw[0], 20);
        assert_eq!(raw[1], 5);
        assert_eq!(&raw[2..], b"hello");
        assert_eq!(AppSdu::deserialize(&raw).unwrap(), sdu);
    }

    #[test]
    fn test_app_sdu_empty_payload() {
        let sdu = AppSdu::new(1, 0, Vec::new());
        assert_eq!(AppSdu::deserialize(&sdu.serialize()).unwrap(), sdu);
    }

    #[test]
    fn test_app_sdu_too_short() {
        assert_eq!(AppSdu::deserialize(&[9]), Err(SduError::TooShort));
    }

    #[test]
    fn test_hello_roundtrip() {
        let sdu = RoutingSdu::Hello { origin: 10 };
        let raw = sdu.encode();
        assert_eq!(&raw[..3], b"HEL");
        assert_eq!(RoutingSdu::decode(&raw).unwrap(), sdu);
    }

    #[test]
    fn test_update_roundtrip() {
        let sdu = RoutingSdu::Update {
            origin: 10,
            routes: vec![
                RouteAdvert { dest: 10, next_hop: 10, hops: 0 },
                RouteAdvert { dest: 30, next_hop: 20, hops: 2 },
                RouteAdvert { dest: 40, next_hop: 20, hops: 255 },
            ],
        };
        let raw = sdu.encode();
        assert_eq!(&raw[..3], b"UPD");
        assert_eq!(raw[4], 3); // count
        assert_eq!(RoutingSdu::decode(&raw).unwrap(), sdu);
    }

    #[test]
    fn test_update_empty_routes() {
        let sdu = RoutingSdu::Update { origin: 7, routes: Vec::new() };
        assert_eq!(RoutingSdu::decode(&sdu.encode()).unwrap(), sdu);
    }

    #[test]
    fn test_request_response_roundtrip() {
        let req = RoutingSdu::Request { dest: 20 };
        assert_eq!(RoutingSdu::decode(&req.encode()).unwrap(), req);

        let res = RoutingSdu::Response { dest: 20, next_hop: 30, hops: 2 };
        assert_eq!(RoutingSdu::decode(&res.encode()).unwrap(), res);
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            RoutingSdu::decode(b"XYZ\x01"),
            Err(SduError::UnknownTag(*b"XYZ"))
        );
    }

    #[test]
    fn test_update_truncated_routes() {
        // claims 2 routes but carries only one triple
        let raw = [b'U', b'P', b'D', 10, 2, 30, 20, 2];
        assert_eq!(RoutingSdu::decode(&raw), Err(SduError::TruncatedRoutes));
    }
}
