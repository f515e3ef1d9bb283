//! Link-layer frame assembly and parsing.
//!
//! A MIP frame is the frame header (two link addresses plus the protocol
//! identifier), the PDU header, and the SDU bytes, sent as one unit. Inbound
//! frames may carry link-layer padding past the SDU; `decode` trims it using
//! the PDU length field.

use alloc::vec::Vec;
use core::fmt;

use crate::constants;
use crate::pdu::{PduError, PduHeader};
use crate::types::LinkAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    TooShort,
    WrongProtocol(u16),
    TruncatedSdu,
    Pdu(PduError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::TooShort => write!(f, "Frame too short"),
            FrameError::WrongProtocol(p) => write!(f, "Not a MIP frame (protocol {:#06x})", p),
            FrameError::TruncatedSdu => write!(f, "Frame shorter than PDU length field"),
            FrameError::Pdu(e) => write!(f, "Bad PDU header: {}", e),
        }
    }
}

impl From<PduError> for FrameError {
    fn from(e: PduError) -> Self {
        FrameError::Pdu(e)
    }
}

/// Frame header: destination and source link addresses. The protocol
/// identifier is always `ETH_P_MIP` and is filled in by `encode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub dest: LinkAddr,
    pub src: LinkAddr,
}

/// Assemble a complete on-wire frame.
pub fn encode(header: &FrameHeader, pdu: &PduHeader, sdu: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(constants::FRAME_HEADER_SIZE + constants::PDU_HEADER_SIZE + sdu.len());
    raw.extend_from_slice(&header.dest);
    raw.extend_from_slice(&header.src);
    raw.extend_from_slice(&constants::ETH_P_MIP.to_be_bytes());
    raw.extend_from_slice(&pdu.pack());
    raw.extend_from_slice(sdu);
    raw
}

/// Parse an inbound frame into its header, PDU header and SDU bytes.
pub fn decode(raw: &[u8]) -> Result<(FrameHeader, PduHeader, &[u8]), FrameError> {
    if raw.len() < constants::FRAME_HEADER_SIZE + constants::PDU_HEADER_SIZE {
        return Err(FrameError::TooShort);
    }

    let proto = u16::from_be_bytes([raw[12], raw[13]]);
    if proto != constants::ETH_P_MIP {
        return Err(FrameError::WrongProtocol(proto));
    }

    let mut dest = [0u8; constants::MAC_ADDR_LEN];
    dest.copy_from_slice(&raw[0..6]);
    let mut src = [0u8; constants::MAC_ADDR_LEN];
    src.copy_from_slice(&raw[6..12]);

    let pdu = PduHeader::unpack(&raw[constants::FRAME_HEADER_SIZE..])?;

    let sdu_start = constants::FRAME_HEADER_SIZE + constants::PDU_HEADER_SIZE;
    let sdu_end = sdu_start + pdu.sdu_len as usize;
    if raw.len() < sdu_end {
        return Err(FrameError::TruncatedSdu);
    }

    Ok((FrameHeader { dest, src }, pdu, &raw[sdu_start..sdu_end]))
}
