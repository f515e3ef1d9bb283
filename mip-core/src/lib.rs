#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

pub mod constants;
pub mod types;
pub mod pdu;
pub mod frame;
pub mod sdu;
pub mod arp;
pub mod pending;
pub mod router;
pub mod engine;
