//! Raw link-layer interface over an `AF_PACKET` socket.
//!
//! One raw socket bound to the MIP EtherType carries traffic for every
//! local interface; outbound frames name their egress interface in the
//! `sockaddr_ll`, inbound frames report the receiving interface the same
//! way. A reader thread feeds whole frames into the driver's event queue.

use std::io;
use std::mem;
use std::thread::{self, JoinHandle};

use mip_core::constants;
use mip_core::types::{InterfaceId, LinkAddr, LocalInterface};

use crate::event::{Event, EventSender};
use crate::interface::LinkWriter;

/// `sll_pkttype` value for looped-back copies of our own transmissions.
const PACKET_OUTGOING: u8 = 4;

/// Largest frame the reader accepts.
const READ_BUF_SIZE: usize = 2048;

/// The raw link socket.
pub struct EthernetLink {
    fd: i32,
}

impl EthernetLink {
    /// Open an `AF_PACKET`/`SOCK_RAW` socket filtered to the MIP EtherType.
    pub fn open() -> io::Result<Self> {
        let protocol = (constants::ETH_P_MIP).to_be() as i32;
        let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, protocol) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(EthernetLink { fd })
    }

    /// A writer sharing this socket, for the driver to own.
    pub fn writer(&self) -> io::Result<Box<dyn LinkWriter>> {
        let fd = unsafe { libc::dup(self.fd) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Box::new(EthernetWriter { fd }))
    }

    /// Spawn the reader thread. Receive errors are fatal for the daemon and
    /// surface as `Event::LinkDown`.
    pub fn spawn_reader(&self, tx: EventSender) -> io::Result<JoinHandle<()>> {
        let fd = unsafe { libc::dup(self.fd) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        thread::Builder::new()
            .name("link-reader".into())
            .spawn(move || reader_loop(fd, tx))
    }
}

impl Drop for EthernetLink {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

fn reader_loop(fd: i32, tx: EventSender) {
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
        let mut addr_len = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
        let n = unsafe {
            libc::recvfrom(
                fd,
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
                &mut addr as *mut libc::sockaddr_ll as *mut libc::sockaddr,
                &mut addr_len,
            )
        };
        if n < 0 {
            let error = io::Error::last_os_error();
            if error.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            let _ = tx.send(Event::LinkDown(error.to_string()));
            break;
        }
        // the kernel loops our own transmissions back with PACKET_OUTGOING
        if addr.sll_pkttype == PACKET_OUTGOING {
            continue;
        }
        let event = Event::LinkFrame {
            interface: InterfaceId(addr.sll_ifindex),
            data: buf[..n as usize].to_vec(),
        };
        if tx.send(event).is_err() {
            break;
        }
    }
    unsafe { libc::close(fd) };
}

struct EthernetWriter {
    fd: i32,
}

impl LinkWriter for EthernetWriter {
    fn send_frame(&mut self, interface: InterfaceId, dst: &LinkAddr, frame: &[u8]) -> io::Result<()> {
        let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as libc::c_ushort;
        addr.sll_protocol = constants::ETH_P_MIP.to_be();
        addr.sll_ifindex = interface.0;
        addr.sll_halen = constants::MAC_ADDR_LEN as u8;
        addr.sll_addr[..constants::MAC_ADDR_LEN].copy_from_slice(dst);

        let n = unsafe {
            libc::sendto(
                self.fd,
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for EthernetWriter {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}

/// Enumerate usable link-layer interfaces: every non-loopback `AF_PACKET`
/// interface with its index and link address.
pub fn local_interfaces() -> io::Result<Vec<LocalInterface>> {
    let mut interfaces = Vec::new();

    let mut ifap: *mut libc::ifaddrs = std::ptr::null_mut();
    if unsafe { libc::getifaddrs(&mut ifap) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let mut cursor = ifap;
    while !cursor.is_null() {
        let ifa = unsafe { &*cursor };
        cursor = ifa.ifa_next;

        if ifa.ifa_addr.is_null() {
            continue;
        }
        if unsafe { (*ifa.ifa_addr).sa_family } as i32 != libc::AF_PACKET {
            continue;
        }
        if ifa.ifa_flags & libc::IFF_LOOPBACK as u32 != 0 {
            continue;
        }

        let sll = unsafe { &*(ifa.ifa_addr as *const libc::sockaddr_ll) };
        let mut link: LinkAddr = [0; constants::MAC_ADDR_LEN];
        link.copy_from_slice(&sll.sll_addr[..constants::MAC_ADDR_LEN]);
        interfaces.push(LocalInterface {
            id: InterfaceId(sll.sll_ifindex),
            link,
        });
    }

    unsafe { libc::freeifaddrs(ifap) };
    Ok(interfaces)
}
