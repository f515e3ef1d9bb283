//! Client side of the local application channel.
//!
//! Used by the routing service and the ping applications to talk to a
//! running daemon: connect, present the entity-type byte, then exchange
//! framed envelopes.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use crate::framing;

pub struct Channel {
    stream: UnixStream,
    decoder: framing::Decoder,
    queued: VecDeque<Vec<u8>>,
}

impl Channel {
    /// Connect to the daemon at `path` and identify as `entity`.
    pub fn connect(path: &Path, entity: u8) -> io::Result<Self> {
        let mut stream = UnixStream::connect(path)?;
        stream.write_all(&[entity])?;
        Ok(Channel {
            stream,
            decoder: framing::Decoder::new(),
            queued: VecDeque::new(),
        })
    }

    /// An independent handle on the same connection, for split read/write
    /// use across threads.
    pub fn try_clone(&self) -> io::Result<Channel> {
        Ok(Channel {
            stream: self.stream.try_clone()?,
            decoder: framing::Decoder::new(),
            queued: VecDeque::new(),
        })
    }

    /// Send one envelope.
    pub fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(&framing::frame(data))
    }

    /// Block until the next complete envelope arrives. `Ok(None)` on
    /// timeout; an error when the daemon closed the channel.
    pub fn recv_timeout(&mut self, timeout: Option<Duration>) -> io::Result<Option<Vec<u8>>> {
        self.stream.set_read_timeout(timeout)?;
        let mut buf = [0u8; 1024];
        loop {
            if let Some(message) = self.queued.pop_front() {
                return Ok(Some(message));
            }
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "channel closed by daemon",
                    ))
                }
                Ok(n) => self.queued.extend(self.decoder.feed(&buf[..n])),
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Block until the next complete envelope arrives.
    pub fn recv(&mut self) -> io::Result<Vec<u8>> {
        loop {
            if let Some(message) = self.recv_timeout(None)? {
                return Ok(message);
            }
        }
    }
}
