//! Local application channel server.
//!
//! Applications connect over a Unix stream socket at the configured
//! rendezvous path. The first byte of a connection identifies the entity
//! (PING-DATA or ROUTING-CONTROL); everything after it, in both directions,
//! is framed envelopes. Each client gets a reader thread feeding the
//! driver's event queue.

use std::fs;
use std::io::{self, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::thread;

use mip_core::constants;

use crate::event::{ChannelId, ClientKind, Event, EventSender};
use crate::framing;
use crate::interface::ChannelWriter;

/// Bind the channel socket and spawn the acceptor thread.
pub fn start_server(path: &Path, tx: EventSender) -> io::Result<()> {
    // a stale socket file from a previous run would fail the bind
    let _ = fs::remove_file(path);
    let listener = UnixListener::bind(path)?;

    log::info!("channel server listening on {}", path.display());

    thread::Builder::new()
        .name("channel-server".into())
        .spawn(move || accept_loop(listener, tx))?;
    Ok(())
}

fn accept_loop(listener: UnixListener, tx: EventSender) {
    let mut next_id = 1u64;
    for stream_result in listener.incoming() {
        let stream = match stream_result {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("channel accept failed: {}", e);
                continue;
            }
        };
        let id = ChannelId(next_id);
        next_id += 1;

        let client_tx = tx.clone();
        thread::Builder::new()
            .name(format!("channel-reader-{}", id.0))
            .spawn(move || reader_loop(stream, id, client_tx))
            .ok();
    }
}

fn reader_loop(mut stream: UnixStream, id: ChannelId, tx: EventSender) {
    // the entity-type byte comes first, unframed
    let mut entity = [0u8; 1];
    if stream.read_exact(&mut entity).is_err() {
        return;
    }
    let kind = match entity[0] {
        constants::ENTITY_PING => ClientKind::Ping,
        constants::ENTITY_ROUTING => ClientKind::Routing,
        other => {
            log::warn!("client {} sent unknown entity type {:#04x}", id.0, other);
            return;
        }
    };

    let writer_stream = match stream.try_clone() {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("client {} stream clone failed: {}", id.0, e);
            return;
        }
    };
    let writer: Box<dyn ChannelWriter> = Box::new(LocalChannelWriter {
        stream: writer_stream,
    });
    if tx.send(Event::ClientUp { id, kind, writer }).is_err() {
        return;
    }

    let mut decoder = framing::Decoder::new();
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => {
                let _ = tx.send(Event::ClientDown { id });
                return;
            }
            Ok(n) => {
                for data in decoder.feed(&buf[..n]) {
                    if tx.send(Event::ClientData { id, data }).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                log::debug!("client {} read error: {}", id.0, e);
                let _ = tx.send(Event::ClientDown { id });
                return;
            }
        }
    }
}

struct LocalChannelWriter {
    stream: UnixStream,
}

impl ChannelWriter for LocalChannelWriter {
    fn send_msg(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(&framing::frame(data))
    }
}
