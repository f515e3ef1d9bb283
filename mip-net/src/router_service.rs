//! The distance-vector routing service loop.
//!
//! Connects to a running daemon as a ROUTING-CONTROL client and drives a
//! `RouterEngine`: a reader thread and a periodic timer thread feed one
//! event queue, the service thread owns the engine and writes its actions
//! back to the channel.

use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use mip_core::constants;
use mip_core::router::{RouterAction, RouterEngine};
use mip_core::sdu::{AppSdu, RoutingSdu};

use crate::client::Channel;

enum ServiceEvent {
    /// A routing envelope arrived from the daemon.
    Message(Vec<u8>),
    /// The HELLO period elapsed.
    Tick,
    /// The daemon closed the channel.
    Closed,
}

/// Run the routing service against the daemon at `path`. Blocks until the
/// daemon goes away (clean return) or the channel errs.
pub fn run(path: &Path, address: u8) -> io::Result<()> {
    let mut channel = Channel::connect(path, constants::ENTITY_ROUTING)?;
    log::info!("routing service for host {} connected to {}", address, path.display());

    let (tx, rx) = mpsc::channel();

    let mut reader = channel.try_clone()?;
    let reader_tx = tx.clone();
    thread::Builder::new()
        .name("router-reader".into())
        .spawn(move || loop {
            match reader.recv() {
                Ok(message) => {
                    if reader_tx.send(ServiceEvent::Message(message)).is_err() {
                        return;
                    }
                }
                Err(_) => {
                    let _ = reader_tx.send(ServiceEvent::Closed);
                    return;
                }
            }
        })?;

    thread::Builder::new()
        .name("router-timer".into())
        .spawn(move || loop {
            thread::sleep(Duration::from_secs(constants::HELLO_INTERVAL_SECS));
            if tx.send(ServiceEvent::Tick).is_err() {
                return;
            }
        })?;

    let mut engine = RouterEngine::new(address);
    write_actions(&mut channel, engine.start())?;

    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };
        match event {
            ServiceEvent::Tick => {
                write_actions(&mut channel, engine.handle_tick())?;
            }
            ServiceEvent::Message(raw) => {
                let envelope = match AppSdu::deserialize(&raw) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        log::warn!("discarding bad envelope from daemon: {}", e);
                        continue;
                    }
                };
                match RoutingSdu::decode(&envelope.payload) {
                    Ok(sdu) => write_actions(&mut channel, engine.handle_message(sdu))?,
                    Err(e) => log::warn!("discarding bad routing message: {}", e),
                }
            }
            ServiceEvent::Closed => {
                log::info!("daemon channel closed, routing service exiting");
                break;
            }
        }
    }

    engine.shutdown();
    Ok(())
}

fn write_actions(channel: &mut Channel, actions: Vec<RouterAction>) -> io::Result<()> {
    for action in actions {
        let envelope = AppSdu::new(action.target, 0, action.sdu.encode());
        channel.send(&envelope.serialize())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mip-router-test-{}-{}", std::process::id(), name))
    }

    /// Read framed envelopes from the daemon side until `want` have arrived.
    fn read_envelopes(
        stream: &mut std::os::unix::net::UnixStream,
        decoder: &mut framing::Decoder,
        want: usize,
    ) -> Vec<AppSdu> {
        let mut envelopes = Vec::new();
        let mut buf = [0u8; 512];
        while envelopes.len() < want {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0, "service hung up early");
            for message in decoder.feed(&buf[..n]) {
                envelopes.push(AppSdu::deserialize(&message).unwrap());
            }
        }
        envelopes
    }

    #[test]
    fn service_hellos_and_answers_lookups() {
        let path = socket_path("lookup");
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();

        let service_path = path.clone();
        let service = thread::spawn(move || run(&service_path, 10));

        let (mut daemon, _) = listener.accept().unwrap();
        daemon
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        let mut entity = [0u8; 1];
        daemon.read_exact(&mut entity).unwrap();
        assert_eq!(entity[0], constants::ENTITY_ROUTING);

        let mut decoder = framing::Decoder::new();

        // the service leads with a broadcast HELLO
        let hello = &read_envelopes(&mut daemon, &mut decoder, 1)[0];
        assert_eq!(hello.dest, constants::BROADCAST_ADDR);
        assert_eq!(
            RoutingSdu::decode(&hello.payload).unwrap(),
            RoutingSdu::Hello { origin: 10 }
        );

        // a lookup for an unknown destination answers unreachable
        let request = AppSdu::new(10, 0, RoutingSdu::Request { dest: 99 }.encode());
        daemon
            .write_all(&framing::frame(&request.serialize()))
            .unwrap();

        let response = loop {
            let envelope = read_envelopes(&mut daemon, &mut decoder, 1).remove(0);
            match RoutingSdu::decode(&envelope.payload).unwrap() {
                // periodic HELLOs may interleave
                RoutingSdu::Hello { .. } => continue,
                other => break other,
            }
        };
        assert_eq!(
            response,
            RoutingSdu::Response {
                dest: 99,
                next_hop: constants::BROADCAST_ADDR,
                hops: constants::UNREACHABLE,
            }
        );

        // closing the daemon side ends the service; a periodic HELLO may
        // race the close and turn the clean exit into a write error
        drop(daemon);
        drop(listener);
        let _ = service.join().unwrap();

        let _ = std::fs::remove_file(&path);
    }
}
