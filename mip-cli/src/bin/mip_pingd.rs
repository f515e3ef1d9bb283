//! mip-pingd - ping responder.
//!
//! Answers every PING message delivered by the local daemon with a PONG to
//! the originating host.

use std::path::Path;

use mip_cli::args::Args;
use mip_cli::{init_logging, PING_PREFIX, PONG_PREFIX};
use mip_core::constants;
use mip_core::sdu::AppSdu;
use mip_net::Channel;

fn main() {
    let args = Args::parse();

    if args.has("h") || args.has("help") || args.positional.len() != 1 {
        print_usage();
        return;
    }
    let channel_path = Path::new(&args.positional[0]);

    init_logging(args.debug);

    let mut channel = match Channel::connect(channel_path, constants::ENTITY_PING) {
        Ok(channel) => channel,
        Err(_) => {
            eprintln!(" >>> <server>: did you remember to start the daemon?");
            std::process::exit(1);
        }
    };

    loop {
        let raw = match channel.recv() {
            Ok(raw) => raw,
            Err(_) => {
                log::info!("daemon channel closed, exiting");
                return;
            }
        };
        let sdu = match AppSdu::deserialize(&raw) {
            Ok(sdu) => sdu,
            Err(e) => {
                log::warn!("<server>: discarding bad message: {}", e);
                continue;
            }
        };

        if !sdu.payload.starts_with(PING_PREFIX) {
            log::debug!("<server>: ignoring non-ping message from {}", sdu.dest);
            continue;
        }
        println!("<server>: {}", String::from_utf8_lossy(&sdu.payload));

        let mut reply = PONG_PREFIX.to_vec();
        reply.extend_from_slice(&sdu.payload[PING_PREFIX.len()..]);

        // the delivered envelope names the originator; answer it there
        let response = AppSdu::new(sdu.dest, 0, reply);
        if let Err(e) = channel.send(&response.serialize()) {
            eprintln!("<server>: send failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("usage: mip-pingd [-h] [-d] <channel_path>");
}
