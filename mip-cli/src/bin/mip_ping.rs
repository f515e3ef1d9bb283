//! mip-ping - one-shot ping client.
//!
//! Sends one message to a destination host through the local daemon and
//! waits for the response, reporting the round-trip time.

use std::path::Path;
use std::time::{Duration, Instant};

use mip_cli::args::Args;
use mip_cli::{init_logging, PING_PREFIX};
use mip_core::constants;
use mip_core::sdu::AppSdu;
use mip_net::Channel;

fn main() {
    let args = Args::parse();

    if args.has("h") || args.has("help") || args.positional.len() != 3 {
        print_usage();
        return;
    }

    let dest: u8 = match args.positional[0].parse() {
        Ok(dest) => dest,
        Err(_) => {
            print_usage();
            return;
        }
    };
    let message = &args.positional[1];
    let channel_path = Path::new(&args.positional[2]);

    init_logging(args.debug);

    let mut channel = match Channel::connect(channel_path, constants::ENTITY_PING) {
        Ok(channel) => channel,
        Err(_) => {
            eprintln!(" >>> <client>: did you remember to start the daemon?");
            std::process::exit(1);
        }
    };

    let mut payload = PING_PREFIX.to_vec();
    payload.extend_from_slice(message.as_bytes());

    // TTL 0 lets the daemon assign the maximum
    let envelope = AppSdu::new(dest, 0, payload);
    let start = Instant::now();
    if let Err(e) = channel.send(&envelope.serialize()) {
        eprintln!("<client>: send failed: {}", e);
        std::process::exit(1);
    }

    match channel.recv_timeout(Some(Duration::from_secs(1))) {
        Ok(Some(raw)) => {
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            match AppSdu::deserialize(&raw) {
                Ok(response) => {
                    println!("<client>: finished after {:.3} ms", elapsed_ms);
                    println!("<client>: {}", String::from_utf8_lossy(&response.payload));
                }
                Err(e) => {
                    eprintln!("<client>: bad response: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Ok(None) => {
            eprintln!("<client>: timeout, exiting...");
        }
        Err(e) => {
            eprintln!("<client>: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("usage: mip-ping [-h] [-d] <dest_host> <message> <channel_path>");
}
