//! miprouted - the distance-vector routing service.
//!
//! Connects to a running mipd as a ROUTING-CONTROL client and answers its
//! lookup requests while exchanging HELLO/UPDATE messages with neighboring
//! hosts.

use std::io;
use std::path::Path;

use mip_cli::args::Args;
use mip_cli::init_logging;
use mip_core::constants;
use mip_net::router_service;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args = Args::parse();

    if args.has("version") {
        println!("miprouted {}", VERSION);
        return;
    }
    if args.has("h") || args.has("help") || args.positional.len() != 2 {
        print_usage();
        return;
    }

    let channel_path = Path::new(&args.positional[0]);
    let address: u8 = match args.positional[1].parse() {
        Ok(address) => address,
        Err(_) => {
            print_usage();
            return;
        }
    };
    if address == constants::BROADCAST_ADDR {
        println!(
            "address must be in range {{{}...{}}} ({})",
            constants::MIN_ADDR,
            constants::BROADCAST_ADDR - 1,
            address
        );
        return;
    }

    init_logging(args.debug);
    log::info!("starting miprouted {}", VERSION);

    match router_service::run(channel_path, address) {
        Ok(()) => log::info!("miprouted stopped"),
        Err(e) => {
            if e.kind() == io::ErrorKind::ConnectionRefused || e.kind() == io::ErrorKind::NotFound {
                eprintln!(" >>> <routing>: did you remember to start the daemon?");
            } else {
                log::error!("routing service failed: {}", e);
            }
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("usage: miprouted [-h] [-d] <channel_path> <address>");
    println!();
    println!("  <channel_path>  Unix socket of the local mipd");
    println!("  <address>       this host's MIP address (0-254)");
    println!("  -d              verbose protocol tracing (repeat for more)");
    println!("  -h              print this help");
}
