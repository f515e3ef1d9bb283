//! mipd - the MIP daemon.
//!
//! Performs resolution, routing-table lookups and link transmission on
//! behalf of local applications connected to the channel socket.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use mip_cli::args::Args;
use mip_cli::init_logging;
use mip_net::{DaemonConfig, MipNode};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args = Args::parse();

    if args.has("version") {
        println!("mipd {}", VERSION);
        return;
    }
    if args.has("h") || args.has("help") || args.positional.len() != 2 {
        print_usage();
        return;
    }

    let channel_path = PathBuf::from(&args.positional[0]);
    let address: u8 = match args.positional[1].parse() {
        Ok(address) => address,
        Err(_) => {
            print_usage();
            return;
        }
    };

    init_logging(args.debug);

    let config = DaemonConfig {
        address,
        channel_path,
        debug: args.debug > 0,
    };
    if let Err(e) = config.validate() {
        // operator error, reported before anything is opened
        println!("{}", e);
        return;
    }

    log::info!("starting mipd {}", VERSION);

    let node = match MipNode::start(config) {
        Ok(node) => node,
        Err(e) => {
            log::error!("failed to start: {}", e);
            std::process::exit(1);
        }
    };

    // Handle SIGINT/SIGTERM
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    unsafe {
        libc::signal(libc::SIGINT, signal_handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, signal_handler as *const () as libc::sighandler_t);
    }
    STOP_TX.lock().unwrap().replace(stop_tx);

    // Block until a signal arrives or the driver dies on its own
    let mut by_signal = true;
    loop {
        match stop_rx.recv_timeout(Duration::from_secs(1)) {
            Ok(()) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !node.is_alive() {
                    by_signal = false;
                    break;
                }
            }
            Err(_) => break,
        }
    }

    let result = if by_signal {
        log::info!("shutting down...");
        node.shutdown()
    } else {
        node.wait()
    };

    match result {
        Ok(()) => log::info!("mipd stopped"),
        Err(e) => {
            log::error!("daemon failed: {}", e);
            std::process::exit(1);
        }
    }
}

static STOP_TX: std::sync::Mutex<Option<mpsc::Sender<()>>> = std::sync::Mutex::new(None);

extern "C" fn signal_handler(_sig: libc::c_int) {
    if let Ok(guard) = STOP_TX.lock() {
        if let Some(ref tx) = *guard {
            let _ = tx.send(());
        }
    }
}

fn print_usage() {
    println!("usage: mipd [-h] [-d] <channel_path> <address>");
    println!();
    println!("  <channel_path>  Unix socket for local applications");
    println!("  <address>       this host's MIP address (0-254)");
    println!("  -d              verbose protocol tracing (repeat for more)");
    println!("  -h              print this help");
}
