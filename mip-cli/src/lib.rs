//! Command-line tools for MIP: daemon, routing service and ping
//! applications.

pub mod args;

/// Ping message prefixes on the application channel.
pub const PING_PREFIX: &[u8] = b"PING:";
pub const PONG_PREFIX: &[u8] = b"PONG:";

/// Map `-d` repetition to a log level and initialize logging.
pub fn init_logging(debug: u8) {
    let level = match debug {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}
