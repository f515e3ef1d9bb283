//! MipNode: daemon lifecycle.
//!
//! Wires together the raw link socket, the local channel server and the
//! driver thread.

use std::io;
use std::thread::{self, JoinHandle};

use mip_core::engine::{EngineConfig, MipEngine};

use crate::config::DaemonConfig;
use crate::driver::Driver;
use crate::event::{self, Event, EventSender};
use crate::interface::{ethernet, local};

/// A running MIP daemon.
pub struct MipNode {
    tx: EventSender,
    driver_handle: Option<JoinHandle<io::Result<()>>>,
}

impl MipNode {
    /// Validate the configuration, open the link, bind the channel socket
    /// and start the dispatch thread.
    pub fn start(config: DaemonConfig) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let interfaces = ethernet::local_interfaces()?;
        if interfaces.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no usable link-layer interfaces",
            ));
        }
        for iface in &interfaces {
            log::debug!(
                "using interface {} ({:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x})",
                iface.id.0,
                iface.link[0],
                iface.link[1],
                iface.link[2],
                iface.link[3],
                iface.link[4],
                iface.link[5],
            );
        }

        let link = ethernet::EthernetLink::open()?;
        let writer = link.writer()?;

        let (tx, rx) = event::channel();
        link.spawn_reader(tx.clone())?;
        local::start_server(&config.channel_path, tx.clone())?;

        let engine = MipEngine::new(EngineConfig {
            address: config.address,
            interfaces,
        });

        log::info!(
            "mipd up as host {} on {}",
            config.address,
            config.channel_path.display()
        );

        let driver_handle = thread::Builder::new().name("mip-driver".into()).spawn(
            move || -> io::Result<()> {
                let mut driver = Driver::new(engine, writer, rx);
                driver.run()
            },
        )?;

        Ok(MipNode {
            tx,
            driver_handle: Some(driver_handle),
        })
    }

    /// Whether the driver thread is still running.
    pub fn is_alive(&self) -> bool {
        self.driver_handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Ask the driver to stop and wait for it.
    pub fn shutdown(mut self) -> io::Result<()> {
        let _ = self.tx.send(Event::Shutdown);
        self.join()
    }

    /// Block until the driver exits (clean shutdown or fatal link failure).
    pub fn wait(mut self) -> io::Result<()> {
        self.join()
    }

    fn join(&mut self) -> io::Result<()> {
        match self.driver_handle.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "driver panicked"))),
            None => Ok(()),
        }
    }
}
