//! Driver loop: receives events, drives the MipEngine, dispatches actions.

use std::io;

use mip_core::engine::{EngineAction, MipEngine};

use crate::event::{ChannelId, ClientKind, Event, EventReceiver};
use crate::interface::{ChannelWriter, LinkWriter};

/// The driver loop. Owns the engine, the link writer and the connected
/// channel clients. All protocol state is mutated from this single thread.
pub struct Driver {
    pub(crate) engine: MipEngine,
    pub(crate) link: Box<dyn LinkWriter>,
    pub(crate) app: Option<(ChannelId, Box<dyn ChannelWriter>)>,
    pub(crate) routing: Option<(ChannelId, Box<dyn ChannelWriter>)>,
    pub(crate) rx: EventReceiver,
}

impl Driver {
    pub fn new(engine: MipEngine, link: Box<dyn LinkWriter>, rx: EventReceiver) -> Self {
        Driver {
            engine,
            link,
            app: None,
            routing: None,
            rx,
        }
    }

    /// Run the dispatch loop. Returns when shut down or every event sender
    /// is gone; errs on an unrecoverable link failure.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let event = match self.rx.recv() {
                Ok(event) => event,
                Err(_) => return Ok(()), // all senders dropped
            };

            match event {
                Event::LinkFrame { interface, data } => {
                    let actions = self.engine.handle_link_frame(interface, &data);
                    self.dispatch_all(actions)?;
                }
                Event::ClientUp { id, kind, writer } => {
                    let slot = match kind {
                        ClientKind::Ping => &mut self.app,
                        ClientKind::Routing => &mut self.routing,
                    };
                    if let Some((old, _)) = slot {
                        log::info!("client {} replaces {} as {:?}", id.0, old.0, kind);
                    } else {
                        log::info!("client {} connected as {:?}", id.0, kind);
                    }
                    *slot = Some((id, writer));
                }
                Event::ClientData { id, data } => {
                    let actions = match (&self.app, &self.routing) {
                        (Some((app_id, _)), _) if *app_id == id => {
                            self.engine.handle_app_data(&data)
                        }
                        (_, Some((routing_id, _))) if *routing_id == id => {
                            self.engine.handle_routing_data(&data)
                        }
                        _ => {
                            log::debug!("data from unregistered client {}", id.0);
                            Vec::new()
                        }
                    };
                    self.dispatch_all(actions)?;
                }
                Event::ClientDown { id } => {
                    // a single peer's disconnect is recoverable; just
                    // deregister it
                    if matches!(&self.app, Some((app_id, _)) if *app_id == id) {
                        log::info!("application client {} disconnected", id.0);
                        self.app = None;
                    } else if matches!(&self.routing, Some((routing_id, _)) if *routing_id == id) {
                        log::info!("routing client {} disconnected", id.0);
                        self.routing = None;
                    }
                }
                Event::LinkDown(error) => {
                    log::error!("link socket failed: {}", error);
                    return Err(io::Error::new(io::ErrorKind::Other, error));
                }
                Event::Shutdown => return Ok(()),
            }
        }
    }

    fn dispatch_all(&mut self, actions: Vec<EngineAction>) -> io::Result<()> {
        for action in actions {
            match action {
                EngineAction::SendFrame { interface, dst, frame } => {
                    // the raw socket failing means no further protocol
                    // operation is possible
                    self.link.send_frame(interface, &dst, &frame)?;
                }
                EngineAction::DeliverApp { sdu } => match &mut self.app {
                    Some((id, writer)) => {
                        if let Err(e) = writer.send_msg(&sdu.serialize()) {
                            log::warn!("application client {} write failed: {}", id.0, e);
                            self.app = None;
                        }
                    }
                    None => log::debug!("no application client, dropping delivery"),
                },
                EngineAction::DeliverRouting { sdu } => match &mut self.routing {
                    Some((id, writer)) => {
                        if let Err(e) = writer.send_msg(&sdu.serialize()) {
                            log::warn!("routing client {} write failed: {}", id.0, e);
                            self.routing = None;
                        }
                    }
                    None => log::debug!("no routing client, dropping delivery"),
                },
            }
        }
        Ok(())
    }
}
