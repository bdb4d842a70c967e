use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use groundlink_registry::{Registry, Update};
use groundlink_transport::{status_channel, StatusSink, TransportHandle};
use tracing::info;

use crate::error::{LinkError, Result};
use crate::pump::{run_inbound, run_outbound};
use crate::router::Router;

/// A running ground link: one router and two pump workers over a
/// priority-ordered set of transports.
pub struct GroundLink {
    registry: Arc<Registry>,
    links: Vec<String>,
    requests: Sender<Vec<Update>>,
    updates: Receiver<Update>,
    status: Receiver<String>,
}

impl GroundLink {
    /// Start routing over `transports`, first is preferred.
    pub fn start(registry: Arc<Registry>, transports: Vec<TransportHandle>) -> Result<Self> {
        let (sink, status) = status_channel();
        Self::start_with_status(registry, transports, sink, status)
    }

    /// Start with a status stream shared with the transports.
    pub fn start_with_status(
        registry: Arc<Registry>,
        transports: Vec<TransportHandle>,
        sink: StatusSink,
        status: Receiver<String>,
    ) -> Result<Self> {
        if transports.is_empty() {
            return Err(LinkError::NoTransports);
        }
        let links: Vec<String> = transports.iter().map(|t| t.name().to_string()).collect();

        let (requests_tx, requests_rx) = bounded(0);
        let (updates_tx, updates_rx) = bounded(0);
        let (outbound_control_tx, outbound_control_rx) = bounded(0);
        let (inbound_control_tx, inbound_control_rx) = bounded(0);

        let outbound_status = sink.clone();
        spawn("pump-outbound", move || {
            run_outbound(outbound_control_rx, requests_rx, outbound_status)
        })?;

        let inbound_status = sink.clone();
        let inbound_registry = Arc::clone(&registry);
        spawn("pump-inbound", move || {
            run_inbound(
                inbound_registry,
                inbound_control_rx,
                updates_tx,
                inbound_status,
            )
        })?;

        let router = Router::new(
            transports,
            vec![outbound_control_tx, inbound_control_tx],
            sink,
        );
        spawn("router", move || router.run())?;

        info!(links = ?links, "ground link started");
        Ok(Self {
            registry,
            links,
            requests: requests_tx,
            updates: updates_rx,
            status,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Transport names in priority order.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Batches of updates to send. Dropped when no link is active.
    pub fn requests(&self) -> &Sender<Vec<Update>> {
        &self.requests
    }

    /// Updates received from the vehicle.
    pub fn updates(&self) -> &Receiver<Update> {
        &self.updates
    }

    /// Status and diagnostic lines.
    pub fn status(&self) -> &Receiver<String> {
        &self.status
    }

    /// Send one batch.
    pub fn send(&self, batch: Vec<Update>) -> Result<()> {
        self.requests.send(batch).map_err(|_| LinkError::Shutdown)
    }

    pub fn into_parts(self) -> (Sender<Vec<Update>>, Receiver<Update>, Receiver<String>) {
        (self.requests, self.updates, self.status)
    }
}

fn spawn(worker: &'static str, body: impl FnOnce() + Send + 'static) -> Result<()> {
    thread::Builder::new()
        .name(worker.to_string())
        .spawn(body)
        .map(|_| ())
        .map_err(|source| LinkError::Spawn { worker, source })
}
