use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvError, Select, Sender};
use groundlink_transport::{Connectivity, StatusSink, TransportHandle};
use tracing::{debug, info};

/// Endpoints of the active transport, handed to the pump workers.
#[derive(Debug, Clone)]
pub struct Route {
    /// Position in the priority list.
    pub index: usize,
    pub name: String,
    pub mtu: usize,
    pub outbound: Sender<Vec<Bytes>>,
    pub inbound: Receiver<Bytes>,
}

/// The highest-priority connected transport.
pub fn select_active(states: &[Connectivity]) -> Option<usize> {
    states
        .iter()
        .position(|state| *state == Connectivity::Connected)
}

/// Keeps the pumps wired to the best connected transport.
///
/// Transports are in priority order, first is preferred. The router is the
/// only place the active transport is decided.
pub struct Router {
    transports: Vec<TransportHandle>,
    states: Vec<Connectivity>,
    closed: Vec<bool>,
    active: Option<usize>,
    controls: Vec<Sender<Option<Route>>>,
    status: StatusSink,
}

impl Router {
    pub fn new(
        transports: Vec<TransportHandle>,
        controls: Vec<Sender<Option<Route>>>,
        status: StatusSink,
    ) -> Self {
        let count = transports.len();
        Self {
            transports,
            states: vec![Connectivity::Disconnected; count],
            closed: vec![false; count],
            active: None,
            controls,
            status,
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Observe connectivity events until every transport has stopped.
    pub fn run(mut self) {
        loop {
            let Some((index, event)) = self.next_event() else {
                debug!("all transports stopped, router exiting");
                return;
            };
            match event {
                Ok(state) => self.observe(index, state),
                Err(_) => {
                    self.closed[index] = true;
                    self.observe(index, Connectivity::Disconnected);
                }
            }
        }
    }

    /// Block for the next event from any transport that has not stopped.
    fn next_event(&self) -> Option<(usize, Result<Connectivity, RecvError>)> {
        let mut select = Select::new();
        let mut ids = Vec::with_capacity(self.transports.len());
        for (index, transport) in self.transports.iter().enumerate() {
            if !self.closed[index] {
                select.recv(transport.events());
                ids.push(index);
            }
        }
        if ids.is_empty() {
            return None;
        }

        let operation = select.select();
        let index = ids[operation.index()];
        let event = operation.recv(self.transports[index].events());
        Some((index, event))
    }

    /// Record `state` for transport `index` and rewire the pumps if the
    /// active transport changed.
    pub fn observe(&mut self, index: usize, state: Connectivity) {
        let transport = &self.transports[index];
        debug!(transport = %transport.name(), %state, "connectivity changed");
        self.states[index] = state;

        let next = select_active(&self.states);
        if next == self.active {
            return;
        }
        self.active = next;

        let route = next.map(|index| self.route(index));
        for control in &self.controls {
            let _ = control.send(route.clone());
        }

        match &route {
            Some(route) => {
                info!(transport = %route.name, "active link changed");
                self.status.report(format!("active link: {}", route.name));
            }
            None => {
                info!("no active link");
                self.status.report("no active link");
            }
        }
    }

    fn route(&self, index: usize) -> Route {
        let transport = &self.transports[index];
        Route {
            index,
            name: transport.name().to_string(),
            mtu: transport.mtu(),
            outbound: transport.outbound().clone(),
            inbound: transport.inbound().clone(),
        }
    }
}
