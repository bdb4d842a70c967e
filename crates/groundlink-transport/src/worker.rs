use std::thread;
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{bounded, select, Receiver, SendTimeoutError, Sender};
use tracing::{debug, info, trace, warn};

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::status::StatusSink;
use crate::traits::{Connectivity, Medium, MessageReader, PacketSink};

/// Channel endpoints of one running transport.
///
/// Every channel is a rendezvous channel. `events` must be drained by a single
/// observer; the connect loop waits for each notification to be taken.
#[derive(Debug)]
pub struct TransportHandle {
    name: String,
    mtu: usize,
    events: Receiver<Connectivity>,
    outbound: Sender<Vec<Bytes>>,
    inbound: Receiver<Bytes>,
}

impl TransportHandle {
    /// Assemble a handle from raw endpoints, for transports driven elsewhere.
    pub fn new(
        name: impl Into<String>,
        mtu: usize,
        events: Receiver<Connectivity>,
        outbound: Sender<Vec<Bytes>>,
        inbound: Receiver<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mtu,
            events,
            outbound,
            inbound,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mtu(&self) -> usize {
        self.mtu
    }

    /// Connectivity changes, in order.
    pub fn events(&self) -> &Receiver<Connectivity> {
        &self.events
    }

    /// Packets to write, in order. Dropped while disconnected.
    pub fn outbound(&self) -> &Sender<Vec<Bytes>> {
        &self.outbound
    }

    /// Messages read from the link, each holding whole frames.
    pub fn inbound(&self) -> &Receiver<Bytes> {
        &self.inbound
    }
}

/// Start the connect loop and writer workers for `medium`.
///
/// The connect loop opens the medium, retrying at a fixed interval, and reads
/// the session inline once connected. Each connection's write half is handed
/// to the writer worker and revoked when the session ends.
pub fn spawn_transport<M: Medium>(
    medium: M,
    config: TransportConfig,
    status: StatusSink,
) -> Result<TransportHandle> {
    let name = medium.name().to_string();
    let mtu = medium.mtu();

    let (events_tx, events_rx) = bounded(0);
    let (outbound_tx, outbound_rx) = bounded(0);
    let (inbound_tx, inbound_rx) = bounded(0);
    let (writers_tx, writers_rx) = bounded::<Option<M::Writer>>(0);
    // Latches the first write failure of a session for the connect loop.
    let (faults_tx, faults_rx) = bounded(1);

    let writer_name = name.clone();
    thread::Builder::new()
        .name(format!("{name}-writer"))
        .spawn(move || run_writer(writer_name, writers_rx, outbound_rx, faults_tx))?;

    let session = Session {
        events: events_tx,
        inbound: inbound_tx,
        faults: faults_rx,
        status,
    };
    thread::Builder::new()
        .name(format!("{name}-connect"))
        .spawn(move || run_connect_loop(medium, config, writers_tx, session))?;

    debug!(transport = %name, mtu, "transport started");
    Ok(TransportHandle::new(name, mtu, events_rx, outbound_tx, inbound_rx))
}

struct Session {
    events: Sender<Connectivity>,
    inbound: Sender<Bytes>,
    faults: Receiver<TransportError>,
    status: StatusSink,
}

fn run_connect_loop<M: Medium>(
    mut medium: M,
    config: TransportConfig,
    writers: Sender<Option<M::Writer>>,
    session: Session,
) {
    let name = medium.name().to_string();
    let mut attempt = 0u64;

    loop {
        attempt += 1;
        match medium.open() {
            Ok((reader, writer)) => {
                // Faults from the previous connection are stale.
                while session.faults.try_recv().is_ok() {}
                if writers.send(Some(writer)).is_err() {
                    return;
                }

                info!(transport = %name, attempt, "connected");
                session.status.report(format!("{name} connected"));
                if session.events.send(Connectivity::Connected).is_err() {
                    return;
                }
                attempt = 0;

                let err = read_session(&name, reader, &session, config.handoff_timeout);

                let _ = writers.send(None);
                warn!(transport = %name, %err, "disconnected");
                session.status.error(&format!("{name} disconnected"), &err);
                if session.events.send(Connectivity::Disconnected).is_err() {
                    return;
                }
            }
            Err(err) => {
                debug!(transport = %name, attempt, %err, "open failed");
            }
        }
        thread::sleep(config.retry_interval);
    }
}

/// Forward inbound messages until the connection fails.
fn read_session<R: MessageReader>(
    name: &str,
    mut reader: R,
    session: &Session,
    handoff: Duration,
) -> TransportError {
    loop {
        if let Ok(err) = session.faults.try_recv() {
            return err;
        }
        match reader.read_message() {
            Ok(Some(message)) => match session.inbound.send_timeout(message, handoff) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(message))
                | Err(SendTimeoutError::Disconnected(message)) => {
                    trace!(transport = %name, len = message.len(), "inbound dropped, link not routed");
                }
            },
            Ok(None) => {}
            Err(err) => return err,
        }
    }
}

fn run_writer<W: PacketSink>(
    name: String,
    writers: Receiver<Option<W>>,
    outbound: Receiver<Vec<Bytes>>,
    faults: Sender<TransportError>,
) {
    let mut writer: Option<W> = None;

    loop {
        select! {
            recv(writers) -> next => match next {
                Ok(next) => writer = next,
                Err(_) => return,
            },
            recv(outbound) -> packets => {
                let Ok(packets) = packets else { return };
                match writer.as_mut() {
                    Some(sink) => {
                        if let Err(err) = write_all(sink, &packets) {
                            warn!(transport = %name, %err, "write failed");
                            writer = None;
                            let _ = faults.try_send(err);
                        }
                    }
                    None => {
                        debug!(transport = %name, count = packets.len(), "not connected, packets dropped");
                    }
                }
            }
        }
    }
}

fn write_all<W: PacketSink>(sink: &mut W, packets: &[Bytes]) -> Result<()> {
    for packet in packets {
        sink.write_packet(packet)?;
    }
    Ok(())
}
