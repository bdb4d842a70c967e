//! In-process loopback link.
//!
//! A [`MemoryMedium`] opens only while its [`MemoryRemote`] has offered a
//! connection. Each offer yields a [`MemoryPeer`] that plays the vehicle:
//! it sees every packet the host writes and can send messages back. Dropping
//! the peer breaks the connection.

use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{Result, TransportError};
use crate::traits::{Medium, MessageReader, PacketSink};

const PEER_BACKLOG: usize = 64;

struct Offer {
    inbound: Receiver<Bytes>,
    outbound: Sender<Bytes>,
}

/// Create a loopback medium and the handle controlling its far end.
pub fn memory_link(name: impl Into<String>, mtu: usize) -> (MemoryMedium, MemoryRemote) {
    let (offers_tx, offers_rx) = unbounded();
    (
        MemoryMedium {
            name: name.into(),
            mtu,
            idle: Duration::from_millis(20),
            offers: offers_rx,
        },
        MemoryRemote { offers: offers_tx },
    )
}

pub struct MemoryMedium {
    name: String,
    mtu: usize,
    idle: Duration,
    offers: Receiver<Offer>,
}

impl MemoryMedium {
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }
}

impl Medium for MemoryMedium {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn name(&self) -> &str {
        &self.name
    }

    fn mtu(&self) -> usize {
        self.mtu
    }

    fn open(&mut self) -> Result<(MemoryReader, MemoryWriter)> {
        let offer = self.offers.try_recv().map_err(|_| TransportError::Open {
            medium: self.name.clone(),
            reason: "no peer".to_string(),
        })?;
        Ok((
            MemoryReader {
                inbound: offer.inbound,
                idle: self.idle,
            },
            MemoryWriter {
                outbound: offer.outbound,
            },
        ))
    }
}

/// Far-end control of a [`MemoryMedium`].
#[derive(Clone)]
pub struct MemoryRemote {
    offers: Sender<Offer>,
}

impl MemoryRemote {
    /// Offer one connection. The medium picks it up on its next open attempt.
    pub fn connect(&self) -> MemoryPeer {
        let (to_host, inbound) = bounded(PEER_BACKLOG);
        let (outbound, from_host) = bounded(PEER_BACKLOG);
        let _ = self.offers.send(Offer { inbound, outbound });
        MemoryPeer { to_host, from_host }
    }
}

/// The vehicle side of one loopback connection.
pub struct MemoryPeer {
    to_host: Sender<Bytes>,
    from_host: Receiver<Bytes>,
}

impl MemoryPeer {
    /// Deliver one message (whole frames) to the host.
    pub fn send(&self, message: impl Into<Bytes>) -> Result<()> {
        self.to_host
            .send(message.into())
            .map_err(|_| TransportError::Closed)
    }

    /// Next packet written by the host.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Bytes> {
        self.from_host.recv_timeout(timeout).ok()
    }

    /// Packets written so far, without waiting.
    pub fn drain(&self) -> Vec<Bytes> {
        self.from_host.try_iter().collect()
    }

    /// Break the connection.
    pub fn disconnect(self) {}
}

pub struct MemoryReader {
    inbound: Receiver<Bytes>,
    idle: Duration,
}

impl MessageReader for MemoryReader {
    fn read_message(&mut self) -> Result<Option<Bytes>> {
        match self.inbound.recv_timeout(self.idle) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }
}

pub struct MemoryWriter {
    outbound: Sender<Bytes>,
}

impl PacketSink for MemoryWriter {
    fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.outbound
            .send(Bytes::copy_from_slice(packet))
            .map_err(|_| TransportError::Closed)
    }
}
