use std::fmt;
use std::io::{Read, Write};

use bytes::Bytes;
use groundlink_frame::{PacketWriter, StreamReader};

use crate::error::Result;

/// Whether a transport currently has a working connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Disconnected,
    Connected,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Disconnected => f.write_str("disconnected"),
            Connectivity::Connected => f.write_str("connected"),
        }
    }
}

/// Read half of one connection.
pub trait MessageReader: Send + 'static {
    /// Block for the next inbound message of one or more whole frames.
    ///
    /// `Ok(None)` means nothing arrived within the medium's idle window. Any
    /// error ends the connection.
    fn read_message(&mut self) -> Result<Option<Bytes>>;
}

/// Write half of one connection.
pub trait PacketSink: Send + 'static {
    /// Write one packet verbatim. Any error ends the connection.
    fn write_packet(&mut self, packet: &[u8]) -> Result<()>;
}

/// A physical link that can be opened repeatedly.
pub trait Medium: Send + 'static {
    type Reader: MessageReader;
    type Writer: PacketSink;

    /// Name used in status lines and logs.
    fn name(&self) -> &str;

    /// Largest packet the link carries in one transmission.
    fn mtu(&self) -> usize;

    /// Establish a new connection.
    fn open(&mut self) -> Result<(Self::Reader, Self::Writer)>;
}

impl<T: Read + Send + 'static> MessageReader for StreamReader<T> {
    fn read_message(&mut self) -> Result<Option<Bytes>> {
        Ok(StreamReader::read_message(self)?)
    }
}

impl<T: Write + Send + 'static> PacketSink for PacketWriter<T> {
    fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        Ok(PacketWriter::write_packet(self, packet)?)
    }
}
