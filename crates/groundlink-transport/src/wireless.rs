//! Packet-oriented wireless link over a UART-like GATT profile.
//!
//! The vehicle exposes one service with a write characteristic (ground to
//! vehicle) and a notify characteristic (vehicle to ground). Every
//! notification holds whole frames; nothing is reassembled across
//! notifications.

use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use uuid::Uuid;

use crate::error::{Result, TransportError};
use crate::traits::{Medium, MessageReader, PacketSink};

pub const UART_SERVICE: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);
/// Written by the ground station.
pub const UART_RX_CHARACTERISTIC: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);
/// Notified by the vehicle.
pub const UART_TX_CHARACTERISTIC: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Advertised local name of the vehicle.
pub const UART_LOCAL_NAME: &str = "UART";

/// Largest write or notification the profile carries.
pub const UART_MTU: usize = 20;

/// A peripheral speaking the UART profile.
///
/// `connect` subscribes to notifications and returns them as a channel. The
/// backend drops the sending side when the connection is lost.
pub trait UartPeripheral: Send + 'static {
    type Writer: PacketSink;

    fn connect(&mut self) -> Result<(Receiver<Bytes>, Self::Writer)>;
}

/// Read half of a wireless connection.
pub struct NotificationReader {
    notifications: Receiver<Bytes>,
    idle: Duration,
}

impl NotificationReader {
    pub fn new(notifications: Receiver<Bytes>, idle: Duration) -> Self {
        Self {
            notifications,
            idle,
        }
    }
}

impl MessageReader for NotificationReader {
    fn read_message(&mut self) -> Result<Option<Bytes>> {
        match self.notifications.recv_timeout(self.idle) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }
}

/// Wireless link backed by any [`UartPeripheral`].
pub struct WirelessMedium<P> {
    name: String,
    peripheral: P,
    idle: Duration,
}

impl<P: UartPeripheral> WirelessMedium<P> {
    pub fn new(name: impl Into<String>, peripheral: P) -> Self {
        Self {
            name: name.into(),
            peripheral,
            idle: Duration::from_millis(100),
        }
    }

    /// How long one read waits for a notification before reporting idle.
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }
}

impl<P: UartPeripheral> Medium for WirelessMedium<P> {
    type Reader = NotificationReader;
    type Writer = P::Writer;

    fn name(&self) -> &str {
        &self.name
    }

    fn mtu(&self) -> usize {
        UART_MTU
    }

    fn open(&mut self) -> Result<(Self::Reader, Self::Writer)> {
        let (notifications, writer) = self.peripheral.connect()?;
        Ok((NotificationReader::new(notifications, self.idle), writer))
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::{unbounded, Sender};

    use super::*;

    struct Recorder(Sender<Vec<u8>>);

    impl PacketSink for Recorder {
        fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
            self.0.send(packet.to_vec()).map_err(|_| TransportError::Closed)
        }
    }

    struct FakePeripheral {
        notify: Option<Receiver<Bytes>>,
        written: Sender<Vec<u8>>,
    }

    impl UartPeripheral for FakePeripheral {
        type Writer = Recorder;

        fn connect(&mut self) -> Result<(Receiver<Bytes>, Recorder)> {
            let notify = self.notify.take().ok_or_else(|| TransportError::Open {
                medium: "fake".to_string(),
                reason: "not advertising".to_string(),
            })?;
            Ok((notify, Recorder(self.written.clone())))
        }
    }

    #[test]
    fn uart_profile_identifiers() {
        assert_eq!(
            UART_SERVICE.to_string(),
            "6e400001-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            UART_RX_CHARACTERISTIC.to_string(),
            "6e400002-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            UART_TX_CHARACTERISTIC.to_string(),
            "6e400003-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }

    #[test]
    fn notifications_become_messages() {
        let (notify_tx, notify_rx) = unbounded();
        let (written_tx, written_rx) = unbounded();
        let mut medium = WirelessMedium::new(
            "ble",
            FakePeripheral {
                notify: Some(notify_rx),
                written: written_tx,
            },
        )
        .with_idle(Duration::from_millis(10));
        assert_eq!(medium.mtu(), UART_MTU);

        let (mut reader, mut writer) = medium.open().unwrap();

        assert!(reader.read_message().unwrap().is_none());
        notify_tx.send(Bytes::from_static(&[1, 0x08])).unwrap();
        assert_eq!(reader.read_message().unwrap().unwrap().as_ref(), &[1, 0x08]);

        writer.write_packet(&[2, 0x08, 0x01]).unwrap();
        assert_eq!(written_rx.try_recv().unwrap(), vec![2, 0x08, 0x01]);

        drop(notify_tx);
        assert!(matches!(reader.read_message(), Err(TransportError::Closed)));
        assert!(medium.open().is_err());
    }
}
