//! Physical link lifecycle.
//!
//! A transport owns one link to the vehicle (a serial device or the wireless
//! UART profile), keeps reopening it at a fixed interval, and exposes its
//! connectivity, inbound messages and outbound packets as channels. Which
//! transport carries traffic is decided one layer up.

pub mod config;
pub mod error;
pub mod memory;
pub mod serial;
pub mod status;
pub mod traits;
pub mod wireless;
pub mod worker;

#[cfg(feature = "ble")]
pub mod ble;

pub use config::{parse_duration, TransportConfig};
pub use error::{Result, TransportError};
pub use memory::{memory_link, MemoryMedium, MemoryPeer, MemoryRemote};
pub use serial::{SerialConfig, SerialMedium, SERIAL_MTU};
pub use status::{status_channel, StatusSink, STATUS_CAPACITY, STATUS_TARGET};
pub use traits::{Connectivity, Medium, MessageReader, PacketSink};
pub use wireless::{UartPeripheral, WirelessMedium, UART_MTU};
pub use worker::{spawn_transport, TransportHandle};

#[cfg(feature = "ble")]
pub use ble::BleUart;
