//! `btleplug` backend for the UART profile.
//!
//! btleplug is async; the rest of the system is threads and channels. A small
//! private runtime drives the adapter, forwards notifications into a channel,
//! and executes writes for the blocking writer worker.

use std::time::Duration;

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use futures_util::StreamExt;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::PacketSink;
use crate::wireless::{
    UartPeripheral, UART_LOCAL_NAME, UART_RX_CHARACTERISTIC, UART_SERVICE, UART_TX_CHARACTERISTIC,
};

const NOTIFICATION_BACKLOG: usize = 16;
const LIVENESS_POLL: Duration = Duration::from_millis(500);
const SCAN_WINDOW: Duration = Duration::from_secs(2);

/// Scans for and connects to the vehicle's UART peripheral.
pub struct BleUart {
    runtime: Runtime,
    write_timeout: Duration,
    current: Option<Peripheral>,
}

impl BleUart {
    pub fn new(write_timeout: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("groundlink-ble")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            write_timeout,
            current: None,
        })
    }
}

impl UartPeripheral for BleUart {
    type Writer = BleWriter;

    fn connect(&mut self) -> Result<(Receiver<Bytes>, BleWriter)> {
        if let Some(stale) = self.current.take() {
            let _ = self.runtime.block_on(stale.disconnect());
        }

        let (peripheral, rx_char, notifications) = self.runtime.block_on(async move {
            let adapter = first_adapter().await?;
            let peripheral = find_uart(&adapter, SCAN_WINDOW).await?;
            peripheral.connect().await.map_err(ble_error)?;
            peripheral.discover_services().await.map_err(ble_error)?;

            let characteristics = peripheral.characteristics();
            let rx_char = characteristics
                .iter()
                .find(|c| c.uuid == UART_RX_CHARACTERISTIC)
                .cloned()
                .ok_or_else(|| missing("write characteristic"))?;
            let tx_char = characteristics
                .iter()
                .find(|c| c.uuid == UART_TX_CHARACTERISTIC)
                .cloned()
                .ok_or_else(|| missing("notify characteristic"))?;

            peripheral.subscribe(&tx_char).await.map_err(ble_error)?;
            let (tx, rx) = bounded(NOTIFICATION_BACKLOG);
            tokio::spawn(forward_notifications(peripheral.clone(), tx));
            Ok::<_, TransportError>((peripheral, rx_char, rx))
        })?;

        info!(id = %peripheral.id(), "connected to UART peripheral");
        self.current = Some(peripheral.clone());

        Ok((
            notifications,
            BleWriter {
                runtime: self.runtime.handle().clone(),
                peripheral,
                characteristic: rx_char,
                write_timeout: self.write_timeout,
            },
        ))
    }
}

/// Write half of a BLE connection.
pub struct BleWriter {
    runtime: Handle,
    peripheral: Peripheral,
    characteristic: Characteristic,
    write_timeout: Duration,
}

impl PacketSink for BleWriter {
    fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        let write = self
            .peripheral
            .write(&self.characteristic, packet, WriteType::WithoutResponse);
        match self
            .runtime
            .block_on(tokio::time::timeout(self.write_timeout, write))
        {
            Ok(result) => result.map_err(ble_error),
            Err(_) => Err(TransportError::Timeout(self.write_timeout)),
        }
    }
}

async fn first_adapter() -> Result<Adapter> {
    let manager = Manager::new().await.map_err(ble_error)?;
    manager
        .adapters()
        .await
        .map_err(ble_error)?
        .into_iter()
        .next()
        .ok_or_else(|| missing("bluetooth adapter"))
}

async fn find_uart(adapter: &Adapter, scan_window: Duration) -> Result<Peripheral> {
    adapter
        .start_scan(ScanFilter {
            services: vec![UART_SERVICE],
        })
        .await
        .map_err(ble_error)?;
    tokio::time::sleep(scan_window).await;
    let peripherals = adapter.peripherals().await.map_err(ble_error)?;
    let _ = adapter.stop_scan().await;

    for peripheral in peripherals {
        let Ok(Some(properties)) = peripheral.properties().await else {
            continue;
        };
        if properties.local_name.as_deref() == Some(UART_LOCAL_NAME) {
            return Ok(peripheral);
        }
    }
    Err(missing("peripheral advertising UART"))
}

/// Forward notifications until the stream ends, the peripheral disconnects, or
/// the reader goes away. Dropping `tx` signals the disconnect.
async fn forward_notifications(peripheral: Peripheral, tx: Sender<Bytes>) {
    let mut stream = match peripheral.notifications().await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%err, "notification stream unavailable");
            return;
        }
    };
    let mut liveness = tokio::time::interval(LIVENESS_POLL);

    loop {
        tokio::select! {
            notification = stream.next() => {
                let Some(notification) = notification else { break };
                if notification.uuid != UART_TX_CHARACTERISTIC {
                    continue;
                }
                match tx.try_send(Bytes::from(notification.value)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => debug!("notification backlog full, dropped"),
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            _ = liveness.tick() => {
                if !peripheral.is_connected().await.unwrap_or(false) {
                    break;
                }
            }
        }
    }
    debug!("notification forwarding stopped");
}

fn ble_error(err: btleplug::Error) -> TransportError {
    TransportError::Peripheral(err.to_string())
}

fn missing(what: &str) -> TransportError {
    TransportError::Open {
        medium: "ble".to_string(),
        reason: format!("no {what} found"),
    }
}
