//! Workers moving updates between the application and the active route.
//!
//! Both workers hold at most one route and select on the router's control
//! channel at every point where they block, so a switch is picked up even
//! while an operation is pending.

use std::sync::Arc;

use bytes::Bytes;
use crossbeam_channel::{never, select, Receiver, Sender};
use groundlink_frame::{coalesce, decode_frames};
use groundlink_registry::{Registry, Update};
use groundlink_transport::StatusSink;
use tracing::{debug, trace};

use crate::router::Route;

enum Outbound {
    Reroute(Option<Route>),
    Batch(Vec<Update>),
    Stop,
}

/// Encode application batches and write them to the active route.
pub fn run_outbound(
    control: Receiver<Option<Route>>,
    requests: Receiver<Vec<Update>>,
    status: StatusSink,
) {
    let mut route: Option<Route> = None;

    loop {
        let next = select! {
            recv(control) -> msg => msg.map_or(Outbound::Stop, Outbound::Reroute),
            recv(requests) -> msg => msg.map_or(Outbound::Stop, Outbound::Batch),
        };

        let batch = match next {
            Outbound::Reroute(next) => {
                route = next;
                continue;
            }
            Outbound::Batch(batch) => batch,
            Outbound::Stop => return,
        };

        let Some(active) = route.as_ref() else {
            status.report(format!("no active link, {} update(s) dropped", batch.len()));
            continue;
        };

        let coalesced = coalesce(&batch, active.mtu);
        for err in &coalesced.errors {
            status.error("encode", err);
        }
        if coalesced.packets.is_empty() {
            continue;
        }

        let outbound = active.outbound.clone();
        let name = active.name.clone();
        let count = coalesced.packets.len();
        select! {
            send(outbound, coalesced.packets) -> sent => {
                if sent.is_err() {
                    debug!(transport = %name, "transport gone, packets dropped");
                } else {
                    trace!(transport = %name, packets = count, "packets handed to transport");
                }
            },
            recv(control) -> msg => match msg {
                Ok(next) => {
                    debug!(transport = %name, "route changed mid-send, batch dropped");
                    route = next;
                }
                Err(_) => return,
            },
        }
    }
}

/// Decode messages from the active route and publish them to the
/// application.
pub fn run_inbound(
    registry: Arc<Registry>,
    control: Receiver<Option<Route>>,
    updates: Sender<Update>,
    status: StatusSink,
) {
    let mut route: Option<Route> = None;

    loop {
        let inbound = route
            .as_ref()
            .map(|route| route.inbound.clone())
            .unwrap_or_else(never);

        let message: Bytes = select! {
            recv(control) -> msg => match msg {
                Ok(next) => {
                    route = next;
                    continue;
                }
                Err(_) => return,
            },
            recv(inbound) -> msg => match msg {
                Ok(message) => message,
                Err(_) => {
                    route = None;
                    continue;
                }
            },
        };

        for result in decode_frames(&message, &registry) {
            let update = match result {
                Ok(update) => update,
                Err(err) => {
                    status.error("decode", &err);
                    continue;
                }
            };

            // Keep listening for route changes while the application is busy.
            loop {
                select! {
                    send(updates, update.clone()) -> sent => {
                        if sent.is_err() {
                            return;
                        }
                        break;
                    },
                    recv(control) -> msg => match msg {
                        Ok(next) => route = next,
                        Err(_) => return,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use crossbeam_channel::bounded;
    use groundlink_frame::{encode_update, frame_payload, FrameError};
    use groundlink_registry::Value;
    use groundlink_transport::status_channel;

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    struct RouteEnds {
        route: Route,
        packets: Receiver<Vec<Bytes>>,
        messages: Sender<Bytes>,
    }

    fn route(name: &str, mtu: usize) -> RouteEnds {
        let (outbound, packets) = bounded(0);
        let (messages, inbound) = bounded(0);
        RouteEnds {
            route: Route {
                index: 0,
                name: name.to_string(),
                mtu,
                outbound,
                inbound,
            },
            packets,
            messages,
        }
    }

    fn float_updates(registry: &Registry, names: &[&str]) -> Vec<Update> {
        names
            .iter()
            .map(|name| registry.bind("desires", name, Some(Value::Float(0.5))).unwrap())
            .collect()
    }

    #[test]
    fn batches_dropped_without_route() {
        let registry = Registry::reference();
        let (control_tx, control_rx) = bounded(0);
        let (requests_tx, requests_rx) = bounded(0);
        let (status, status_rx) = status_channel();
        thread::spawn(move || run_outbound(control_rx, requests_rx, status));

        let started = Instant::now();
        for _ in 0..5 {
            requests_tx
                .send(float_updates(&registry, &["yaw", "roll"]))
                .unwrap();
        }
        assert!(started.elapsed() < WAIT);
        assert_eq!(
            status_rx.recv_timeout(WAIT).unwrap(),
            "no active link, 2 update(s) dropped"
        );
        drop(control_tx);
    }

    #[test]
    fn batches_coalesced_to_route_mtu() {
        let registry = Registry::reference();
        let (control_tx, control_rx) = bounded(0);
        let (requests_tx, requests_rx) = bounded(0);
        let (status, _status_rx) = status_channel();
        thread::spawn(move || run_outbound(control_rx, requests_rx, status));

        let ends = route("ble", 20);
        control_tx.send(Some(ends.route.clone())).unwrap();

        let batch = float_updates(&registry, &["yaw", "pitch", "roll"]);
        requests_tx.send(batch.clone()).unwrap();

        let packets = ends.packets.recv_timeout(WAIT).unwrap();
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.len() <= 20));
        let decoded: Vec<Update> = packets
            .iter()
            .flat_map(|p| decode_frames(p, &registry))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn reroute_while_transport_busy() {
        let registry = Registry::reference();
        let (control_tx, control_rx) = bounded(0);
        let (requests_tx, requests_rx) = bounded(0);
        let (status, _status_rx) = status_channel();
        thread::spawn(move || run_outbound(control_rx, requests_rx, status));

        // `stuck` never accepts its packets.
        let stuck = route("stuck", 256);
        let fresh = route("fresh", 256);
        control_tx.send(Some(stuck.route.clone())).unwrap();
        requests_tx
            .send(float_updates(&registry, &["force"]))
            .unwrap();

        control_tx.send(Some(fresh.route.clone())).unwrap();
        requests_tx
            .send(float_updates(&registry, &["altitude"]))
            .unwrap();

        let packets = fresh.packets.recv_timeout(WAIT).unwrap();
        let decoded = decode_frames(&packets[0], &registry);
        assert_eq!(decoded[0].as_ref().unwrap().name(), "altitude");
        assert!(stuck.packets.try_recv().is_err());
    }

    #[test]
    fn oversized_frames_reported_not_sent() {
        let registry = Registry::reference();
        let (control_tx, control_rx) = bounded(0);
        let (requests_tx, requests_rx) = bounded(0);
        let (status, status_rx) = status_channel();
        thread::spawn(move || run_outbound(control_rx, requests_rx, status));

        let tiny = route("tiny", 4);
        control_tx.send(Some(tiny.route.clone())).unwrap();
        requests_tx
            .send(float_updates(&registry, &["yaw"]))
            .unwrap();

        let line = status_rx.recv_timeout(WAIT).unwrap();
        assert!(line.starts_with("encode: frame of 8 bytes exceeds link MTU 4"));
        assert!(tiny.packets.try_recv().is_err());
    }

    #[test]
    fn inbound_frames_published_and_errors_reported() {
        let registry = Arc::new(Registry::reference());
        let (control_tx, control_rx) = bounded(0);
        let (updates_tx, updates_rx) = bounded(0);
        let (status, status_rx) = status_channel();
        {
            let registry = Arc::clone(&registry);
            thread::spawn(move || run_inbound(registry, control_rx, updates_tx, status));
        }

        let ends = route("serial", 256);
        control_tx.send(Some(ends.route.clone())).unwrap();

        let good = registry
            .bind("switches", "softKill", Some(Value::Bool(false)))
            .unwrap();
        let mut message = bytes::BytesMut::new();
        frame_payload(&[0x08, 0x80, 0x04], &mut message).unwrap();
        message.extend_from_slice(&encode_update(&good).unwrap());
        ends.messages.send(message.freeze()).unwrap();

        assert_eq!(updates_rx.recv_timeout(WAIT).unwrap(), good);
        let line = status_rx.recv_timeout(WAIT).unwrap();
        assert_eq!(
            line,
            format!("decode: {}", FrameError::UnknownTag(512))
        );
    }

    #[test]
    fn inbound_follows_route_changes() {
        let registry = Arc::new(Registry::reference());
        let (control_tx, control_rx) = bounded(0);
        let (updates_tx, updates_rx) = bounded(0);
        let (status, _status_rx) = status_channel();
        {
            let registry = Arc::clone(&registry);
            thread::spawn(move || run_inbound(registry, control_rx, updates_tx, status));
        }

        let old = route("old", 256);
        let new = route("new", 256);
        control_tx.send(Some(old.route.clone())).unwrap();
        control_tx.send(Some(new.route.clone())).unwrap();

        let update = registry.bind("led", "pattern", Some(Value::Int(3))).unwrap();
        let frame = encode_update(&update).unwrap();
        assert!(old
            .messages
            .send_timeout(frame.clone(), Duration::from_millis(50))
            .is_err());
        new.messages.send(frame).unwrap();
        assert_eq!(updates_rx.recv_timeout(WAIT).unwrap(), update);

        control_tx.send(None).unwrap();
        let query = registry.bind("led", "pattern", None).unwrap();
        assert!(new
            .messages
            .send_timeout(encode_update(&query).unwrap(), Duration::from_millis(50))
            .is_err());
    }
}
